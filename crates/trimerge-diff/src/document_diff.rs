//! Document-level diff: compare two JSON documents field by field.
//!
//! Objects are compared key by key and recursed into. Lists and scalars are
//! compared as whole values: list positions are not stable across versions,
//! so a list that differs in any way is reported as one `Modified` change at
//! the list's own path.

use serde::Serialize;
use serde_json::Value;
use trimerge_types::Path;

/// The result of comparing two documents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DocumentDiff {
    /// The list of changes, in document order of the old version followed by
    /// additions in document order of the new version.
    pub changes: Vec<DocumentChange>,
}

impl DocumentDiff {
    /// Create an empty document diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Number of added fields.
    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, DocumentChange::Added { .. }))
            .count()
    }

    /// Number of removed fields.
    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, DocumentChange::Removed { .. }))
            .count()
    }

    /// Number of modified fields.
    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, DocumentChange::Modified { .. }))
            .count()
    }

    /// Paths touched by this diff, in change order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().map(DocumentChange::path)
    }

    /// Returns `true` if `path` or anything below it changed.
    pub fn touches(&self, path: &Path) -> bool {
        self.paths().any(|p| p.starts_with(path))
    }
}

/// A single change between two documents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum DocumentChange {
    /// A field was added.
    Added { path: Path, value: Value },
    /// A field was removed.
    Removed { path: Path, value: Value },
    /// A field's value changed.
    Modified { path: Path, old: Value, new: Value },
}

impl DocumentChange {
    /// The path this change applies to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Added { path, .. } | Self::Removed { path, .. } | Self::Modified { path, .. } => {
                path
            }
        }
    }
}

/// Compute the diff between two documents.
///
/// Fields present only in `new` are `Added`, fields present only in `old` are
/// `Removed`, and fields present in both with different values are
/// `Modified`, unless both values are objects, in which case the diff
/// descends into them. Non-object roots are compared as a single value at the
/// root path.
pub fn diff_documents(old: &Value, new: &Value) -> DocumentDiff {
    let mut changes = Vec::new();
    diff_values(&Path::root(), old, new, &mut changes);
    DocumentDiff { changes }
}

fn diff_values(path: &Path, old: &Value, new: &Value, changes: &mut Vec<DocumentChange>) {
    if old == new {
        return;
    }

    let (Value::Object(old_map), Value::Object(new_map)) = (old, new) else {
        changes.push(DocumentChange::Modified {
            path: path.clone(),
            old: old.clone(),
            new: new.clone(),
        });
        return;
    };

    // Removed and modified keys.
    for (key, old_val) in old_map {
        let child = path.child(key);
        match new_map.get(key) {
            Some(new_val) => diff_values(&child, old_val, new_val, changes),
            None => changes.push(DocumentChange::Removed {
                path: child,
                value: old_val.clone(),
            }),
        }
    }

    // Added keys.
    for (key, new_val) in new_map {
        if !old_map.contains_key(key) {
            changes.push(DocumentChange::Added {
                path: path.child(key),
                value: new_val.clone(),
            });
        }
    }
}
