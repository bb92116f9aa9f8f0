//! Per-path operation lookup with default fallback.

use std::collections::BTreeMap;

use trimerge_types::Path;

use crate::error::{MergeError, MergeResult};
use crate::ops::{FieldOp, ListOp};

/// Holds the field and list operations assigned to paths, plus the defaults
/// used where no entry applies.
///
/// Lookup prefers an entry for the exact path, then the entry of the nearest
/// registered ancestor, then the default. Because paths never carry list
/// positions, one entry covers the homonymous field of every list element.
#[derive(Clone, Debug, Default)]
pub struct OperationRegistry {
    default_field_op: Option<FieldOp>,
    default_list_op: Option<ListOp>,
    field_ops: BTreeMap<Path, FieldOp>,
    list_ops: BTreeMap<Path, ListOp>,
}

impl OperationRegistry {
    /// An empty registry with no defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with both defaults populated.
    pub fn with_defaults(field: FieldOp, list: ListOp) -> Self {
        Self {
            default_field_op: Some(field),
            default_list_op: Some(list),
            ..Self::default()
        }
    }

    /// Set the default field operation.
    pub fn set_default_field_op(&mut self, op: FieldOp) {
        self.default_field_op = Some(op);
    }

    /// Set the default list operation.
    pub fn set_default_list_op(&mut self, op: ListOp) {
        self.default_list_op = Some(op);
    }

    /// Assign a field operation to a path, returning the one it replaces.
    pub fn insert_field_op(&mut self, path: Path, op: FieldOp) -> Option<FieldOp> {
        self.field_ops.insert(path, op)
    }

    /// Assign a list operation to a path, returning the one it replaces.
    pub fn insert_list_op(&mut self, path: Path, op: ListOp) -> Option<ListOp> {
        self.list_ops.insert(path, op)
    }

    /// The default field operation, if any.
    pub fn default_field_op(&self) -> Option<FieldOp> {
        self.default_field_op
    }

    /// The default list operation, if any.
    pub fn default_list_op(&self) -> Option<ListOp> {
        self.default_list_op
    }

    /// Number of path-specific entries of both kinds.
    pub fn len(&self) -> usize {
        self.field_ops.len() + self.list_ops.len()
    }

    /// Returns `true` if no path-specific entries are registered.
    pub fn is_empty(&self) -> bool {
        self.field_ops.is_empty() && self.list_ops.is_empty()
    }

    /// The effective field operation for `path`.
    pub fn resolve_field_op(&self, path: &Path) -> MergeResult<FieldOp> {
        lookup(&self.field_ops, path)
            .or(self.default_field_op)
            .ok_or_else(|| {
                MergeError::config(format!("no field operation for {path:?} and no default"))
            })
    }

    /// The effective list operation for `path`.
    pub fn resolve_list_op(&self, path: &Path) -> MergeResult<ListOp> {
        lookup(&self.list_ops, path)
            .or(self.default_list_op)
            .ok_or_else(|| {
                MergeError::config(format!("no list operation for {path:?} and no default"))
            })
    }

    /// Fail unless both defaults are populated, which guarantees that every
    /// later lookup succeeds.
    pub fn validate(&self) -> MergeResult<()> {
        if self.default_field_op.is_none() {
            return Err(MergeError::config("no default field operation"));
        }
        if self.default_list_op.is_none() {
            return Err(MergeError::config("no default list operation"));
        }
        Ok(())
    }
}

fn lookup<T: Copy>(entries: &BTreeMap<Path, T>, path: &Path) -> Option<T> {
    if entries.is_empty() {
        return None;
    }
    path.ancestors().find_map(|candidate| entries.get(&candidate).copied())
}
