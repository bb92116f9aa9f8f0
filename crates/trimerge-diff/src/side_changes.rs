//! What each editing side changed relative to the common ancestor.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use trimerge_types::{Path, Side};

use crate::document_diff::{diff_documents, DocumentDiff};

/// Local and incoming change sets, both computed against the ancestor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SideChanges {
    /// Changes made by the local version.
    pub local: DocumentDiff,
    /// Changes made by the incoming version.
    pub incoming: DocumentDiff,
}

impl SideChanges {
    /// The change set for one editing side, or `None` for the ancestor.
    pub fn side(&self, side: Side) -> Option<&DocumentDiff> {
        match side {
            Side::Local => Some(&self.local),
            Side::Incoming => Some(&self.incoming),
            Side::Ancestor => None,
        }
    }

    /// Returns `true` if neither side changed anything.
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.incoming.is_empty()
    }

    /// Paths changed by both sides, where one path equals or lies below the
    /// other. These are the places where a merge may have to make a judgment
    /// call; whether it actually does depends on the configured operations.
    pub fn overlapping(&self) -> BTreeSet<Path> {
        let mut overlap = BTreeSet::new();
        for local in self.local.paths() {
            for incoming in self.incoming.paths() {
                if local.starts_with(incoming) {
                    overlap.insert(local.clone());
                } else if incoming.starts_with(local) {
                    overlap.insert(incoming.clone());
                }
            }
        }
        overlap
    }
}

/// Diff both editing sides against the ancestor.
pub fn diff_sides(ancestor: &Value, local: &Value, incoming: &Value) -> SideChanges {
    SideChanges {
        local: diff_documents(ancestor, local),
        incoming: diff_documents(ancestor, incoming),
    }
}
