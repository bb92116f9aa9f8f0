//! Diff engine for trimerge.
//!
//! Computes index-free, path-tagged change sets between two versions of a
//! document, and pairs of change sets describing what each editing side did
//! relative to the common ancestor.
//!
//! # Key Types
//!
//! - [`DocumentDiff`] / [`DocumentChange`] -- Two-way diff of JSON documents
//! - [`SideChanges`] -- Local and incoming diffs against the same ancestor

pub mod document_diff;
pub mod side_changes;

pub use document_diff::{diff_documents, DocumentChange, DocumentDiff};
pub use side_changes::{diff_sides, SideChanges};
