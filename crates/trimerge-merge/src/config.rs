//! `MergeConfig`, the per-document-kind rule set, and its builder.

use std::collections::BTreeSet;

use serde_json::Value;
use trimerge_types::{Path, Side};

use crate::comparator::{ComparatorRegistry, IdentityComparator, KeyComparator};
use crate::error::{MergeError, MergeResult};
use crate::filter::{FieldEqualsFilter, PreFilter, PreFilterStage};
use crate::ops::{FieldOp, ListOp};
use crate::registry::OperationRegistry;

/// Everything a [`Merger`](crate::Merger) needs to know about one document
/// kind.
#[derive(Clone, Debug, Default)]
pub struct MergeConfig {
    /// Field and list operations per path.
    pub operations: OperationRegistry,
    /// Identity predicates per list path.
    pub comparators: ComparatorRegistry,
    /// Pre-filters per list path.
    pub pre_filters: PreFilterStage,
    /// Paths whose conflicts are resolved but not reported.
    pub conflict_filters: BTreeSet<Path>,
}

impl MergeConfig {
    /// Start building a configuration from string paths.
    pub fn builder() -> MergeConfigBuilder {
        MergeConfigBuilder::default()
    }

    /// Fail unless the configuration can drive a merge of any document.
    pub fn validate(&self) -> MergeResult<()> {
        self.operations.validate()
    }

    /// Whether conflicts recorded at exactly `path` are hidden from reports.
    pub fn is_suppressed(&self, path: &Path) -> bool {
        self.conflict_filters.contains(path)
    }
}

/// Builder for [`MergeConfig`] taking dotted path strings.
///
/// The first malformed path is remembered and reported by
/// [`build`](Self::build), so calls can be chained without intermediate
/// error handling.
#[derive(Debug, Default)]
pub struct MergeConfigBuilder {
    config: MergeConfig,
    error: Option<MergeError>,
}

impl MergeConfigBuilder {
    /// Field operation for every path without a more specific entry.
    pub fn default_field_op(mut self, op: FieldOp) -> Self {
        self.config.operations.set_default_field_op(op);
        self
    }

    /// List operation for every path without a more specific entry.
    pub fn default_list_op(mut self, op: ListOp) -> Self {
        self.config.operations.set_default_list_op(op);
        self
    }

    /// Field operation for `path` and the fields beneath it.
    pub fn field_op(mut self, path: &str, op: FieldOp) -> Self {
        if let Some(path) = self.parse(path) {
            self.config.operations.insert_field_op(path, op);
        }
        self
    }

    /// List operation for the list at `path` and the lists beneath it.
    pub fn list_op(mut self, path: &str, op: ListOp) -> Self {
        if let Some(path) = self.parse(path) {
            self.config.operations.insert_list_op(path, op);
        }
        self
    }

    /// Append an identity predicate for the list at `path`.
    pub fn comparator(mut self, path: &str, comparator: impl IdentityComparator + 'static) -> Self {
        if let Some(path) = self.parse(path) {
            self.config.comparators.register(path, comparator);
        }
        self
    }

    /// Identify entities of the list at `path` by the given key fields.
    pub fn key_comparator(mut self, path: &str, keys: &[&str]) -> Self {
        let keys: Option<Vec<Path>> = keys.iter().map(|key| self.parse(key)).collect();
        match keys {
            Some(keys) => self.comparator(path, KeyComparator::new(keys)),
            None => self,
        }
    }

    /// Append a pre-filter for the list at `path`.
    pub fn pre_filter(mut self, path: &str, filter: impl PreFilter + 'static) -> Self {
        if let Some(path) = self.parse(path) {
            self.config.pre_filters.register(path, filter);
        }
        self
    }

    /// Drop entities of the list at `path` whose `field` equals `equals`,
    /// optionally on one side only.
    pub fn drop_where(mut self, path: &str, field: &str, equals: Value, side: Option<Side>) -> Self {
        let Some(field) = self.parse(field) else {
            return self;
        };
        let filter = FieldEqualsFilter::new(field, equals);
        match side {
            Some(side) => self.pre_filter(path, filter.on_side(side)),
            None => self.pre_filter(path, filter),
        }
    }

    /// Resolve conflicts at exactly `path` without reporting them.
    pub fn suppress_conflicts(mut self, path: &str) -> Self {
        if let Some(path) = self.parse(path) {
            self.config.conflict_filters.insert(path);
        }
        self
    }

    /// Finish, failing on the first malformed path or a missing default.
    pub fn build(self) -> MergeResult<MergeConfig> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.validate()?;
        Ok(self.config)
    }

    fn parse(&mut self, path: &str) -> Option<Path> {
        match Path::parse(path) {
            Ok(path) => Some(path),
            Err(error) => {
                self.error.get_or_insert(error.into());
                None
            }
        }
    }
}
