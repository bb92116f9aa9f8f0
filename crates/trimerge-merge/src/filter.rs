//! Path-scoped pre-filters applied to list fields before alignment.
//!
//! A pre-filter removes elements that must never survive a merge, whatever
//! the list operation would decide. Removal is silent: a dropped element is
//! invisible to alignment and never produces a conflict.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use trimerge_types::{Path, Side};

use crate::comparator::get_path;

// ---------------------------------------------------------------------------
// PreFilter trait
// ---------------------------------------------------------------------------

/// A pure predicate deciding whether a list element from one side survives.
pub trait PreFilter: Send + Sync {
    /// Returns `false` to drop `entity` from `side`'s list.
    fn retain(&self, side: Side, entity: &Value) -> bool;
}

impl<F> PreFilter for F
where
    F: Fn(Side, &Value) -> bool + Send + Sync,
{
    fn retain(&self, side: Side, entity: &Value) -> bool {
        self(side, entity)
    }
}

// ---------------------------------------------------------------------------
// FieldEqualsFilter
// ---------------------------------------------------------------------------

/// Drops entities whose `field` equals a given value, optionally on one side
/// only.
#[derive(Clone, Debug)]
pub struct FieldEqualsFilter {
    field: Path,
    equals: Value,
    side: Option<Side>,
}

impl FieldEqualsFilter {
    /// Drop entities on both editing sides where `field == equals`.
    pub fn new(field: Path, equals: Value) -> Self {
        Self {
            field,
            equals,
            side: None,
        }
    }

    /// Restrict the filter to one side.
    pub fn on_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }
}

impl PreFilter for FieldEqualsFilter {
    fn retain(&self, side: Side, entity: &Value) -> bool {
        if self.side.is_some_and(|only| only != side) {
            return true;
        }
        get_path(entity, &self.field) != Some(&self.equals)
    }
}

// ---------------------------------------------------------------------------
// PreFilterStage
// ---------------------------------------------------------------------------

/// The elements of one side's list split by the pre-filters.
#[derive(Debug, Default)]
pub struct Filtered<'a> {
    /// Surviving elements, in list order.
    pub kept: Vec<&'a Value>,
    /// Dropped elements, in list order.
    pub dropped: Vec<&'a Value>,
}

/// Pre-filters per list path, applied in registration order.
#[derive(Clone, Default)]
pub struct PreFilterStage {
    filters: BTreeMap<Path, Vec<Arc<dyn PreFilter>>>,
}

impl fmt::Debug for PreFilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.filters.keys()).finish()
    }
}

impl PreFilterStage {
    /// A stage with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter for the list at `path`.
    pub fn register(&mut self, path: Path, filter: impl PreFilter + 'static) {
        self.register_shared(path, Arc::new(filter));
    }

    /// Append an already shared filter for the list at `path`.
    pub fn register_shared(&mut self, path: Path, filter: Arc<dyn PreFilter>) {
        self.filters.entry(path).or_default().push(filter);
    }

    /// Returns `true` if no filters are registered.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Split `list` from `side` into kept and dropped elements.
    ///
    /// The ancestor is never filtered: it only serves as the reference point
    /// for alignment.
    pub fn partition<'a>(&self, path: &Path, side: Side, list: &'a [Value]) -> Filtered<'a> {
        let chain = match self.filters.get(path) {
            Some(chain) if side != Side::Ancestor => chain,
            _ => {
                return Filtered {
                    kept: list.iter().collect(),
                    dropped: Vec::new(),
                }
            }
        };

        let (kept, dropped): (Vec<&Value>, Vec<&Value>) = list
            .iter()
            .partition(|entity| chain.iter().all(|filter| filter.retain(side, entity)));

        if !dropped.is_empty() {
            debug!(path = %path, side = %side, dropped = dropped.len(), "pre-filter dropped entities");
        }
        Filtered { kept, dropped }
    }

    /// The surviving elements of `list` from `side`.
    pub fn filter<'a>(&self, path: &Path, side: Side, list: &'a [Value]) -> Vec<&'a Value> {
        self.partition(path, side, list).kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn unregistered_path_keeps_everything() {
        let stage = PreFilterStage::new();
        let list = vec![json!(1), json!(2)];
        assert_eq!(stage.filter(&p("dois"), Side::Local, &list).len(), 2);
    }

    #[test]
    fn field_equals_drops_matching() {
        let mut stage = PreFilterStage::new();
        stage.register(p("documents"), FieldEqualsFilter::new(p("hidden"), json!(true)));

        let list = vec![
            json!({"key": "a.pdf", "hidden": true}),
            json!({"key": "b.pdf"}),
            json!({"key": "c.pdf", "hidden": false}),
        ];
        let filtered = stage.partition(&p("documents"), Side::Incoming, &list);
        assert_eq!(filtered.kept.len(), 2);
        assert_eq!(filtered.dropped, vec![&list[0]]);
    }

    #[test]
    fn side_restricted_filter() {
        let mut stage = PreFilterStage::new();
        stage.register(
            p("references"),
            FieldEqualsFilter::new(p("curated_relation"), json!(false)).on_side(Side::Incoming),
        );
        let list = vec![json!({"curated_relation": false})];

        assert!(stage.filter(&p("references"), Side::Incoming, &list).is_empty());
        assert_eq!(stage.filter(&p("references"), Side::Local, &list).len(), 1);
    }

    #[test]
    fn ancestor_never_filtered() {
        let mut stage = PreFilterStage::new();
        stage.register(p("figures"), |_: Side, _: &Value| false);
        let list = vec![json!("x")];
        assert_eq!(stage.filter(&p("figures"), Side::Ancestor, &list).len(), 1);
        assert!(stage.filter(&p("figures"), Side::Local, &list).is_empty());
    }

    #[test]
    fn chain_requires_every_filter() {
        let mut stage = PreFilterStage::new();
        stage.register(p("urls"), |_: Side, e: &Value| e.as_str() != Some("a"));
        stage.register(p("urls"), |_: Side, e: &Value| e.as_str() != Some("b"));
        let list = vec![json!("a"), json!("b"), json!("c")];
        let kept = stage.filter(&p("urls"), Side::Local, &list);
        assert_eq!(kept, vec![&json!("c")]);
    }
}
