//! Merge Orchestrator: walks the three trees in lock-step.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};
use trimerge_types::{Path, Shape, Side};

use crate::config::MergeConfig;
use crate::conflict::{Conflict, ConflictKind};
use crate::error::MergeResult;
use crate::field::merge_field;
use crate::ops::FieldOp;

// ---------------------------------------------------------------------------
// MergeOutcome
// ---------------------------------------------------------------------------

/// A complete merged document and the judgment calls made to produce it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergeOutcome {
    /// The merged document.
    pub merged: Value,
    /// Reported conflicts, stable-sorted by path.
    pub conflicts: Vec<Conflict>,
    /// Number of conflicts resolved but hidden by the suppression set.
    pub suppressed: usize,
}

impl MergeOutcome {
    /// Returns `true` if any conflict is left for review.
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Split into the merged document and the conflict list.
    pub fn into_parts(self) -> (Value, Vec<Conflict>) {
        (self.merged, self.conflicts)
    }
}

// ---------------------------------------------------------------------------
// Merger
// ---------------------------------------------------------------------------

/// Three-way merger for one document kind.
///
/// A `Merger` holds only read-only registries, so one instance can serve any
/// number of merges, including concurrent ones from several threads.
#[derive(Clone, Debug)]
pub struct Merger {
    config: MergeConfig,
}

impl Merger {
    /// Validate `config` and build a merger from it.
    ///
    /// Fails with [`MergeError::Configuration`](crate::MergeError::Configuration)
    /// when a default operation is missing, so that no merge can abort
    /// half-way through for lack of an operation.
    pub fn new(config: MergeConfig) -> MergeResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration driving this merger.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge `local` and `incoming`, both derived from `ancestor`.
    ///
    /// The inputs are never modified. Divergence is not an error: it is
    /// resolved automatically and reported in the outcome's conflict list.
    pub fn merge(&self, ancestor: &Value, local: &Value, incoming: &Value) -> MergeResult<MergeOutcome> {
        let mut walk = Walk::new(&self.config);
        let merged = walk
            .merge_value(&Path::root(), Some(ancestor), Some(local), Some(incoming))?
            .unwrap_or(Value::Null);

        let mut conflicts = walk.conflicts;
        conflicts.sort_by(|a, b| a.path.cmp(&b.path));
        let recorded = conflicts.len();
        conflicts.retain(|conflict| !self.config.is_suppressed(&conflict.path));
        let suppressed = recorded - conflicts.len();

        debug!(conflicts = conflicts.len(), suppressed, "merge finished");
        Ok(MergeOutcome {
            merged,
            conflicts,
            suppressed,
        })
    }
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

/// State of one merge invocation: the configuration and the conflicts
/// collected so far.
pub(crate) struct Walk<'c> {
    pub(crate) config: &'c MergeConfig,
    pub(crate) conflicts: Vec<Conflict>,
}

impl<'c> Walk<'c> {
    pub(crate) fn new(config: &'c MergeConfig) -> Self {
        Self {
            config,
            conflicts: Vec::new(),
        }
    }

    /// Merge the values found at `path`, returning `None` when the field is
    /// absent from the result.
    ///
    /// Objects on both sides recurse key by key, lists go to the list
    /// unifier, and everything else is resolved as a single field.
    pub(crate) fn merge_value(
        &mut self,
        path: &Path,
        ancestor: Option<&Value>,
        local: Option<&Value>,
        incoming: Option<&Value>,
    ) -> MergeResult<Option<Value>> {
        match (local, incoming) {
            (Some(Value::Object(l)), Some(Value::Object(i))) => {
                let a = ancestor.and_then(Value::as_object);
                Ok(Some(Value::Object(self.merge_object(path, a, l, i)?)))
            }
            (Some(Value::Array(_)), Some(Value::Array(_)) | None) | (None, Some(Value::Array(_))) => {
                self.merge_list(path, ancestor, local, incoming)
            }
            (Some(l), Some(i)) if Shape::of(l) != Shape::of(i) => {
                self.merge_shapes(path, ancestor, l, i)
            }
            _ => self.merge_field(path, ancestor, local, incoming),
        }
    }

    pub(crate) fn record(&mut self, conflict: Conflict) {
        trace!(path = %conflict.path, kind = %conflict.kind, kept = %conflict.kept, "conflict recorded");
        self.conflicts.push(conflict);
    }

    /// Local keys in local order, then incoming-only keys in incoming order.
    /// Keys only the ancestor holds were removed on both sides.
    fn merge_object(
        &mut self,
        path: &Path,
        ancestor: Option<&Map<String, Value>>,
        local: &Map<String, Value>,
        incoming: &Map<String, Value>,
    ) -> MergeResult<Map<String, Value>> {
        let keys = local
            .keys()
            .chain(incoming.keys().filter(|key| !local.contains_key(*key)));

        let mut merged = Map::new();
        for key in keys {
            let child = path.child(key);
            let value = self.merge_value(
                &child,
                ancestor.and_then(|a| a.get(key)),
                local.get(key),
                incoming.get(key),
            )?;
            if let Some(value) = value {
                merged.insert(key.clone(), value);
            }
        }
        Ok(merged)
    }

    fn merge_field(
        &mut self,
        path: &Path,
        ancestor: Option<&Value>,
        local: Option<&Value>,
        incoming: Option<&Value>,
    ) -> MergeResult<Option<Value>> {
        let op = self.config.operations.resolve_field_op(path)?;
        let outcome = merge_field(op, path, ancestor, local, incoming);
        if let Some(conflict) = outcome.conflict {
            self.record(conflict);
        }
        let side = if outcome.value.as_ref() == local {
            Side::Local
        } else {
            Side::Incoming
        };
        Ok(outcome.value.map(|value| self.prune(path, side, value)))
    }

    /// Apply the pre-filters of every list nested in `value`, a subtree
    /// taken whole from `side` without a counterpart to merge against.
    pub(crate) fn prune(&self, path: &Path, side: Side, value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, child)| {
                        let child = self.prune(&path.child(&key), side, child);
                        (key, child)
                    })
                    .collect(),
            ),
            Value::Array(items) => {
                let kept: Vec<Value> = self
                    .config
                    .pre_filters
                    .filter(path, side, &items)
                    .into_iter()
                    .cloned()
                    .collect();
                Value::Array(kept.into_iter().map(|item| self.prune(path, side, item)).collect())
            }
            scalar => scalar,
        }
    }

    /// Local and incoming hold values of different shapes.
    ///
    /// A side that did not touch the value, or an unconditional operation,
    /// settles it as a plain field. Otherwise local's value is kept.
    fn merge_shapes(
        &mut self,
        path: &Path,
        ancestor: Option<&Value>,
        local: &Value,
        incoming: &Value,
    ) -> MergeResult<Option<Value>> {
        let op = self.config.operations.resolve_field_op(path)?;
        let unconditional = matches!(op, FieldOp::KeepHead | FieldOp::KeepUpdate);
        if unconditional || ancestor == Some(local) || ancestor == Some(incoming) {
            return self.merge_field(path, ancestor, Some(local), Some(incoming));
        }

        debug!(
            path = %path,
            local = %Shape::of(local),
            incoming = %Shape::of(incoming),
            "incompatible shapes; keeping local"
        );
        self.record(Conflict::new(
            path,
            ConflictKind::Shape,
            ancestor,
            Some(local),
            Some(incoming),
            Side::Local,
        ));
        Ok(Some(self.prune(path, Side::Local, local.clone())))
    }
}
