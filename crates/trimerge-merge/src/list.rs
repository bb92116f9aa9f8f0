//! List Unifier: membership, order and delete conflicts of one list field.

use serde_json::Value;
use tracing::debug;
use trimerge_types::{Path, Side};

use crate::align::{Alignment, EntityGroup, EntityId, EntityStatus};
use crate::conflict::{Conflict, ConflictKind};
use crate::error::MergeResult;
use crate::filter::Filtered;
use crate::merger::Walk;
use crate::ops::ListOp;

impl Walk<'_> {
    /// Merge the list field at `path`. A missing list is treated as empty.
    ///
    /// Elements are pre-filtered, aligned into entities, and emitted in the
    /// order the resolved [`ListOp`] dictates. Entities present on both sides
    /// are merged recursively at `path`; single-side entities are kept whole,
    /// minus whatever the pre-filters drop from their nested lists.
    pub(crate) fn merge_list(
        &mut self,
        path: &Path,
        ancestor: Option<&Value>,
        local: Option<&Value>,
        incoming: Option<&Value>,
    ) -> MergeResult<Option<Value>> {
        let config = self.config;
        let op = config.operations.resolve_list_op(path)?;
        let filters = &config.pre_filters;
        let ancestor_items = filters.partition(path, Side::Ancestor, items(ancestor));
        let local_items = filters.partition(path, Side::Local, items(local));
        let incoming_items = filters.partition(path, Side::Incoming, items(incoming));

        let alignment = Alignment::build(
            path,
            &config.comparators,
            &ancestor_items.kept,
            &local_items.kept,
            &incoming_items.kept,
        );
        debug!(
            path = %path,
            op = %op,
            entities = alignment.len(),
            added = alignment.count(EntityStatus::AddedInLocal)
                + alignment.count(EntityStatus::AddedInIncoming)
                + alignment.count(EntityStatus::AddedInBoth),
            deleted = alignment.count(EntityStatus::DeletedInLocal)
                + alignment.count(EntityStatus::DeletedInIncoming),
            "aligned list"
        );

        let mut merged = Vec::new();
        for id in emission_order(op, &alignment) {
            let Some(group) = alignment.get(id) else {
                continue;
            };
            if let Some(value) = self.merge_entity(path, group)? {
                merged.push(value);
            }
        }

        if op.conflicts_on_delete() {
            for group in alignment.groups() {
                self.check_delete(path, group, &local_items, &incoming_items);
            }
        }

        let present = if local.is_some() != ancestor.is_some() {
            local.is_some()
        } else {
            incoming.is_some()
        };
        if merged.is_empty() && !present {
            return Ok(None);
        }
        Ok(Some(Value::Array(merged)))
    }

    fn merge_entity(&mut self, path: &Path, group: &EntityGroup<'_>) -> MergeResult<Option<Value>> {
        match (group.value(Side::Local), group.value(Side::Incoming)) {
            (Some(l), Some(i)) => self.merge_value(path, group.value(Side::Ancestor), Some(l), Some(i)),
            (Some(l), None) => Ok(Some(self.prune(path, Side::Local, l.clone()))),
            (None, Some(i)) => Ok(Some(self.prune(path, Side::Incoming, i.clone()))),
            (None, None) => Ok(None),
        }
    }

    /// Record an edit/delete clash for an ancestor entity that exactly one
    /// side deleted. Entities a pre-filter removed were not deleted by the
    /// user and never clash.
    fn check_delete(
        &mut self,
        path: &Path,
        group: &EntityGroup<'_>,
        local: &Filtered<'_>,
        incoming: &Filtered<'_>,
    ) {
        let (kind, deleter, dropped) = match group.status() {
            EntityStatus::DeletedInLocal => (ConflictKind::AddBackToHead, Side::Local, local),
            EntityStatus::DeletedInIncoming => (ConflictKind::RemovedInUpdate, Side::Incoming, incoming),
            _ => return,
        };
        let kept = deleter.opposite();
        let survivor = group.value(kept);
        let filtered_out = dropped.dropped.iter().any(|candidate| {
            [group.value(Side::Ancestor), survivor]
                .into_iter()
                .flatten()
                .any(|entity| self.config.comparators.identity_equal(path, entity, candidate))
        });
        if filtered_out {
            return;
        }
        self.record(Conflict::new(
            path,
            kind,
            group.value(Side::Ancestor),
            group.value(Side::Local),
            group.value(Side::Incoming),
            kept,
        ));
    }
}

fn items(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Groups to emit, in output order: the leading side's entities in its own
/// order, then the entities only the other side holds, in that side's order.
fn emission_order(op: ListOp, alignment: &Alignment<'_>) -> Vec<EntityId> {
    let leading = op.leading_side();
    let trailing = leading.opposite();
    let keeps = |side: Side| match side {
        Side::Local => op.keeps_local_only(),
        Side::Incoming => op.keeps_incoming_only(),
        Side::Ancestor => false,
    };

    let mut order = alignment.order(leading);
    if keeps(trailing) {
        order.extend(
            alignment
                .order(trailing)
                .into_iter()
                .filter(|&id| alignment.get(id).is_some_and(|g| g.member(leading).is_none())),
        );
    }
    order
}
