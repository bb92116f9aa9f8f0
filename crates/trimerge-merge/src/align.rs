//! Alignment of one list field across the three versions.
//!
//! Positions are not stable across independently edited lists, so elements
//! are paired by identity instead. Each logical entity becomes one
//! [`EntityGroup`] addressed by a stable [`EntityId`]; all later decisions
//! (recursive merges, membership, order, conflict tagging) go through groups,
//! never through raw list indices.

use std::fmt;

use serde_json::Value;
use trimerge_types::{Path, Side};

use crate::comparator::ComparatorRegistry;

/// Stable handle of an entity within one alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(usize);

impl EntityId {
    /// The handle's ordinal within its alignment.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// One version's copy of an entity and where it sits in that version's list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Member<'a> {
    /// Position in that side's (pre-filtered) list.
    pub position: usize,
    /// The element itself.
    pub value: &'a Value,
}

/// How an entity evolved from the ancestor to each side.
///
/// An entity that survives only in the ancestor is reported as
/// [`EntityStatus::DeletedInBoth`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityStatus {
    AddedInLocal,
    AddedInIncoming,
    AddedInBoth,
    Unchanged,
    ModifiedInLocal,
    ModifiedInIncoming,
    ModifiedInBoth,
    DeletedInLocal,
    DeletedInIncoming,
    DeletedInBoth,
}

/// One logical entity across the three versions.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityGroup<'a> {
    /// Stable handle.
    pub id: EntityId,
    /// The ancestor's copy.
    pub ancestor: Option<Member<'a>>,
    /// The local copy.
    pub local: Option<Member<'a>>,
    /// The incoming copy.
    pub incoming: Option<Member<'a>>,
}

impl<'a> EntityGroup<'a> {
    /// The copy held by `side`.
    pub fn member(&self, side: Side) -> Option<Member<'a>> {
        match side {
            Side::Ancestor => self.ancestor,
            Side::Local => self.local,
            Side::Incoming => self.incoming,
        }
    }

    /// The value held by `side`.
    pub fn value(&self, side: Side) -> Option<&'a Value> {
        self.member(side).map(|m| m.value)
    }

    /// Classify how the entity evolved. Modification is judged by value
    /// equality with the ancestor's copy, not by identity.
    pub fn status(&self) -> EntityStatus {
        let ancestor = self.value(Side::Ancestor);
        let local = self.value(Side::Local);
        let incoming = self.value(Side::Incoming);
        match (ancestor, local, incoming) {
            (None, Some(_), Some(_)) => EntityStatus::AddedInBoth,
            (None, Some(_), None) => EntityStatus::AddedInLocal,
            (None, None, _) => EntityStatus::AddedInIncoming,
            (Some(_), None, None) => EntityStatus::DeletedInBoth,
            (Some(_), None, Some(_)) => EntityStatus::DeletedInLocal,
            (Some(_), Some(_), None) => EntityStatus::DeletedInIncoming,
            (Some(a), Some(l), Some(i)) => match (l != a, i != a) {
                (false, false) => EntityStatus::Unchanged,
                (true, false) => EntityStatus::ModifiedInLocal,
                (false, true) => EntityStatus::ModifiedInIncoming,
                (true, true) => EntityStatus::ModifiedInBoth,
            },
        }
    }
}

/// Entities of one list field, aligned across the three versions.
#[derive(Clone, Debug, Default)]
pub struct Alignment<'a> {
    groups: Vec<EntityGroup<'a>>,
}

impl<'a> Alignment<'a> {
    /// Align `ancestor`, `local` and `incoming` (already pre-filtered) using
    /// the identity predicates registered for `path`.
    ///
    /// 1. Every ancestor entity claims the first unclaimed local and incoming
    ///    element it is identical to.
    /// 2. Groups still missing one side try to claim an element of that side
    ///    identical to the copy they already hold.
    /// 3. Remaining local elements claim identical remaining incoming elements
    ///    (added on both sides); leftovers form single-side groups.
    pub fn build(
        path: &Path,
        comparators: &ComparatorRegistry,
        ancestor: &[&'a Value],
        local: &[&'a Value],
        incoming: &[&'a Value],
    ) -> Self {
        let same = |a: &Value, b: &Value| comparators.identity_equal(path, a, b);
        let mut local_claimed = vec![false; local.len()];
        let mut incoming_claimed = vec![false; incoming.len()];
        let mut groups: Vec<EntityGroup<'a>> = Vec::with_capacity(ancestor.len().max(local.len()));

        for (position, &value) in ancestor.iter().enumerate() {
            let local_member = claim(local, &mut local_claimed, |l| same(value, l));
            let incoming_member = claim(incoming, &mut incoming_claimed, |i| same(value, i));
            groups.push(EntityGroup {
                id: EntityId(groups.len()),
                ancestor: Some(Member { position, value }),
                local: local_member,
                incoming: incoming_member,
            });
        }

        for group in &mut groups {
            match (group.local, group.incoming) {
                (Some(l), None) => {
                    group.incoming = claim(incoming, &mut incoming_claimed, |i| same(l.value, i));
                }
                (None, Some(i)) => {
                    group.local = claim(local, &mut local_claimed, |l| same(l, i.value));
                }
                _ => {}
            }
        }

        for (position, &value) in local.iter().enumerate() {
            if local_claimed[position] {
                continue;
            }
            local_claimed[position] = true;
            let incoming_member = claim(incoming, &mut incoming_claimed, |i| same(value, i));
            groups.push(EntityGroup {
                id: EntityId(groups.len()),
                ancestor: None,
                local: Some(Member { position, value }),
                incoming: incoming_member,
            });
        }

        for (position, &value) in incoming.iter().enumerate() {
            if incoming_claimed[position] {
                continue;
            }
            groups.push(EntityGroup {
                id: EntityId(groups.len()),
                ancestor: None,
                local: None,
                incoming: Some(Member { position, value }),
            });
        }

        Self { groups }
    }

    /// All groups, ancestor entities first.
    pub fn groups(&self) -> &[EntityGroup<'a>] {
        &self.groups
    }

    /// Look up a group by handle.
    pub fn get(&self, id: EntityId) -> Option<&EntityGroup<'a>> {
        self.groups.get(id.0)
    }

    /// Number of logical entities.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no version has any element.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Handles of the groups present on `side`, in that side's list order.
    pub fn order(&self, side: Side) -> Vec<EntityId> {
        let mut present: Vec<(usize, EntityId)> = self
            .groups
            .iter()
            .filter_map(|g| g.member(side).map(|m| (m.position, g.id)))
            .collect();
        present.sort_unstable();
        present.into_iter().map(|(_, id)| id).collect()
    }

    /// Number of groups with the given status.
    pub fn count(&self, status: EntityStatus) -> usize {
        self.groups.iter().filter(|g| g.status() == status).count()
    }
}

fn claim<'a>(
    candidates: &[&'a Value],
    claimed: &mut [bool],
    mut matches: impl FnMut(&Value) -> bool,
) -> Option<Member<'a>> {
    let position = (0..candidates.len()).find(|&i| !claimed[i] && matches(candidates[i]))?;
    claimed[position] = true;
    Some(Member {
        position,
        value: candidates[position],
    })
}
