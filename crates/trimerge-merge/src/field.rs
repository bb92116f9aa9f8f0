//! Field Merger: resolve one field across the three versions.
//!
//! A field is treated as an opaque value here. `None` means the field is
//! absent from that version, which is different from JSON `null`.

use serde_json::Value;
use trimerge_types::{Path, Side};

use crate::conflict::{Conflict, ConflictKind};
use crate::ops::FieldOp;

/// Outcome of merging a single field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMerge {
    /// The merged value, or `None` if the field is absent from the result.
    pub value: Option<Value>,
    /// The divergence recorded while resolving, if any.
    pub conflict: Option<Conflict>,
}

impl FieldMerge {
    fn clean(value: Option<&Value>) -> Self {
        Self {
            value: value.cloned(),
            conflict: None,
        }
    }
}

/// Merge one field under `op`.
///
/// A side has "changed" when its value differs from the ancestor's; an absent
/// ancestor makes every present value a change. When only one side changed,
/// the three-way operations take that change. When both changed to different
/// values, [`FieldOp::FallbackKeepHead`] and [`FieldOp::FallbackKeepUpdate`]
/// keep their preferred side and record a conflict, while
/// [`FieldOp::KeepLongest`] keeps the longer value without one.
pub fn merge_field(
    op: FieldOp,
    path: &Path,
    ancestor: Option<&Value>,
    local: Option<&Value>,
    incoming: Option<&Value>,
) -> FieldMerge {
    match op {
        FieldOp::KeepHead => return FieldMerge::clean(local),
        FieldOp::KeepUpdate => return FieldMerge::clean(incoming),
        _ => {}
    }

    if local == incoming {
        return FieldMerge::clean(local);
    }
    if local == ancestor {
        return FieldMerge::clean(incoming);
    }
    if incoming == ancestor {
        return FieldMerge::clean(local);
    }

    // Both sides changed, to different values.
    let Some(kept) = op.preferred_side() else {
        let value = if length(incoming) > length(local) {
            incoming
        } else {
            local
        };
        return FieldMerge::clean(value);
    };
    let value = if kept == Side::Incoming { incoming } else { local };
    let kind = if local.is_none() || incoming.is_none() {
        ConflictKind::RemoveField
    } else {
        ConflictKind::SetField
    };
    FieldMerge {
        value: value.cloned(),
        conflict: Some(Conflict::new(path, kind, ancestor, local, incoming, kept)),
    }
}

/// Length measure used by [`FieldOp::KeepLongest`].
///
/// Strings count characters, lists count elements, objects count keys, and
/// other scalars count the characters of their JSON rendering. An absent
/// value has length zero.
pub fn length(value: Option<&Value>) -> usize {
    match value {
        None => 0,
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(map)) => map.len(),
        Some(other) => other.to_string().len(),
    }
}
