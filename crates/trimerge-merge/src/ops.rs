//! The closed set of merge operations that configuration can assign to paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use trimerge_types::Side;

use crate::error::MergeError;

// ---------------------------------------------------------------------------
// FieldOp
// ---------------------------------------------------------------------------

/// How a single scalar or object field is resolved across the three versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOp {
    /// Always take the local value.
    KeepHead,
    /// Always take the incoming value.
    KeepUpdate,
    /// Three-way merge; on divergence keep local and record a conflict.
    FallbackKeepHead,
    /// Three-way merge; on divergence keep incoming and record a conflict.
    FallbackKeepUpdate,
    /// Three-way merge; on divergence keep the longer value, silently.
    KeepLongest,
}

impl FieldOp {
    /// Every field operation, in declaration order.
    pub const ALL: [FieldOp; 5] = [
        Self::KeepHead,
        Self::KeepUpdate,
        Self::FallbackKeepHead,
        Self::FallbackKeepUpdate,
        Self::KeepLongest,
    ];

    /// The side whose value wins when both sides diverge, if the operation
    /// has a fixed preference.
    pub fn preferred_side(self) -> Option<Side> {
        match self {
            Self::KeepHead | Self::FallbackKeepHead => Some(Side::Local),
            Self::KeepUpdate | Self::FallbackKeepUpdate => Some(Side::Incoming),
            Self::KeepLongest => None,
        }
    }

    /// The configuration tag for this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepHead => "KEEP_HEAD",
            Self::KeepUpdate => "KEEP_UPDATE",
            Self::FallbackKeepHead => "FALLBACK_KEEP_HEAD",
            Self::FallbackKeepUpdate => "FALLBACK_KEEP_UPDATE",
            Self::KeepLongest => "KEEP_LONGEST",
        }
    }
}

impl fmt::Display for FieldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldOp {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MergeError::config(format!("unknown field operation: {s}")))
    }
}

// ---------------------------------------------------------------------------
// ListOp
// ---------------------------------------------------------------------------

/// How the membership and order of a list field is decided once its entities
/// have been aligned across the three versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListOp {
    /// Local's entities in local order.
    KeepOnlyHeadEntities,
    /// Incoming's entities in incoming order.
    KeepOnlyUpdateEntities,
    /// Union of both sides; local's entities first.
    KeepUpdateAndHeadEntitiesHeadFirst,
    /// Union of both sides; incoming's entities first.
    KeepUpdateAndHeadEntitiesUpdateFirst,
    /// Union of both sides, incoming first, with a conflict for every ancestor
    /// entity one side deleted while the other still has it.
    KeepUpdateEntitiesConflictOnHeadDelete,
}

impl ListOp {
    /// Every list operation, in declaration order.
    pub const ALL: [ListOp; 5] = [
        Self::KeepOnlyHeadEntities,
        Self::KeepOnlyUpdateEntities,
        Self::KeepUpdateAndHeadEntitiesHeadFirst,
        Self::KeepUpdateAndHeadEntitiesUpdateFirst,
        Self::KeepUpdateEntitiesConflictOnHeadDelete,
    ];

    /// Whether entities present on only the local side are kept.
    pub fn keeps_local_only(self) -> bool {
        !matches!(self, Self::KeepOnlyUpdateEntities)
    }

    /// Whether entities present on only the incoming side are kept.
    pub fn keeps_incoming_only(self) -> bool {
        !matches!(self, Self::KeepOnlyHeadEntities)
    }

    /// The side whose order leads the output.
    pub fn leading_side(self) -> Side {
        match self {
            Self::KeepOnlyHeadEntities | Self::KeepUpdateAndHeadEntitiesHeadFirst => Side::Local,
            Self::KeepOnlyUpdateEntities
            | Self::KeepUpdateAndHeadEntitiesUpdateFirst
            | Self::KeepUpdateEntitiesConflictOnHeadDelete => Side::Incoming,
        }
    }

    /// Whether a one-sided deletion of an ancestor entity is a conflict.
    pub fn conflicts_on_delete(self) -> bool {
        matches!(self, Self::KeepUpdateEntitiesConflictOnHeadDelete)
    }

    /// The configuration tag for this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepOnlyHeadEntities => "KEEP_ONLY_HEAD_ENTITIES",
            Self::KeepOnlyUpdateEntities => "KEEP_ONLY_UPDATE_ENTITIES",
            Self::KeepUpdateAndHeadEntitiesHeadFirst => "KEEP_UPDATE_AND_HEAD_ENTITIES_HEAD_FIRST",
            Self::KeepUpdateAndHeadEntitiesUpdateFirst => {
                "KEEP_UPDATE_AND_HEAD_ENTITIES_UPDATE_FIRST"
            }
            Self::KeepUpdateEntitiesConflictOnHeadDelete => {
                "KEEP_UPDATE_ENTITIES_CONFLICT_ON_HEAD_DELETE"
            }
        }
    }
}

impl fmt::Display for ListOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListOp {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MergeError::config(format!("unknown list operation: {s}")))
    }
}
