//! Conflict records produced by the merge.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trimerge_types::{Path, Side};

/// What kind of divergence a conflict records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// Both sides set a field to different values.
    SetField,
    /// One side removed a field the other side changed.
    RemoveField,
    /// Local deleted a list entity that incoming still has; incoming's version
    /// was put back.
    AddBackToHead,
    /// Incoming deleted a list entity that local still has; local's version
    /// was kept.
    RemovedInUpdate,
    /// The two sides hold values of incompatible shapes (e.g. scalar vs list).
    Shape,
}

impl ConflictKind {
    /// The report tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetField => "SET_FIELD",
            Self::RemoveField => "REMOVE_FIELD",
            Self::AddBackToHead => "ADD_BACK_TO_HEAD",
            Self::RemovedInUpdate => "REMOVED_IN_UPDATE",
            Self::Shape => "SHAPE",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path-tagged divergence where the merge made a judgment call.
///
/// The merged document already contains the value of the `kept` side; the
/// conflict exists so that a reviewer can revisit that choice. Values are
/// `None` where the field or entity is absent from that version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Index-free location of the field or of the list holding the entity.
    pub path: Path,
    /// What kind of divergence this is.
    pub kind: ConflictKind,
    /// The ancestor's value or entity.
    pub ancestor: Option<Value>,
    /// The local value or entity.
    pub local: Option<Value>,
    /// The incoming value or entity.
    pub incoming: Option<Value>,
    /// Which side's value the merged document holds.
    pub kept: Side,
}

impl Conflict {
    /// Build a conflict from borrowed values.
    pub fn new(
        path: &Path,
        kind: ConflictKind,
        ancestor: Option<&Value>,
        local: Option<&Value>,
        incoming: Option<&Value>,
        kept: Side,
    ) -> Self {
        Self {
            path: path.clone(),
            kind,
            ancestor: ancestor.cloned(),
            local: local.cloned(),
            incoming: incoming.cloned(),
            kept,
        }
    }

    /// The value of the side that was not kept.
    pub fn rejected(&self) -> Option<&Value> {
        match self.kept {
            Side::Local => self.incoming.as_ref(),
            Side::Incoming => self.local.as_ref(),
            Side::Ancestor => None,
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} (kept {})", self.kind, self.path, self.kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_for_reports() {
        let path = Path::parse("title").unwrap();
        let conflict = Conflict::new(
            &path,
            ConflictKind::SetField,
            Some(&json!("X")),
            Some(&json!("Y")),
            Some(&json!("Z")),
            Side::Local,
        );
        assert_eq!(
            serde_json::to_value(&conflict).unwrap(),
            json!({
                "path": "title",
                "kind": "SET_FIELD",
                "ancestor": "X",
                "local": "Y",
                "incoming": "Z",
                "kept": "local"
            })
        );
        assert_eq!(conflict.rejected(), Some(&json!("Z")));
        assert_eq!(conflict.to_string(), "SET_FIELD at title (kept local)");
    }
}
