use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// One of the three document versions taking part in a merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The common base both edits diverge from (the "root").
    #[serde(alias = "root")]
    Ancestor,
    /// The currently authoritative version being updated (the "head").
    #[serde(alias = "head")]
    Local,
    /// The proposed new version being merged in (the "update").
    #[serde(alias = "update")]
    Incoming,
}

impl Side {
    /// The other editing side. The ancestor has no opposite and maps to itself.
    pub fn opposite(self) -> Self {
        match self {
            Self::Ancestor => Self::Ancestor,
            Self::Local => Self::Incoming,
            Self::Incoming => Self::Local,
        }
    }

    /// Lowercase name used in configuration and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ancestor => "ancestor",
            Self::Local => "local",
            Self::Incoming => "incoming",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = TypeError;

    /// Accepts both the trimerge names and the `root`/`head`/`update` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ancestor" | "root" => Ok(Self::Ancestor),
            "local" | "head" => Ok(Self::Local),
            "incoming" | "update" => Ok(Self::Incoming),
            other => Err(TypeError::UnknownSide(other.to_string())),
        }
    }
}

/// Coarse structural kind of a value, used to decide between field-level
/// merging, key-wise recursion and list unification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `null`, booleans, numbers and strings.
    Scalar,
    /// A JSON object.
    Object,
    /// A JSON array.
    List,
}

impl Shape {
    /// Classify a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::List,
            _ => Self::Scalar,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "scalar",
            Self::Object => "object",
            Self::List => "list",
        };
        f.write_str(name)
    }
}
