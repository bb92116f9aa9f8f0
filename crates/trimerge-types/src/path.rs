use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Separator between path segments in the dotted representation.
pub const SEPARATOR: char = '.';

/// Index-free location of a field inside a document tree.
///
/// A `Path` names a field by the chain of object keys leading to it. List
/// positions are never part of a path: descending into a list element keeps
/// the list's own path, so `authors.full_name` addresses the `full_name` of
/// every element of `authors`. This is what lets configuration keyed by path
/// apply uniformly to all entities of a list, whatever their position in each
/// of the three versions.
///
/// The empty path is the document root.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path such as `references.reference.title`.
    ///
    /// The empty string parses to the root path. Empty segments (`a..b`,
    /// leading or trailing dots) are rejected.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in s.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(TypeError::InvalidPath {
                    path: s.to_string(),
                    reason: "path segments must not be empty".into(),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Build a path from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if let Some(bad) = segments.iter().find(|s| s.is_empty()) {
            return Err(TypeError::InvalidPath {
                path: segments.join("."),
                reason: format!("empty segment {bad:?}"),
            });
        }
        Ok(Self { segments })
    }

    /// The path of a field named `name` directly below this one.
    ///
    /// Field names are taken verbatim; a key containing the separator still
    /// forms a single segment.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(name.to_string());
        Self { segments }
    }

    /// The enclosing path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The individual segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment (the field name), or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.is_empty()
    }

    /// Returns `true` if `self` equals `prefix` or lies below it.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns `true` if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.segments.len() < other.segments.len() && other.starts_with(self)
    }

    /// This path followed by each of its ancestors, longest first, ending with
    /// the root.
    ///
    /// Configuration lookup walks this sequence and stops at the first entry
    /// it finds, which implements "longest exact or ancestor match".
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (0..=self.segments.len()).rev().map(move |n| Path {
            segments: self.segments[..n].to_vec(),
        })
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for Path {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}
