//! Entity identity across list versions.
//!
//! Aligning a list across the ancestor, local and incoming versions needs to
//! know whether two elements denote the same logical entity, which is weaker
//! than byte equality: an author whose affiliation changed is still the same
//! author. Identity is decided by an ordered chain of predicates per path.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use trimerge_types::Path;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Verdict of a single identity predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Identity {
    /// Both elements denote the same entity.
    Match,
    /// The elements denote different entities.
    NoMatch,
    /// This predicate cannot tell; ask the next one.
    Indeterminate,
}

impl From<bool> for Identity {
    fn from(matched: bool) -> Self {
        if matched {
            Self::Match
        } else {
            Self::NoMatch
        }
    }
}

// ---------------------------------------------------------------------------
// IdentityComparator trait
// ---------------------------------------------------------------------------

/// A pure predicate deciding whether two list elements are the same entity.
///
/// Implementations must be side-effect free: they are called many times per
/// list and may be shared between concurrently running merges.
pub trait IdentityComparator: Send + Sync {
    /// Compare two elements.
    fn compare(&self, a: &Value, b: &Value) -> Identity;
}

impl<F> IdentityComparator for F
where
    F: Fn(&Value, &Value) -> Identity + Send + Sync,
{
    fn compare(&self, a: &Value, b: &Value) -> Identity {
        self(a, b)
    }
}

/// Structural equality: the fallback when no predicate decides.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeepEquality;

impl IdentityComparator for DeepEquality {
    fn compare(&self, a: &Value, b: &Value) -> Identity {
        Identity::from(a == b)
    }
}

// ---------------------------------------------------------------------------
// KeyComparator
// ---------------------------------------------------------------------------

/// Identity by a set of key fields inside the entity.
///
/// - `Match` when every key is present in both entities with equal values.
/// - `NoMatch` when some key is present in both entities with different values.
/// - `Indeterminate` otherwise (keys missing, or elements are not objects).
#[derive(Clone, Debug)]
pub struct KeyComparator {
    keys: Vec<Path>,
    case_insensitive: bool,
}

impl KeyComparator {
    /// Compare entities by the values at `keys` (paths relative to the entity).
    pub fn new(keys: Vec<Path>) -> Self {
        Self {
            keys,
            case_insensitive: false,
        }
    }

    /// Compare string key values without regard to case and surrounding
    /// whitespace.
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// The key paths this comparator inspects.
    pub fn keys(&self) -> &[Path] {
        &self.keys
    }

    fn values_equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::String(a), Value::String(b)) if self.case_insensitive => {
                a.trim().to_lowercase() == b.trim().to_lowercase()
            }
            _ => a == b,
        }
    }
}

impl IdentityComparator for KeyComparator {
    fn compare(&self, a: &Value, b: &Value) -> Identity {
        if self.keys.is_empty() {
            return Identity::Indeterminate;
        }
        let mut all_present = true;
        for key in &self.keys {
            match (get_path(a, key), get_path(b, key)) {
                (Some(va), Some(vb)) => {
                    if !self.values_equal(va, vb) {
                        return Identity::NoMatch;
                    }
                }
                _ => all_present = false,
            }
        }
        if all_present {
            Identity::Match
        } else {
            Identity::Indeterminate
        }
    }
}

/// Resolve a relative path inside a value through nested objects.
pub(crate) fn get_path<'v>(value: &'v Value, path: &Path) -> Option<&'v Value> {
    path.segments()
        .iter()
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

// ---------------------------------------------------------------------------
// ComparatorRegistry
// ---------------------------------------------------------------------------

/// Ordered identity predicates per list path, with a structural-equality
/// fallback.
///
/// Entries are matched on the exact path only: a comparator for `authors` says
/// nothing about the `authors.affiliations` lists nested inside each author.
#[derive(Clone)]
pub struct ComparatorRegistry {
    entries: BTreeMap<Path, Vec<Arc<dyn IdentityComparator>>>,
    default: Arc<dyn IdentityComparator>,
}

impl Default for ComparatorRegistry {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            default: Arc::new(DeepEquality),
        }
    }
}

impl fmt::Debug for ComparatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<String, usize> = self
            .entries
            .iter()
            .map(|(path, chain)| (path.to_string(), chain.len()))
            .collect();
        f.debug_struct("ComparatorRegistry")
            .field("entries", &counts)
            .finish_non_exhaustive()
    }
}

impl ComparatorRegistry {
    /// An empty registry falling back to structural equality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fallback predicate. An `Indeterminate` verdict from the
    /// fallback counts as `NoMatch`.
    pub fn with_default(mut self, comparator: impl IdentityComparator + 'static) -> Self {
        self.default = Arc::new(comparator);
        self
    }

    /// Append a predicate to the chain for `path`.
    pub fn register(&mut self, path: Path, comparator: impl IdentityComparator + 'static) {
        self.register_shared(path, Arc::new(comparator));
    }

    /// Append an already shared predicate to the chain for `path`.
    pub fn register_shared(&mut self, path: Path, comparator: Arc<dyn IdentityComparator>) {
        self.entries.entry(path).or_default().push(comparator);
    }

    /// Number of predicates registered for `path`.
    pub fn chain_len(&self, path: &Path) -> usize {
        self.entries.get(path).map_or(0, Vec::len)
    }

    /// Paths with at least one registered predicate.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys()
    }

    /// Decide whether `a` and `b`, both elements of the list at `path`, denote
    /// the same entity.
    ///
    /// The first predicate with a definite verdict wins; if every predicate is
    /// indeterminate the fallback decides.
    pub fn identity_equal(&self, path: &Path, a: &Value, b: &Value) -> bool {
        if let Some(chain) = self.entries.get(path) {
            for comparator in chain {
                match comparator.compare(a, b) {
                    Identity::Match => return true,
                    Identity::NoMatch => return false,
                    Identity::Indeterminate => {}
                }
            }
        }
        self.default.compare(a, b) == Identity::Match
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
    fn falls_back_to_deep_equality() {
        let registry = ComparatorRegistry::new();
        assert!(registry.identity_equal(&p("dois"), &json!({"value": "1"}), &json!({"value": "1"})));
        assert!(!registry.identity_equal(&p("dois"), &json!({"value": "1"}), &json!({"value": "2"})));
    }

    #[test]
    fn key_comparator_matches_modified_entity() {
        let mut registry = ComparatorRegistry::new();
        registry.register(p("authors"), KeyComparator::new(vec![p("uuid")]));

        let before = json!({"uuid": "a1", "full_name": "Smith, J."});
        let after = json!({"uuid": "a1", "full_name": "Smith, John"});
        let other = json!({"uuid": "b2", "full_name": "Smith, J."});

        assert!(registry.identity_equal(&p("authors"), &before, &after));
        assert!(!registry.identity_equal(&p("authors"), &before, &other));
    }

    #[test]
    fn comparators_are_exact_path_only() {
        let mut registry = ComparatorRegistry::new();
        registry.register(p("authors"), KeyComparator::new(vec![p("uuid")]));

        let a = json!({"uuid": "a1", "value": "x"});
        let b = json!({"uuid": "a1", "value": "y"});
        assert!(!registry.identity_equal(&p("authors.affiliations"), &a, &b));
    }

    #[test]
    fn chain_tries_predicates_in_order() {
        let mut registry = ComparatorRegistry::new();
        registry.register(p("references"), KeyComparator::new(vec![p("record")]));
        registry.register(
            p("references"),
            KeyComparator::new(vec![p("reference.dois")]),
        );
        assert_eq!(registry.chain_len(&p("references")), 2);

        // First key missing: second predicate decides.
        let a = json!({"reference": {"dois": ["10.1/x"], "title": "A"}});
        let b = json!({"reference": {"dois": ["10.1/x"], "title": "A (erratum)"}});
        assert!(registry.identity_equal(&p("references"), &a, &b));

        // First predicate is definite and wins even though the second would match.
        let c = json!({"record": 1, "reference": {"dois": ["10.1/x"]}});
        let d = json!({"record": 2, "reference": {"dois": ["10.1/x"]}});
        assert!(!registry.identity_equal(&p("references"), &c, &d));
    }

    #[test]
    fn all_indeterminate_uses_fallback() {
        let mut registry = ComparatorRegistry::new();
        registry.register(p("urls"), KeyComparator::new(vec![p("value")]));
        assert!(registry.identity_equal(&p("urls"), &json!("plain"), &json!("plain")));
        assert!(!registry.identity_equal(&p("urls"), &json!("plain"), &json!("other")));
    }

    #[test]
    fn closures_are_comparators() {
        let mut registry = ComparatorRegistry::new();
        registry.register(p("keywords"), |a: &Value, b: &Value| match (a.as_str(), b.as_str()) {
            (Some(a), Some(b)) => Identity::from(a.eq_ignore_ascii_case(b)),
            _ => Identity::Indeterminate,
        });
        assert!(registry.identity_equal(&p("keywords"), &json!("QCD"), &json!("qcd")));
    }

    #[test]
    fn case_insensitive_keys() {
        let comparator = KeyComparator::new(vec![p("value")]).case_insensitive();
        assert_eq!(
            comparator.compare(&json!({"value": " Hep-Th "}), &json!({"value": "hep-th"})),
            Identity::Match
        );
    }

    #[test]
    fn custom_fallback() {
        let registry = ComparatorRegistry::new().with_default(|_: &Value, _: &Value| Identity::Indeterminate);
        assert!(!registry.identity_equal(&p("x"), &json!(1), &json!(1)));
    }
}
