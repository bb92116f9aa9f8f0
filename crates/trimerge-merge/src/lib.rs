//! Merge engine for trimerge.
//!
//! Reconciles two independently edited versions of a JSON document (`local`
//! and `incoming`) against their common `ancestor`. Every field and list is
//! resolved by an operation chosen per path; list elements are aligned by
//! pluggable identity predicates rather than by index. Divergence never stops
//! a merge: the engine always returns a complete merged document together
//! with the conflicts a reviewer may want to revisit.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use trimerge_merge::{FieldOp, ListOp, MergeConfig, Merger};
//!
//! let config = MergeConfig::builder()
//!     .default_field_op(FieldOp::FallbackKeepHead)
//!     .default_list_op(ListOp::KeepUpdateAndHeadEntitiesHeadFirst)
//!     .key_comparator("authors", &["uuid"])
//!     .build()
//!     .unwrap();
//! let merger = Merger::new(config).unwrap();
//!
//! let ancestor = json!({"title": "X", "authors": [{"uuid": "1", "name": "A"}]});
//! let local = json!({"title": "Y", "authors": [{"uuid": "1", "name": "A"}]});
//! let incoming = json!({"title": "Z", "authors": [{"uuid": "1", "name": "A."}]});
//!
//! let outcome = merger.merge(&ancestor, &local, &incoming).unwrap();
//! assert_eq!(outcome.merged, json!({"title": "Y", "authors": [{"uuid": "1", "name": "A."}]}));
//! assert_eq!(outcome.conflicts.len(), 1);
//! assert_eq!(outcome.conflicts[0].path.to_string(), "title");
//! ```

pub mod align;
pub mod comparator;
pub mod config;
pub mod conflict;
pub mod error;
pub mod field;
pub mod file;
pub mod filter;
mod list;
pub mod merger;
pub mod ops;
pub mod registry;

// Re-exports for convenience.
pub use align::{Alignment, EntityGroup, EntityId, EntityStatus, Member};
pub use comparator::{ComparatorRegistry, DeepEquality, Identity, IdentityComparator, KeyComparator};
pub use config::{MergeConfig, MergeConfigBuilder};
pub use conflict::{Conflict, ConflictKind};
pub use error::{MergeError, MergeResult};
pub use field::{merge_field, FieldMerge};
pub use file::{ComparatorEntry, ConfigFile, PreFilterEntry};
pub use filter::{FieldEqualsFilter, Filtered, PreFilter, PreFilterStage};
pub use merger::{MergeOutcome, Merger};
pub use ops::{FieldOp, ListOp};
pub use registry::OperationRegistry;

use serde_json::Value;

/// Merge three versions of a document in one call.
///
/// Equivalent to `Merger::new(config)?.merge(ancestor, local, incoming)`.
pub fn merge(
    config: MergeConfig,
    ancestor: &Value,
    local: &Value,
    incoming: &Value,
) -> MergeResult<MergeOutcome> {
    Merger::new(config)?.merge(ancestor, local, incoming)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use trimerge_types::{Path, Side};

    fn config(field: FieldOp, list: ListOp) -> MergeConfig {
        MergeConfig::builder()
            .default_field_op(field)
            .default_list_op(list)
            .build()
            .unwrap()
    }

    /// A small literature-record profile: authors identified by uuid.
    fn record_config() -> MergeConfigBuilder {
        MergeConfig::builder()
            .default_field_op(FieldOp::FallbackKeepHead)
            .default_list_op(ListOp::KeepUpdateAndHeadEntitiesHeadFirst)
            .key_comparator("authors", &["uuid"])
            .field_op("authors.full_name", FieldOp::KeepLongest)
    }

    // -----------------------------------------------------------------------
    // 1. Single-field scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn only_incoming_changed_title() {
        let outcome = merge(
            config(FieldOp::FallbackKeepHead, ListOp::KeepOnlyHeadEntities),
            &json!({"title": "X"}),
            &json!({"title": "X"}),
            &json!({"title": "Y"}),
        )
        .unwrap();
        assert_eq!(outcome.merged, json!({"title": "Y"}));
        assert!(!outcome.has_conflicts());
    }

    #[test]
    fn both_changed_title() {
        let outcome = merge(
            config(FieldOp::FallbackKeepHead, ListOp::KeepOnlyHeadEntities),
            &json!({"title": "X"}),
            &json!({"title": "Y"}),
            &json!({"title": "Z"}),
        )
        .unwrap();
        assert_eq!(outcome.merged, json!({"title": "Y"}));
        assert_eq!(outcome.conflicts.len(), 1);

        let conflict = &outcome.conflicts[0];
        assert_eq!(conflict.path.to_string(), "title");
        assert_eq!(conflict.ancestor, Some(json!("X")));
        assert_eq!(conflict.local, Some(json!("Y")));
        assert_eq!(conflict.incoming, Some(json!("Z")));
        assert_eq!(conflict.kept, Side::Local);
    }

    #[test]
    fn field_op_inherited_from_enclosing_path() {
        let config = MergeConfig::builder()
            .default_field_op(FieldOp::FallbackKeepHead)
            .default_list_op(ListOp::KeepOnlyHeadEntities)
            .field_op("imprint", FieldOp::KeepUpdate)
            .build()
            .unwrap();
        let outcome = merge(
            config,
            &json!({"imprint": {"date": "1"}, "title": "X"}),
            &json!({"imprint": {"date": "2"}, "title": "Y"}),
            &json!({"imprint": {"date": "3"}, "title": "Z"}),
        )
        .unwrap();
        assert_eq!(outcome.merged, json!({"imprint": {"date": "3"}, "title": "Y"}));
        let paths: Vec<String> = outcome.conflicts.iter().map(|c| c.path.to_string()).collect();
        assert_eq!(paths, ["title"]);
    }

    // -----------------------------------------------------------------------
    // 2. Lists of entities
    // -----------------------------------------------------------------------

    #[test]
    fn delete_edit_clash_is_reported_once() {
        let config = MergeConfig::builder()
            .default_field_op(FieldOp::FallbackKeepHead)
            .default_list_op(ListOp::KeepUpdateEntitiesConflictOnHeadDelete)
            .key_comparator("authors", &["uuid"])
            .build()
            .unwrap();
        let a = json!({"uuid": "1", "full_name": "Smith, J."});
        let a_modified = json!({"uuid": "1", "full_name": "Smith, John"});

        let outcome = merge(
            config,
            &json!({"authors": [a.clone()]}),
            &json!({"authors": []}),
            &json!({"authors": [a_modified.clone()]}),
        )
        .unwrap();

        assert_eq!(outcome.merged, json!({"authors": [a_modified.clone()]}));
        assert_eq!(outcome.conflicts.len(), 1);
        let conflict = &outcome.conflicts[0];
        assert_eq!(conflict.path.to_string(), "authors");
        assert_eq!(conflict.kind, ConflictKind::AddBackToHead);
        assert_eq!(conflict.ancestor, Some(a));
        assert_eq!(conflict.local, None);
        assert_eq!(conflict.incoming, Some(a_modified));
    }

    #[test]
    fn keep_longest_author_name_inside_list() {
        let config = record_config().build().unwrap();
        let outcome = merge(
            config,
            &json!({"authors": [{"uuid": "1", "full_name": "Smith, J."}]}),
            &json!({"authors": [{"uuid": "1", "full_name": "Smith, J.R."}]}),
            &json!({"authors": [{"uuid": "1", "full_name": "Smith, John Richard"}]}),
        )
        .unwrap();
        assert_eq!(
            outcome.merged,
            json!({"authors": [{"uuid": "1", "full_name": "Smith, John Richard"}]})
        );
        assert!(!outcome.has_conflicts());
    }

    #[test]
    fn union_keeps_every_author_once() {
        let config = record_config().build().unwrap();
        let outcome = merge(
            config,
            &json!({"authors": [{"uuid": "1"}, {"uuid": "2"}]}),
            &json!({"authors": [{"uuid": "1"}, {"uuid": "3"}]}),
            &json!({"authors": [{"uuid": "4"}, {"uuid": "2"}, {"uuid": "1"}]}),
        )
        .unwrap();
        assert_eq!(
            outcome.merged,
            json!({"authors": [{"uuid": "1"}, {"uuid": "3"}, {"uuid": "4"}, {"uuid": "2"}]})
        );
    }

    #[test]
    fn nested_lists_use_their_own_comparators() {
        let config = record_config()
            .key_comparator("authors.affiliations", &["record"])
            .build()
            .unwrap();
        let outcome = merge(
            config,
            &json!({"authors": [{"uuid": "1", "affiliations": [{"record": 1, "value": "CERN"}]}]}),
            &json!({"authors": [{"uuid": "1", "affiliations": [{"record": 1, "value": "CERN, Geneva"}]}]}),
            &json!({"authors": [{"uuid": "1", "affiliations": [{"record": 1, "value": "CERN"}, {"record": 2, "value": "DESY"}]}]}),
        )
        .unwrap();
        assert_eq!(
            outcome.merged,
            json!({"authors": [{"uuid": "1", "affiliations": [
                {"record": 1, "value": "CERN, Geneva"},
                {"record": 2, "value": "DESY"}
            ]}]})
        );
        assert!(!outcome.has_conflicts());
    }

    #[test]
    fn pre_filters_reach_single_side_entities() {
        let config = record_config()
            .drop_where("authors.affiliations", "hidden", json!(true), None)
            .build()
            .unwrap();
        let ancestor = json!({"authors": [{"uuid": "1", "affiliations": []}]});
        let local = json!({"authors": [
            {"uuid": "1", "affiliations": [{"value": "A", "hidden": true}]},
            {"uuid": "2", "affiliations": [{"value": "A", "hidden": true}, {"value": "B"}]}
        ]});
        let outcome = merge(config, &ancestor, &local, &ancestor).unwrap();
        assert_eq!(
            outcome.merged,
            json!({"authors": [
                {"uuid": "1", "affiliations": []},
                {"uuid": "2", "affiliations": [{"value": "B"}]}
            ]})
        );
        assert!(!outcome.has_conflicts());
    }

    #[test]
    fn pre_filters_reach_single_side_objects() {
        let config = record_config()
            .drop_where("thesis_info.institutions", "hidden", json!(true), Some(Side::Incoming))
            .build()
            .unwrap();
        let thesis = json!({"thesis_info": {"institutions": [
            {"name": "X", "hidden": true},
            {"name": "Y"}
        ]}});

        let outcome = merge(config.clone(), &json!({}), &json!({}), &thesis).unwrap();
        assert_eq!(
            outcome.merged,
            json!({"thesis_info": {"institutions": [{"name": "Y"}]}})
        );
        assert!(!outcome.has_conflicts());

        // The filter is bound to the incoming side.
        let outcome = merge(config, &json!({}), &thesis, &json!({})).unwrap();
        assert_eq!(outcome.merged, thesis);
    }

    // -----------------------------------------------------------------------
    // 3. Conflict suppression
    // -----------------------------------------------------------------------

    #[test]
    fn suppression_hides_conflicts_without_changing_result() {
        let ancestor = json!({"control_number": 1, "title": "X"});
        let local = json!({"control_number": 2, "title": "Y"});
        let incoming = json!({"control_number": 3, "title": "Z"});

        let plain = merge(
            record_config().build().unwrap(),
            &ancestor,
            &local,
            &incoming,
        )
        .unwrap();
        let suppressed = merge(
            record_config().suppress_conflicts("control_number").build().unwrap(),
            &ancestor,
            &local,
            &incoming,
        )
        .unwrap();

        assert_eq!(plain.merged, suppressed.merged);
        assert_eq!(plain.conflicts.len(), 2);
        assert_eq!(plain.suppressed, 0);
        assert_eq!(suppressed.conflicts.len(), 1);
        assert_eq!(suppressed.conflicts[0].path, Path::parse("title").unwrap());
        assert_eq!(suppressed.suppressed, 1);
    }

    #[test]
    fn suppression_is_exact_path() {
        let outcome = merge(
            record_config().suppress_conflicts("imprint").build().unwrap(),
            &json!({"imprint": {"date": "1"}}),
            &json!({"imprint": {"date": "2"}}),
            &json!({"imprint": {"date": "3"}}),
        )
        .unwrap();
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.suppressed, 0);
    }

    // -----------------------------------------------------------------------
    // 4. Configuration and sharing
    // -----------------------------------------------------------------------

    #[test]
    fn missing_default_aborts_before_merging() {
        let config = MergeConfig::builder()
            .default_field_op(FieldOp::KeepHead)
            .build();
        assert!(matches!(config, Err(MergeError::Configuration(_))));

        let err = merge(MergeConfig::default(), &json!({}), &json!({}), &json!({})).unwrap_err();
        assert!(matches!(err, MergeError::Configuration(_)));
    }

    #[test]
    fn merger_is_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Merger>();

        let merger = Merger::new(record_config().build().unwrap()).unwrap();
        let ancestor = json!({"title": "X"});
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|n| {
                    let merger = &merger;
                    let ancestor = &ancestor;
                    scope.spawn(move || {
                        let incoming = json!({"title": format!("T{n}")});
                        merger.merge(ancestor, ancestor, &incoming).unwrap()
                    })
                })
                .collect();
            for (n, handle) in handles.into_iter().enumerate() {
                let outcome = handle.join().unwrap();
                assert_eq!(outcome.merged, json!({"title": format!("T{n}")}));
            }
        });
    }

    // -----------------------------------------------------------------------
    // 5. Properties
    // -----------------------------------------------------------------------

    fn document() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (-3i64..3).prop_map(Value::from),
            "[a-c]{0,2}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-d]", inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    fn words() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set("[a-f]", 0..5).prop_map(|set| set.into_iter().collect())
    }

    proptest! {
        #[test]
        fn idempotent_for_every_operation(doc in document()) {
            for field in FieldOp::ALL {
                for list in ListOp::ALL {
                    let outcome = merge(config(field, list), &doc, &doc, &doc).unwrap();
                    prop_assert_eq!(&outcome.merged, &doc);
                    prop_assert!(!outcome.has_conflicts());
                }
            }
        }

        #[test]
        fn deterministic(a in document(), l in document(), i in document()) {
            let merger = Merger::new(config(
                FieldOp::FallbackKeepHead,
                ListOp::KeepUpdateEntitiesConflictOnHeadDelete,
            ))
            .unwrap();
            let first = merger.merge(&a, &l, &i).unwrap();
            let second = merger.merge(&a, &l, &i).unwrap();
            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }

        #[test]
        fn unchanged_incoming_converges_to_local(a in document(), l in document()) {
            let outcome = merge(
                config(FieldOp::FallbackKeepHead, ListOp::KeepOnlyHeadEntities),
                &a,
                &l,
                &a,
            )
            .unwrap();
            prop_assert_eq!(&outcome.merged, &l);
            prop_assert!(!outcome.has_conflicts());
        }

        #[test]
        fn unchanged_local_converges_to_incoming(a in document(), i in document()) {
            let outcome = merge(
                config(FieldOp::FallbackKeepUpdate, ListOp::KeepOnlyUpdateEntities),
                &a,
                &a,
                &i,
            )
            .unwrap();
            prop_assert_eq!(&outcome.merged, &i);
            prop_assert!(!outcome.has_conflicts());
        }

        #[test]
        fn union_keeps_every_entity_once(a in words(), l in words(), i in words()) {
            for op in [
                ListOp::KeepUpdateAndHeadEntitiesHeadFirst,
                ListOp::KeepUpdateAndHeadEntitiesUpdateFirst,
            ] {
                let outcome = merge(
                    config(FieldOp::FallbackKeepHead, op),
                    &json!({"k": a.clone()}),
                    &json!({"k": l.clone()}),
                    &json!({"k": i.clone()}),
                )
                .unwrap();
                let merged: Vec<String> =
                    serde_json::from_value(outcome.merged["k"].clone()).unwrap_or_default();
                for word in l.iter().chain(&i) {
                    prop_assert_eq!(merged.iter().filter(|m| *m == word).count(), 1);
                }
                prop_assert!(merged.iter().all(|m| l.contains(m) || i.contains(m)));
            }
        }

        #[test]
        fn keep_only_head_never_adds_incoming_entities(a in words(), l in words(), i in words()) {
            let outcome = merge(
                config(FieldOp::FallbackKeepHead, ListOp::KeepOnlyHeadEntities),
                &json!({"k": a}),
                &json!({"k": l.clone()}),
                &json!({"k": i}),
            )
            .unwrap();
            let merged: Vec<String> = serde_json::from_value(outcome.merged["k"].clone()).unwrap();
            prop_assert_eq!(merged, l);
        }
    }
}
