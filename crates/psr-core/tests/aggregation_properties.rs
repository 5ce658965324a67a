//! Property-based tests for level resolution and condition aggregation.

use proptest::prelude::*;
use psr_common::labels::{AUDIT_LEVEL_LABEL, MINIMALLY_SUFFICIENT_ANNOTATION, WARN_LEVEL_LABEL};
use psr_common::{Level, NamespaceRecord};
use psr_core::conditions::{EXPECTED_REASON, INCONCLUSIVE_REASON, VIOLATION_REASON};
use psr_core::resolve::{resolve, LevelSource};
use psr_core::{ConditionStatus, NamespaceCategory, PodSecurityConditions};

fn level_strategy() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::Privileged),
        Just(Level::Baseline),
        Just(Level::Restricted),
    ]
}

fn category_strategy() -> impl Strategy<Value = NamespaceCategory> {
    prop_oneof![
        Just(NamespaceCategory::RunLevelZero),
        Just(NamespaceCategory::OpenShiftManaged),
        Just(NamespaceCategory::SyncDisabled),
        Just(NamespaceCategory::Customer),
    ]
}

/// (category, namespace, violating?) triples with distinct names.
fn entries_strategy() -> impl Strategy<Value = Vec<(NamespaceCategory, String, bool)>> {
    prop::collection::btree_set("[a-z][a-z0-9-]{0,12}", 0..24).prop_flat_map(|names| {
        let names: Vec<String> = names.into_iter().collect();
        let len = names.len();
        (
            Just(names),
            prop::collection::vec(category_strategy(), len),
            prop::collection::vec(any::<bool>(), len),
        )
            .prop_map(|(names, categories, flags)| {
                names
                    .into_iter()
                    .zip(categories)
                    .zip(flags)
                    .map(|((name, category), violating)| (category, name, violating))
                    .collect()
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    /// Two valid alert labels always resolve to the stricter of the two.
    #[test]
    fn alert_labels_resolve_to_strictest(warn in level_strategy(), audit in level_strategy()) {
        let ns = NamespaceRecord::new("ns")
            .with_label(WARN_LEVEL_LABEL, warn.as_str())
            .with_label(AUDIT_LEVEL_LABEL, audit.as_str());
        let resolved = resolve(&ns).unwrap();
        prop_assert_eq!(resolved.source, LevelSource::AlertLabels);
        prop_assert_eq!(resolved.level().unwrap(), warn.max(audit));
    }

    /// Garbage next to a valid label never wins and never hides it.
    #[test]
    fn invalid_label_is_ignored(level in level_strategy(), junk in "[0-9]{1,8}") {
        let ns = NamespaceRecord::new("ns")
            .with_label(WARN_LEVEL_LABEL, junk.as_str())
            .with_label(AUDIT_LEVEL_LABEL, level.as_str());
        prop_assert_eq!(resolve(&ns).unwrap().level().unwrap(), level);
    }

    /// The annotation is used verbatim, whatever the labels say.
    #[test]
    fn annotation_overrides_labels(value in "[a-zA-Z]{1,12}", label in level_strategy()) {
        let ns = NamespaceRecord::new("ns")
            .with_annotation(MINIMALLY_SUFFICIENT_ANNOTATION, value.as_str())
            .with_label(WARN_LEVEL_LABEL, label.as_str());
        let resolved = resolve(&ns).unwrap();
        prop_assert_eq!(resolved.source, LevelSource::MinimallySufficientAnnotation);
        prop_assert_eq!(resolved.value, value);
    }

    /// Rendering is independent of recording order and always yields the
    /// eight conditions with sorted namespace lists.
    #[test]
    fn render_is_order_independent(entries in entries_strategy()) {
        let mut forward = PodSecurityConditions::new();
        let mut backward = PodSecurityConditions::new();
        for (category, name, violating) in &entries {
            if *violating {
                forward.add_violation(*category, name);
            } else {
                forward.add_inconclusive(*category, name);
            }
        }
        for (category, name, violating) in entries.iter().rev() {
            if *violating {
                backward.add_violation(*category, name);
            } else {
                backward.add_inconclusive(*category, name);
            }
        }

        let rendered = forward.render();
        prop_assert_eq!(&rendered, &backward.render());
        prop_assert_eq!(rendered.len(), 8);

        for condition in &rendered {
            match condition.status {
                ConditionStatus::False => {
                    prop_assert_eq!(condition.reason.as_str(), EXPECTED_REASON);
                    prop_assert!(condition.message.is_none());
                }
                ConditionStatus::True => {
                    prop_assert!(
                        condition.reason == VIOLATION_REASON
                            || condition.reason == INCONCLUSIVE_REASON
                    );
                    let message = condition.message.as_deref().unwrap();
                    let open = message.find('[').unwrap();
                    let names: Vec<&str> = message[open + 1..message.len() - 1].split(' ').collect();
                    let mut sorted = names.clone();
                    sorted.sort_unstable();
                    prop_assert_eq!(names, sorted);
                }
            }
        }

        let firing = rendered.firing().count();
        let occupied = NamespaceCategory::all()
            .iter()
            .map(|c| {
                usize::from(!forward.violating(*c).is_empty())
                    + usize::from(!forward.inconclusive(*c).is_empty())
            })
            .sum::<usize>();
        prop_assert_eq!(firing, occupied);
    }
}
