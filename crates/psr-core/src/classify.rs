//! Namespace categories.
//!
//! Every namespace falls into exactly one category. Categories are decided
//! by an ordered rule table: the first matching rule wins, and a namespace
//! no rule matches is a customer namespace.
//!
//! | priority | rule                | category           |
//! |----------|---------------------|--------------------|
//! | 1        | run-level zero name | `RunLevelZero`     |
//! | 2        | `openshift` prefix  | `OpenShiftManaged` |
//! | 3        | label sync disabled | `SyncDisabled`     |
//! | -        | fallback            | `Customer`         |

use psr_common::labels::{
    LABEL_SYNC_CONTROL_LABEL, PLATFORM_NAMESPACE_PREFIX, RUN_LEVEL_ZERO_NAMESPACES,
};
use psr_common::NamespaceRecord;
use serde::{Deserialize, Serialize};

/// Ownership category of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceCategory {
    /// Bootstrapped before any operator runs.
    RunLevelZero,
    /// Owned by a platform operator.
    #[serde(rename = "openshift_managed")]
    OpenShiftManaged,
    /// Label synchronization switched off by its owner.
    SyncDisabled,
    /// Everything else.
    Customer,
}

impl NamespaceCategory {
    /// All categories in priority order.
    pub fn all() -> &'static [NamespaceCategory] {
        &[
            NamespaceCategory::RunLevelZero,
            NamespaceCategory::OpenShiftManaged,
            NamespaceCategory::SyncDisabled,
            NamespaceCategory::Customer,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            NamespaceCategory::RunLevelZero => "run_level_zero",
            NamespaceCategory::OpenShiftManaged => "openshift_managed",
            NamespaceCategory::SyncDisabled => "sync_disabled",
            NamespaceCategory::Customer => "customer",
        }
    }

    /// Whether violations here may be attributed to end-user workloads.
    pub fn allows_user_attribution(&self) -> bool {
        matches!(self, NamespaceCategory::Customer)
    }
}

impl std::fmt::Display for NamespaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub name: &'static str,
    pub category: NamespaceCategory,
    pub matches: fn(&NamespaceRecord) -> bool,
}

/// Classification rules in priority order.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "run_level_zero_name",
        category: NamespaceCategory::RunLevelZero,
        matches: is_run_level_zero,
    },
    ClassificationRule {
        name: "platform_prefix",
        category: NamespaceCategory::OpenShiftManaged,
        matches: has_platform_prefix,
    },
    ClassificationRule {
        name: "label_sync_disabled",
        category: NamespaceCategory::SyncDisabled,
        matches: has_label_sync_disabled,
    },
];

pub fn is_run_level_zero(ns: &NamespaceRecord) -> bool {
    RUN_LEVEL_ZERO_NAMESPACES
        .iter()
        .any(|name| *name == ns.name())
}

pub fn has_platform_prefix(ns: &NamespaceRecord) -> bool {
    ns.name().starts_with(PLATFORM_NAMESPACE_PREFIX)
}

pub fn has_label_sync_disabled(ns: &NamespaceRecord) -> bool {
    ns.label(LABEL_SYNC_CONTROL_LABEL) == Some("false")
}

/// Classify a namespace. Pure function of its name and labels.
pub fn classify(ns: &NamespaceRecord) -> NamespaceCategory {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| (rule.matches)(ns))
        .map(|rule| rule.category)
        .unwrap_or(NamespaceCategory::Customer)
}
