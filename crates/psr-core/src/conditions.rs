//! Aggregation of per-namespace outcomes into operator conditions.
//!
//! Every pass renders the same eight conditions, one per
//! (category, violating|inconclusive) pair, whether or not any namespace
//! landed in them. Condition types, reasons and message templates are part
//! of the public surface and must not change.

use crate::classify::NamespaceCategory;
use crate::detect::EvaluationOutcome;
use serde::{Deserialize, Serialize};

pub const POD_SECURITY_CUSTOMER_VIOLATION_TYPE: &str =
    "PodSecurityCustomerEvaluationViolationConditionsDetected";
pub const POD_SECURITY_OPENSHIFT_VIOLATION_TYPE: &str =
    "PodSecurityOpenshiftEvaluationViolationConditionsDetected";
pub const POD_SECURITY_RUN_LEVEL_ZERO_VIOLATION_TYPE: &str =
    "PodSecurityRunLevelZeroEvaluationViolationConditionsDetected";
pub const POD_SECURITY_DISABLED_SYNCER_VIOLATION_TYPE: &str =
    "PodSecurityDisabledSyncerEvaluationViolationConditionsDetected";
pub const POD_SECURITY_CUSTOMER_INCONCLUSIVE_TYPE: &str =
    "PodSecurityCustomerEvaluationInconclusiveConditionsDetected";
pub const POD_SECURITY_OPENSHIFT_INCONCLUSIVE_TYPE: &str =
    "PodSecurityOpenshiftEvaluationInconclusiveConditionsDetected";
pub const POD_SECURITY_RUN_LEVEL_ZERO_INCONCLUSIVE_TYPE: &str =
    "PodSecurityRunLevelZeroEvaluationInconclusiveConditionsDetected";
pub const POD_SECURITY_DISABLED_SYNCER_INCONCLUSIVE_TYPE: &str =
    "PodSecurityDisabledSyncerEvaluationInconclusiveConditionsDetected";

pub const VIOLATION_REASON: &str = "PSViolationsDetected";
pub const INCONCLUSIVE_REASON: &str = "PSViolationDecisionInconclusive";
pub const EXPECTED_REASON: &str = "ExpectedReason";

/// Which of the two lists of a category a namespace goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Violating,
    Inconclusive,
}

/// Render order: condition type, category, bucket.
const CONDITION_TABLE: [(&str, NamespaceCategory, Bucket); 8] = [
    (POD_SECURITY_CUSTOMER_VIOLATION_TYPE, NamespaceCategory::Customer, Bucket::Violating),
    (POD_SECURITY_OPENSHIFT_VIOLATION_TYPE, NamespaceCategory::OpenShiftManaged, Bucket::Violating),
    (POD_SECURITY_RUN_LEVEL_ZERO_VIOLATION_TYPE, NamespaceCategory::RunLevelZero, Bucket::Violating),
    (POD_SECURITY_DISABLED_SYNCER_VIOLATION_TYPE, NamespaceCategory::SyncDisabled, Bucket::Violating),
    (POD_SECURITY_CUSTOMER_INCONCLUSIVE_TYPE, NamespaceCategory::Customer, Bucket::Inconclusive),
    (POD_SECURITY_OPENSHIFT_INCONCLUSIVE_TYPE, NamespaceCategory::OpenShiftManaged, Bucket::Inconclusive),
    (POD_SECURITY_RUN_LEVEL_ZERO_INCONCLUSIVE_TYPE, NamespaceCategory::RunLevelZero, Bucket::Inconclusive),
    (POD_SECURITY_DISABLED_SYNCER_INCONCLUSIVE_TYPE, NamespaceCategory::SyncDisabled, Bucket::Inconclusive),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionStatus::True => write!(f, "True"),
            ConditionStatus::False => write!(f, "False"),
        }
    }
}

/// One aggregate condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The eight rendered conditions, in render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet {
    conditions: Vec<OperatorCondition>,
}

impl ConditionSet {
    pub fn get(&self, condition_type: &str) -> Option<&OperatorCondition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorCondition> {
        self.conditions.iter()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Conditions currently `True`.
    pub fn firing(&self) -> impl Iterator<Item = &OperatorCondition> {
        self.iter().filter(|c| c.status == ConditionStatus::True)
    }
}

impl<'a> IntoIterator for &'a ConditionSet {
    type Item = &'a OperatorCondition;
    type IntoIter = std::slice::Iter<'a, OperatorCondition>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditions.iter()
    }
}

/// Per-pass accumulator of violating and inconclusive namespaces.
#[derive(Debug, Default, Clone)]
pub struct PodSecurityConditions {
    violating: [Vec<String>; 4],
    inconclusive: [Vec<String>; 4],
}

fn slot(category: NamespaceCategory) -> usize {
    match category {
        NamespaceCategory::RunLevelZero => 0,
        NamespaceCategory::OpenShiftManaged => 1,
        NamespaceCategory::SyncDisabled => 2,
        NamespaceCategory::Customer => 3,
    }
}

impl PodSecurityConditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// File `namespace` according to `outcome`. Clean namespaces are not
    /// recorded anywhere.
    pub fn record(&mut self, category: NamespaceCategory, outcome: &EvaluationOutcome, namespace: &str) {
        match outcome {
            EvaluationOutcome::NotViolating => {}
            EvaluationOutcome::Violating(_) => self.add_violation(category, namespace),
            EvaluationOutcome::Inconclusive(_) => self.add_inconclusive(category, namespace),
        }
    }

    pub fn add_violation(&mut self, category: NamespaceCategory, namespace: &str) {
        self.violating[slot(category)].push(namespace.to_string());
    }

    pub fn add_inconclusive(&mut self, category: NamespaceCategory, namespace: &str) {
        self.inconclusive[slot(category)].push(namespace.to_string());
    }

    pub fn violating(&self, category: NamespaceCategory) -> &[String] {
        &self.violating[slot(category)]
    }

    pub fn inconclusive(&self, category: NamespaceCategory) -> &[String] {
        &self.inconclusive[slot(category)]
    }

    /// Render all eight conditions.
    pub fn render(&self) -> ConditionSet {
        let conditions = CONDITION_TABLE
            .iter()
            .map(|(condition_type, category, bucket)| {
                let names = match bucket {
                    Bucket::Violating => self.violating(*category),
                    Bucket::Inconclusive => self.inconclusive(*category),
                };
                make_condition(condition_type, *bucket, names)
            })
            .collect();
        ConditionSet { conditions }
    }
}

fn make_condition(condition_type: &str, bucket: Bucket, namespaces: &[String]) -> OperatorCondition {
    if namespaces.is_empty() {
        return OperatorCondition {
            condition_type: condition_type.to_string(),
            status: ConditionStatus::False,
            reason: EXPECTED_REASON.to_string(),
            message: None,
        };
    }

    let mut sorted: Vec<&str> = namespaces.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let list = format!("[{}]", sorted.join(" "));

    let (reason, message) = match bucket {
        Bucket::Violating => (VIOLATION_REASON, format!("Violations detected in namespaces: {}", list)),
        Bucket::Inconclusive => (
            INCONCLUSIVE_REASON,
            format!("Could not evaluate violations for namespaces: {}", list),
        ),
    };
    OperatorCondition {
        condition_type: condition_type.to_string(),
        status: ConditionStatus::True,
        reason: reason.to_string(),
        message: Some(message),
    }
}
