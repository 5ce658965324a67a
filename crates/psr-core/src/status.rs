//! Persisted operator status.
//!
//! Rendered condition sets carry no timestamps. Merging them into an
//! [`OperatorStatus`] stamps `lastTransitionTime`, which only moves when a
//! condition's status actually flips, so repeated passes over an unchanged
//! cluster leave the status byte-identical.

use crate::cluster::{ClientError, ConditionPublisher};
use crate::conditions::{ConditionSet, ConditionStatus, OperatorCondition};
use chrono::{DateTime, Timelike, Utc};
use psr_common::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A condition as stored on the operator status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    pub last_transition_time: DateTime<Utc>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The condition list of an operator status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStatus {
    #[serde(default)]
    pub conditions: Vec<StatusCondition>,
}

impl OperatorStatus {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn get(&self, condition_type: &str) -> Option<&StatusCondition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// Merge `set` into this status. Conditions not in `set` are kept as-is.
    /// Returns the number of conditions whose status flipped or that were
    /// newly added.
    pub fn apply(&mut self, set: &ConditionSet, now: DateTime<Utc>) -> usize {
        // Kubernetes timestamps have second precision.
        let now = truncate_to_seconds(now);
        let mut transitions = 0;
        for condition in set {
            match self
                .conditions
                .iter_mut()
                .find(|c| c.condition_type == condition.condition_type)
            {
                Some(existing) => {
                    if existing.status != condition.status {
                        existing.last_transition_time = now;
                        transitions += 1;
                    }
                    existing.status = condition.status;
                    existing.reason = condition.reason.clone();
                    existing.message = condition.message.clone();
                }
                None => {
                    self.conditions.push(stamp(condition, now));
                    transitions += 1;
                }
            }
        }
        transitions
    }
}

fn stamp(condition: &OperatorCondition, now: DateTime<Utc>) -> StatusCondition {
    StatusCondition {
        condition_type: condition.condition_type.clone(),
        status: condition.status,
        last_transition_time: now,
        reason: condition.reason.clone(),
        message: condition.message.clone(),
    }
}

fn truncate_to_seconds(time: DateTime<Utc>) -> DateTime<Utc> {
    time.with_nanosecond(0).unwrap_or(time)
}

/// Publishes condition sets by merging them into a JSON status file.
///
/// The merge starts from the file's current content, or from an explicit
/// base status when one is given.
#[derive(Debug)]
pub struct FileStatusPublisher {
    path: PathBuf,
    base: Option<OperatorStatus>,
    written: Mutex<Option<OperatorStatus>>,
}

impl FileStatusPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base: None,
            written: Mutex::new(None),
        }
    }

    /// Merge into `base` instead of the file's current content.
    pub fn with_base(mut self, base: OperatorStatus) -> Self {
        self.base = Some(base);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The status most recently written, if any.
    pub fn written(&self) -> Option<OperatorStatus> {
        self.written.lock().ok().and_then(|slot| slot.clone())
    }

    fn merge_and_write(&self, conditions: &ConditionSet) -> Result<()> {
        let mut status = match &self.base {
            Some(base) => base.clone(),
            None if self.path.exists() => OperatorStatus::load(&self.path)?,
            None => OperatorStatus::default(),
        };
        let transitions = status.apply(conditions, Utc::now());

        let content = serde_json::to_string_pretty(&status)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), transitions, "status written");
        if let Ok(mut slot) = self.written.lock() {
            *slot = Some(status);
        }
        Ok(())
    }
}

impl ConditionPublisher for FileStatusPublisher {
    fn publish(&self, conditions: &ConditionSet) -> std::result::Result<(), ClientError> {
        self.merge_and_write(conditions)
            .map_err(|err| ClientError::Publish(format!("{}: {}", self.path.display(), err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::NamespaceCategory;
    use crate::conditions::{PodSecurityConditions, POD_SECURITY_CUSTOMER_VIOLATION_TYPE};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap()
    }

    fn violating(name: &str) -> ConditionSet {
        let mut conditions = PodSecurityConditions::new();
        conditions.add_violation(NamespaceCategory::Customer, name);
        conditions.render()
    }

    #[test]
    fn test_apply_to_empty_adds_all() {
        let mut status = OperatorStatus::default();
        let added = status.apply(&PodSecurityConditions::new().render(), at(1));
        assert_eq!(added, 8);
        assert!(status.conditions.iter().all(|c| c.last_transition_time == at(1)));
    }

    #[test]
    fn test_transition_time_moves_only_on_flip() {
        let mut status = OperatorStatus::default();
        status.apply(&PodSecurityConditions::new().render(), at(1));

        assert_eq!(status.apply(&PodSecurityConditions::new().render(), at(2)), 0);
        assert!(status.conditions.iter().all(|c| c.last_transition_time == at(1)));

        assert_eq!(status.apply(&violating("team-a"), at(3)), 1);
        let customer = status.get(POD_SECURITY_CUSTOMER_VIOLATION_TYPE).unwrap();
        assert_eq!(customer.last_transition_time, at(3));
        assert_eq!(customer.status, ConditionStatus::True);

        // Message changes without a status flip keep the timestamp.
        assert_eq!(status.apply(&violating("team-b"), at(4)), 0);
        let customer = status.get(POD_SECURITY_CUSTOMER_VIOLATION_TYPE).unwrap();
        assert_eq!(customer.last_transition_time, at(3));
        assert_eq!(
            customer.message.as_deref(),
            Some("Violations detected in namespaces: [team-b]")
        );
    }

    #[test]
    fn test_apply_keeps_foreign_conditions() {
        let mut status = OperatorStatus {
            conditions: vec![StatusCondition {
                condition_type: "Available".to_string(),
                status: ConditionStatus::True,
                last_transition_time: at(0),
                reason: "AsExpected".to_string(),
                message: None,
            }],
        };
        status.apply(&PodSecurityConditions::new().render(), at(1));
        assert_eq!(status.conditions.len(), 9);
        assert_eq!(status.get("Available").unwrap().last_transition_time, at(0));
    }

    #[test]
    fn test_file_publisher_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let publisher = FileStatusPublisher::new(&path);

        publisher.publish(&violating("team-a")).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        publisher.publish(&violating("team-a")).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);

        let status = OperatorStatus::load(&path).unwrap();
        assert_eq!(status.conditions.len(), 8);
        assert!(first.contains("lastTransitionTime"));
    }

    #[test]
    fn test_file_publisher_reports_bad_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStatusPublisher::new(&path)
            .publish(&violating("team-a"))
            .unwrap_err();
        assert!(matches!(err, ClientError::Publish(_)));
    }

    #[test]
    fn test_file_publisher_merges_into_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, r#"{"conditions": []}"#).unwrap();

        let mut base = OperatorStatus::default();
        base.apply(&violating("team-a"), at(1));
        base.conditions.push(StatusCondition {
            condition_type: "Available".to_string(),
            status: ConditionStatus::True,
            last_transition_time: at(0),
            reason: "AsExpected".to_string(),
            message: None,
        });

        let publisher = FileStatusPublisher::new(&path).with_base(base);
        assert!(publisher.written().is_none());
        publisher.publish(&violating("team-b")).unwrap();

        let on_disk = OperatorStatus::load(&path).unwrap();
        assert_eq!(publisher.written().as_ref(), Some(&on_disk));
        assert_eq!(on_disk.conditions.len(), 9);
        assert!(on_disk.get("Available").is_some());
        let customer = on_disk.get(POD_SECURITY_CUSTOMER_VIOLATION_TYPE).unwrap();
        assert_eq!(customer.last_transition_time, at(1));
        assert_eq!(
            customer.message.as_deref(),
            Some("Violations detected in namespaces: [team-b]")
        );
    }
}
