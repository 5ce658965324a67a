//! Collaborator interfaces the readiness engine depends on.
//!
//! The engine never talks to an API server directly. Listing, dry-run
//! applies, pod evaluation and condition publishing all go through these
//! traits so the same engine runs against a live client, the offline
//! [`SnapshotCluster`](crate::snapshot::SnapshotCluster), or a test double.

use crate::conditions::ConditionSet;
use crate::warnings::WarningSink;
use psr_common::{LevelVersion, NamespaceRecord, ObjectMeta, PodRecord, PodSpec};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failures reported by a collaborator.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("{operation} failed for namespace {namespace:?}: {message}")]
    Request {
        operation: &'static str,
        namespace: String,
        message: String,
    },

    #[error("list namespaces failed: {0}")]
    ListNamespaces(String),

    #[error("publish failed: {0}")]
    Publish(String),
}

impl ClientError {
    pub fn request(
        operation: &'static str,
        namespace: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ClientError::Request {
            operation,
            namespace: namespace.into(),
            message: message.into(),
        }
    }
}

/// A server-side apply that must not be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunRequest<'a> {
    pub namespace: &'a str,
    pub labels: BTreeMap<String, String>,
    pub field_manager: &'a str,
}

/// Read access to namespaces and pods plus the dry-run apply primitive.
pub trait ClusterClient: Send + Sync {
    fn list_namespaces(&self) -> Result<Vec<NamespaceRecord>, ClientError>;

    /// Apply `request` with dry-run semantics. Admission warnings are pushed
    /// into `sink`; the returned error is reserved for request failures.
    fn dry_run_apply(
        &self,
        request: &DryRunRequest<'_>,
        sink: &mut WarningSink,
    ) -> Result<(), ClientError>;

    fn list_pods(&self, namespace: &str) -> Result<Vec<PodRecord>, ClientError>;
}

/// Outcome of one Pod Security check against one pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub allowed: bool,
    /// Short reason, e.g. `runAsNonRoot != true`. Empty when allowed.
    pub forbidden_reason: String,
    /// Which containers or fields tripped the check. Empty when allowed.
    pub forbidden_detail: String,
}

impl CheckResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            forbidden_reason: String::new(),
            forbidden_detail: String::new(),
        }
    }

    pub fn forbidden(reason: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            allowed: false,
            forbidden_reason: reason.into(),
            forbidden_detail: detail.into(),
        }
    }
}

/// Evaluates a pod spec against a Pod Security level. Pure.
pub trait PodEvaluator: Send + Sync {
    fn evaluate_pod(
        &self,
        level: &LevelVersion,
        metadata: &ObjectMeta,
        spec: &PodSpec,
    ) -> Vec<CheckResult>;
}

/// Persists a rendered condition set onto an operator status.
pub trait ConditionPublisher {
    fn publish(&self, conditions: &ConditionSet) -> Result<(), ClientError>;
}
