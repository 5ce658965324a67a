//! Pod Security Readiness core library.
//!
//! Decides, namespace by namespace, whether enforcing Pod Security
//! admission would break existing workloads, and folds the answers into a
//! fixed set of operator conditions:
//! - Namespace classification and enforcement level resolution
//! - Dry-run simulation with per-call warning capture
//! - Violation attribution and condition aggregation
//! - An offline snapshot cluster and built-in pod checks
//!
//! The binary entry point is in `main.rs`.

pub mod checks;
pub mod classify;
pub mod cluster;
pub mod conditions;
pub mod controller;
pub mod detect;
pub mod exit_codes;
pub mod logging;
pub mod resolve;
pub mod snapshot;
pub mod status;
pub mod warnings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_log;

pub use checks::DefaultChecks;
pub use classify::{classify, NamespaceCategory};
pub use cluster::{CheckResult, ClientError, ClusterClient, ConditionPublisher, PodEvaluator};
pub use conditions::{ConditionSet, ConditionStatus, OperatorCondition, PodSecurityConditions};
pub use controller::{select_non_enforcing, ControllerError, PassReport, ReadinessController};
pub use detect::{Attribution, DetectError, Detector, EvaluationOutcome, InconclusiveReason};
pub use resolve::{resolve, ResolveError, ResolvedLevel};
pub use snapshot::{ClusterSnapshot, SnapshotCluster};
pub use status::{FileStatusPublisher, OperatorStatus};
pub use warnings::WarningSink;
