//! Structured event definitions for logging.
//!
//! Every event carries the run correlation ID, the host ID and the pass
//! stage it belongs to. Event names are stable and recorded in the `event`
//! field, so JSON log consumers can filter on them directly.

use serde::{Deserialize, Serialize};

/// Stages of a readiness pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup, configuration and snapshot loading.
    Init,
    /// Enforcement level resolution.
    Resolve,
    /// Dry-run enforcement.
    Simulate,
    /// Ownership attribution of violations.
    Attribute,
    /// Condition rendering.
    Aggregate,
    /// Writing conditions to the operator status.
    Publish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Resolve => "resolve",
            Stage::Simulate => "simulate",
            Stage::Attribute => "attribute",
            Stage::Aggregate => "aggregate",
            Stage::Publish => "publish",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Pass lifecycle
    pub const PASS_STARTED: &str = "pass.started";
    pub const PASS_FINISHED: &str = "pass.finished";

    // Namespace listing and selection
    pub const NAMESPACES_LISTED: &str = "resolve.namespaces_listed";
    pub const NAMESPACE_SKIPPED: &str = "resolve.namespace_skipped";

    // Per-namespace evaluation
    pub const NAMESPACE_EVALUATED: &str = "simulate.namespace_evaluated";
    pub const NAMESPACE_FAILED: &str = "simulate.namespace_failed";

    // Aggregation and publishing
    pub const CONDITIONS_RENDERED: &str = "aggregate.conditions_rendered";
    pub const CONDITIONS_PUBLISHED: &str = "publish.conditions_published";
    pub const PUBLISH_FAILED: &str = "publish.failed";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const SNAPSHOT_LOADED: &str = "snapshot.loaded";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation IDs shared by every event of one invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub host_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            host_id: host_id.into(),
        }
    }
}
