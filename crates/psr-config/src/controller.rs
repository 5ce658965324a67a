//! Controller configuration types.

use serde::{Deserialize, Serialize};

/// Field manager used for dry-run applies when none is configured.
pub const DEFAULT_FIELD_MANAGER: &str = "pod-security-readiness-controller";

/// Upper bound on concurrent namespace evaluations.
pub const MAX_WORKERS: usize = 64;

/// Readiness controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub schema_version: String,

    /// Number of namespaces evaluated concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Field manager sent with every dry-run apply.
    #[serde(default = "default_field_manager")]
    pub field_manager: String,

    /// Whether violating customer namespaces are scanned for user-owned pods.
    #[serde(default = "default_true")]
    pub attribute_user_workloads: bool,

    /// Pod Security policy version (`latest` or `v1.<minor>`) carried on the
    /// simulated enforce level and in dry-run warnings. The built-in checks
    /// are the same for every version, so pinning a minor does not change
    /// which pods violate.
    #[serde(default = "default_pod_security_version")]
    pub pod_security_version: String,

    #[serde(default)]
    pub notes: Option<String>,
}

fn default_workers() -> usize {
    1
}

fn default_field_manager() -> String {
    DEFAULT_FIELD_MANAGER.to_string()
}

fn default_true() -> bool {
    true
}

fn default_pod_security_version() -> String {
    "latest".to_string()
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            workers: default_workers(),
            field_manager: default_field_manager(),
            attribute_user_workloads: default_true(),
            pod_security_version: default_pod_security_version(),
            notes: None,
        }
    }
}

impl ControllerConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_user_attribution(mut self, enabled: bool) -> Self {
        self.attribute_user_workloads = enabled;
        self
    }
}
