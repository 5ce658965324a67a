//! Configuration snapshots for pass reports.
//!
//! A snapshot records which configuration a pass ran with, so a report can
//! be tied back to the exact file that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ResolvedPath;
use crate::ControllerConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path where the config was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// SHA-256 of the config file content (None for built-in defaults).
    #[serde(default)]
    pub config_hash: Option<String>,

    pub workers: usize,
    pub field_manager: String,
    pub attribute_user_workloads: bool,
    pub pod_security_version: String,
}

impl ConfigSnapshot {
    pub fn new(config: &ControllerConfig, resolved: &ResolvedPath, raw: Option<&str>) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_path: resolved
                .path
                .as_ref()
                .map(|p| p.display().to_string()),
            config_source: resolved.source.to_string(),
            config_hash: raw.map(hash_content),
            workers: config.workers,
            field_manager: config.field_manager.clone(),
            attribute_user_workloads: config.attribute_user_workloads,
            pod_security_version: config.pod_security_version.clone(),
        }
    }
}

/// Hex SHA-256 of `content`.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ConfigSource;
    use std::path::PathBuf;

    #[test]
    fn test_snapshot_of_defaults() {
        let snapshot = ConfigSnapshot::new(&ControllerConfig::default(), &ResolvedPath::default(), None);
        assert_eq!(snapshot.config_source, "builtin default");
        assert!(snapshot.config_path.is_none());
        assert!(snapshot.config_hash.is_none());
        assert_eq!(snapshot.workers, 1);
    }

    #[test]
    fn test_snapshot_hashes_content() {
        let resolved = ResolvedPath {
            path: Some(PathBuf::from("/etc/pod-security-readiness/config.json")),
            source: ConfigSource::SystemConfig,
        };
        let raw = r#"{"schema_version": "1.0.0"}"#;
        let snapshot = ConfigSnapshot::new(&ControllerConfig::default(), &resolved, Some(raw));

        assert_eq!(snapshot.config_source, "system config");
        assert_eq!(snapshot.config_hash.as_deref(), Some(hash_content(raw).as_str()));
        assert_eq!(snapshot.config_hash.as_ref().map(String::len), Some(64));
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_content("abc"), hash_content("abc"));
        assert_ne!(hash_content("abc"), hash_content("abd"));
    }
}
