//! Loading the controller configuration from disk.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::resolve::{resolve_config_path, ResolvedPath};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_config, ValidationError};
use crate::ControllerConfig;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A validated configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ControllerConfig,
    pub resolved: ResolvedPath,
    pub snapshot: ConfigSnapshot,
}

/// Resolve, read, parse and validate the controller configuration.
///
/// Falls back to built-in defaults when no config file is found.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let resolved = resolve_config_path(cli_path);

    let (config, raw) = match &resolved.path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
                path: path.clone(),
                source,
            })?;
            let config = parse_config(path, &raw)?;
            (config, Some(raw))
        }
        None => (ControllerConfig::default(), None),
    };

    validate_config(&config)?;
    let snapshot = ConfigSnapshot::new(&config, &resolved, raw.as_deref());

    Ok(LoadedConfig {
        config,
        resolved,
        snapshot,
    })
}

fn parse_config(path: &Path, raw: &str) -> Result<ControllerConfig, ConfigError> {
    serde_json::from_str(raw).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}
