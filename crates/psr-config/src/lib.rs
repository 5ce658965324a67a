//! Pod Security Readiness configuration loading and validation.
//!
//! This crate provides:
//! - The typed controller configuration (`config.json`)
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation
//! - Config snapshots for pass reports

pub mod controller;
pub mod load;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use controller::ControllerConfig;
pub use load::{load_config, ConfigError, LoadedConfig};
pub use resolve::{resolve_config_path, ConfigSource, ResolvedPath};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
