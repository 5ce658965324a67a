//! Configuration validation errors and semantic validation.

use crate::controller::{ControllerConfig, MAX_WORKERS};
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }

    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate controller configuration semantically.
pub fn validate_config(config: &ControllerConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.workers == 0 || config.workers > MAX_WORKERS {
        return Err(ValidationError::invalid(
            "workers",
            format!("must be between 1 and {}, got {}", MAX_WORKERS, config.workers),
        ));
    }

    if config.field_manager.trim().is_empty() {
        return Err(ValidationError::invalid("field_manager", "must not be empty"));
    }
    if config.field_manager.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid(
            "field_manager",
            "must not contain whitespace",
        ));
    }

    if !is_valid_policy_version(&config.pod_security_version) {
        return Err(ValidationError::invalid(
            "pod_security_version",
            format!(
                "expected \"latest\" or \"v1.<minor>\", got {:?}",
                config.pod_security_version
            ),
        ));
    }

    Ok(())
}

fn is_valid_policy_version(version: &str) -> bool {
    if version == "latest" {
        return true;
    }
    version
        .strip_prefix("v1.")
        .is_some_and(|minor| !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()))
}
