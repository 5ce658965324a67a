//! Error types for Pod Security Readiness.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Cluster Snapshot Error
//!   Reason: snapshot error: missing field `metadata` at line 4
//!   Fix: Re-export the snapshot with 'kubectl get ns,pods -A -o json'.
//! ```

use crate::level::InvalidLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Pod Security Readiness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Controller configuration errors.
    Config,
    /// Level resolution errors.
    Resolution,
    /// Failures talking to the cluster or its stand-in.
    Cluster,
    /// Engine invariants broken during evaluation.
    Evaluation,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Resolution => write!(f, "resolution"),
            ErrorCategory::Cluster => write!(f, "cluster"),
            ErrorCategory::Evaluation => write!(f, "evaluation"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Pod Security Readiness.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Resolution errors (20-29)
    #[error("invalid level: {0}")]
    InvalidLevel(#[from] InvalidLevel),

    // Cluster errors (30-39)
    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("cluster request failed: {0}")]
    Cluster(String),

    // Evaluation errors (40-49)
    #[error("internal evaluation error: {0}")]
    Internal(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Resolution errors
    /// - 30-39: Cluster errors
    /// - 40-49: Evaluation errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidLevel(_) => 20,
            Error::Snapshot(_) => 30,
            Error::Cluster(_) => 31,
            Error::Internal(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::InvalidLevel(_) => ErrorCategory::Resolution,
            Error::Snapshot(_) | Error::Cluster(_) => ErrorCategory::Cluster,
            Error::Internal(_) => ErrorCategory::Evaluation,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by retrying the
    /// pass or fixing input.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidLevel(_) => true,
            Error::Snapshot(_) => true,
            Error::Cluster(_) => true, // transient
            Error::Internal(_) => false,
            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'psr-core check' to validate configuration, or check syntax in config.json."
            }
            Error::InvalidLevel(_) => {
                "Use one of privileged, baseline, restricted for Pod Security labels and annotations."
            }
            Error::Snapshot(_) => {
                "Re-export the snapshot with 'kubectl get ns,pods -A -o json' and check it is valid JSON."
            }
            Error::Cluster(_) => "Retry the pass. If persistent, check API server connectivity.",
            Error::Internal(_) => "This is a bug. Report it with the namespace and its labels.",
            Error::Io(_) => "Check that the file exists and is readable, then retry.",
            Error::Json(_) => "Invalid JSON in file. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidLevel(_) => "Invalid Pod Security Level",
            Error::Snapshot(_) => "Cluster Snapshot Error",
            Error::Cluster(_) => "Cluster Request Failed",
            Error::Internal(_) => "Internal Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }

    /// Format the error for a terminal.
    pub fn format_human(&self) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            self.headline(),
            self,
            self.remediation()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_grouped_by_category() {
        let cases = [
            (Error::Config("x".into()), ErrorCategory::Config, 10),
            (
                Error::InvalidLevel(InvalidLevel("strict".into())),
                ErrorCategory::Resolution,
                20,
            ),
            (Error::Snapshot("x".into()), ErrorCategory::Cluster, 30),
            (Error::Cluster("x".into()), ErrorCategory::Cluster, 31),
            (Error::Internal("x".into()), ErrorCategory::Evaluation, 40),
        ];

        for (err, category, code) in cases {
            assert_eq!(err.category(), category);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_internal_is_not_recoverable() {
        assert!(!Error::Internal("bad".into()).is_recoverable());
        assert!(Error::Cluster("timeout".into()).is_recoverable());
    }

    #[test]
    fn test_format_human() {
        let err = Error::Snapshot("missing field `metadata`".into());
        let text = err.format_human();
        assert!(text.starts_with("✗ Cluster Snapshot Error"));
        assert!(text.contains("Reason: snapshot error: missing field `metadata`"));
        assert!(text.contains("Fix: "));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Io);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Cluster.to_string(), "cluster");
        assert_eq!(ErrorCategory::Evaluation.to_string(), "evaluation");
    }
}
