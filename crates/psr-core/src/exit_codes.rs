//! Exit codes for the psr-core CLI.
//!
//! Automation reads the outcome of a pass from the exit code alone.
//!
//! Ranges:
//! - 0-3: pass outcomes
//! - 10-19: user or environment errors
//! - 20-29: internal errors

use crate::controller::PassReport;

/// Stable process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every evaluated namespace is ready for enforcement.
    Clean = 0,

    /// At least one namespace would violate enforcement.
    ViolationsDetected = 1,

    /// No violations, but some namespaces could not be decided.
    Inconclusive = 2,

    /// Some namespaces failed to evaluate.
    PartialFail = 3,

    /// Invalid arguments.
    ArgsError = 10,

    /// Configuration missing, unparseable or invalid.
    ConfigError = 11,

    /// Internal error (bug - please report).
    InternalError = 20,

    /// I/O error, including unreadable snapshots and status files.
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Exit code for a completed pass. Failures outrank violations, which
    /// outrank inconclusive namespaces.
    pub fn for_report(report: &PassReport) -> Self {
        if report.has_failures() {
            ExitCode::PartialFail
        } else if report.violating > 0 {
            ExitCode::ViolationsDetected
        } else if report.inconclusive > 0 {
            ExitCode::Inconclusive
        } else {
            ExitCode::Clean
        }
    }

    /// Outcome codes (0-9) are not errors.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Name used in JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ViolationsDetected => "OK_VIOLATIONS",
            ExitCode::Inconclusive => "OK_INCONCLUSIVE",
            ExitCode::PartialFail => "ERR_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&psr_common::Error> for ExitCode {
    fn from(err: &psr_common::Error) -> Self {
        use psr_common::ErrorCategory;
        match err.category() {
            ErrorCategory::Config | ErrorCategory::Resolution => ExitCode::ConfigError,
            ErrorCategory::Io | ErrorCategory::Cluster => ExitCode::IoError,
            ErrorCategory::Evaluation => ExitCode::InternalError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::PodSecurityConditions;
    use crate::controller::NamespaceFailure;
    use crate::classify::NamespaceCategory;

    fn report(violating: usize, inconclusive: usize, failed: bool) -> PassReport {
        PassReport {
            run_id: "run-test".to_string(),
            listed: 3,
            skipped_enforcing: 0,
            evaluated: 3,
            violating,
            inconclusive,
            failures: if failed {
                vec![NamespaceFailure {
                    namespace: "a".to_string(),
                    category: NamespaceCategory::Customer,
                    error: "timeout".to_string(),
                }]
            } else {
                Vec::new()
            },
            detections: Vec::new(),
            conditions: PodSecurityConditions::new().render(),
        }
    }

    #[test]
    fn test_for_report_precedence() {
        assert_eq!(ExitCode::for_report(&report(0, 0, false)), ExitCode::Clean);
        assert_eq!(ExitCode::for_report(&report(0, 1, false)), ExitCode::Inconclusive);
        assert_eq!(ExitCode::for_report(&report(1, 1, false)), ExitCode::ViolationsDetected);
        assert_eq!(ExitCode::for_report(&report(1, 1, true)), ExitCode::PartialFail);
    }

    #[test]
    fn test_ranges() {
        assert!(ExitCode::ViolationsDetected.is_operational());
        assert!(ExitCode::ConfigError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(!ExitCode::Clean.is_user_error());
    }

    #[test]
    fn test_from_common_error() {
        let err = psr_common::Error::Snapshot("bad".to_string());
        assert_eq!(ExitCode::from(&err), ExitCode::IoError);
        let err = psr_common::Error::Config("bad".to_string());
        assert_eq!(ExitCode::from(&err), ExitCode::ConfigError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::Inconclusive.to_string(), "OK_INCONCLUSIVE (2)");
    }
}
