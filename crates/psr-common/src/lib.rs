//! Pod Security Readiness common types and errors.
//!
//! This crate provides foundational types shared across psr-core modules:
//! - Pod Security levels and their strictness ordering
//! - Well-known label and annotation keys
//! - Namespace and pod records as seen by the readiness engine
//! - Common error types
//! - Output format specifications

pub mod error;
pub mod labels;
pub mod level;
pub mod output;
pub mod record;

pub use error::{Error, ErrorCategory, Result};
pub use level::{InvalidLevel, Level, LevelVersion};
pub use output::OutputFormat;
pub use record::{NamespaceRecord, ObjectMeta, PodRecord, PodSpec};
