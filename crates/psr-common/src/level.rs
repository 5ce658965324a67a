//! Pod Security Standards levels.
//!
//! The three levels form a total order by strictness:
//! `privileged < baseline < restricted`. The derived [`Ord`] follows the
//! declaration order, so `max` over a set of levels yields the strictest one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Policy version used when none is pinned.
pub const LATEST_VERSION: &str = "latest";

/// A level string that is not one of the three known levels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("must be one of privileged, baseline, restricted; got {0:?}")]
pub struct InvalidLevel(pub String);

/// Pod Security Standards level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Unrestricted.
    Privileged,
    /// Prevents known privilege escalations.
    Baseline,
    /// Hardened pod configuration.
    Restricted,
}

impl Level {
    /// All levels from least to most strict.
    pub fn all() -> &'static [Level] {
        &[Level::Privileged, Level::Baseline, Level::Restricted]
    }

    /// Label value for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Privileged => "privileged",
            Level::Baseline => "baseline",
            Level::Restricted => "restricted",
        }
    }

    /// Strictest level in `levels`, or `None` when empty.
    pub fn strictest<I>(levels: I) -> Option<Level>
    where
        I: IntoIterator<Item = Level>,
    {
        levels.into_iter().fold(None, |acc, level| match acc {
            Some(current) if current >= level => Some(current),
            _ => Some(level),
        })
    }
}

impl FromStr for Level {
    type Err = InvalidLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "privileged" => Ok(Level::Privileged),
            "baseline" => Ok(Level::Baseline),
            "restricted" => Ok(Level::Restricted),
            other => Err(InvalidLevel(other.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A level pinned to a policy version, e.g. `restricted:latest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelVersion {
    pub level: Level,
    pub version: String,
}

impl LevelVersion {
    pub fn new(level: Level, version: impl Into<String>) -> Self {
        Self {
            level,
            version: version.into(),
        }
    }

    /// The level evaluated against the latest policy version.
    pub fn latest(level: Level) -> Self {
        Self::new(level, LATEST_VERSION)
    }
}

impl fmt::Display for LevelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level, self.version)
    }
}
