//! Logging configuration.
//!
//! Resolved from `PSR_LOG`, `PSR_LOG_FORMAT` and `PSR_LOG_TIMESTAMPS`, then
//! overridden by `-v`/`-q`/`--log-format`. Unparseable values are ignored.

use clap::ValueEnum;

pub const ENV_LOG_LEVEL: &str = "PSR_LOG";
pub const ENV_LOG_FORMAT: &str = "PSR_LOG_FORMAT";
pub const ENV_LOG_TIMESTAMPS: &str = "PSR_LOG_TIMESTAMPS";

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    #[value(alias = "json")]
    Jsonl,
}

/// Minimum level for the `psr_core` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    /// The directive name understood by `EnvFilter`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Prefix human output with timestamps. Off when a supervisor stamps
    /// the lines itself.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Build from the environment, then apply CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self::resolve(
            var(ENV_LOG_LEVEL).as_deref(),
            var(ENV_LOG_FORMAT).as_deref(),
            var(ENV_LOG_TIMESTAMPS).as_deref(),
        )
        .with_overrides(cli_level, cli_format)
    }

    fn resolve(level: Option<&str>, format: Option<&str>, timestamps: Option<&str>) -> Self {
        let defaults = LogConfig::default();
        LogConfig {
            level: level
                .and_then(|s| LogLevel::from_str(s, true).ok())
                .unwrap_or(defaults.level),
            format: format
                .and_then(|s| LogFormat::from_str(s, true).ok())
                .unwrap_or(defaults.format),
            timestamps: timestamps
                .map(|s| !matches!(s.trim(), "0" | "false" | "no"))
                .unwrap_or(defaults.timestamps),
        }
    }

    fn with_overrides(mut self, level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        self.level = level.unwrap_or(self.level);
        self.format = format.unwrap_or(self.format);
        self
    }
}
