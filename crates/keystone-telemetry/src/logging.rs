//! Structured logging for Keystone.
//!
//! This module sets up a `tracing-subscriber` fmt layer with an env filter.
//! Deployed environments log JSON; everything else logs human-readable text.
//!
//! # Example
//!
//! ```rust,ignore
//! use keystone_telemetry::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::info!(key = "PORT", "Loaded configuration");
//! ```

use keystone_config::{LogLevel, ServerSection};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g. `"info"`, `"keystone_config=debug,warn"`).
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable output at debug level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            include_target: true,
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }

    /// Derive logging from the composed server section.
    ///
    /// Production and staging log JSON; development and test log pretty text.
    #[must_use]
    pub fn from_server(server: &ServerSection) -> Self {
        let base = if server.environment.is_deployed() {
            Self::production()
        } else {
            Self::development()
        };
        Self {
            level: filter_for(server.log_level).to_string(),
            ..base
        }
    }

    /// Replace the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

/// The `tracing` filter directive for a configured log level.
///
/// `tracing` has no fatal level; fatal maps to `error`.
pub fn filter_for(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Fatal | LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Initializes the global logging subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` for a bad filter directive and
/// `TelemetryError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the directive does not parse.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_config::{Composer, RawInput};

    fn server(pairs: &[(&str, &str)]) -> ServerSection {
        let mut input = RawInput::from_pairs([("JWT_SECRET", "s".repeat(32))]);
        for (key, value) in pairs {
            input.insert(*key, *value);
        }
        Composer::new()
            .compose(&input)
            .into_result()
            .unwrap()
            .config
            .server
    }

    #[test]
    fn test_presets() {
        let dev = LogConfig::development();
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(dev.file_line_info);
        assert_eq!(dev.level, "debug");

        let prod = LogConfig::production();
        assert_eq!(prod.format, LogFormat::Json);
        assert!(!prod.span_events);
        assert_eq!(prod.level, "info");
        assert_eq!(LogConfig::default(), prod);
    }

    #[test]
    fn test_from_server_development() {
        let config = LogConfig::from_server(&server(&[]));
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_from_server_production_with_fatal_level() {
        let config = LogConfig::from_server(&server(&[
            ("NODE_ENV", "production"),
            ("LOG_LEVEL", "fatal"),
        ]));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "error");
    }

    #[test]
    fn test_with_level() {
        let config = LogConfig::production().with_level("keystone_config=trace");
        assert_eq!(config.level, "keystone_config=trace");
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("keystone_cli=debug,warn").is_ok());
        assert!(matches!(
            create_env_filter("keystone=notalevel"),
            Err(TelemetryError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
