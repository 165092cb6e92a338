//! Structured logging for Keystone services.
//!
//! Logging is driven by the composed configuration: the `server` section's
//! environment picks the output format and its log level picks the filter.
//!
//! ```rust,ignore
//! use keystone_telemetry::{init_logging, LogConfig};
//!
//! let config = keystone_config::ConfigLoader::new().with_process_env().load()?;
//! init_logging(&LogConfig::from_server(&config.config.server))?;
//!
//! tracing::info!(port = config.config.server.port, "Starting server");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
