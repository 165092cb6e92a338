//! Keystone command-line tool.
//!
//! The `keystone` binary wraps the configuration pipeline for operators:
//!
//! - `keystone check` loads `.env` and the process environment, validates
//!   them, and prints the composed configuration or every error found.
//! - `keystone init <config|env|scripts|api|all>` scaffolds a project.
//! - `keystone example` prints the documented `.env.example`.
//!
//! # Example Usage
//!
//! ```bash
//! $ keystone init all
//! [1/7] Create config directory ... created
//! ...
//! $ keystone check --format toml
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod check;
pub mod error;
pub mod scaffold;

pub use check::{CheckOptions, OutputFormat};
pub use error::{CliError, CliResult};
pub use scaffold::{Scaffolder, StepOutcome, Target};

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "keystone_cli=info,keystone_config=warn,warn";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(keystone_telemetry::create_env_filter(DEFAULT_LOG_FILTER).is_ok());
    }
}
