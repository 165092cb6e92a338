//! Error types for the Keystone command-line tool.

use std::path::{Path, PathBuf};

use keystone_config::{ConfigErrors, LoadError};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Filesystem error while scaffolding.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// `init env` ran before an example file exists.
    #[error("example file not found: {path} (run `keystone init config` first)")]
    MissingExample {
        /// Expected example file path.
        path: PathBuf,
    },

    /// The environment file could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The configuration failed validation.
    #[error(transparent)]
    Invalid(#[from] ConfigErrors),

    /// The composed configuration could not be rendered.
    #[error("failed to render configuration as {format}: {reason}")]
    Render {
        /// Output format.
        format: &'static str,
        /// Serializer message.
        reason: String,
    },
}

impl CliError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a render error.
    pub fn render(format: &'static str, reason: impl ToString) -> Self {
        Self::Render {
            format,
            reason: reason.to_string(),
        }
    }

    /// Process exit code for this error.
    ///
    /// Invalid configuration exits with 1; usage and I/O problems with 2.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Invalid(_) => 1,
            Self::Io { .. } | Self::MissingExample { .. } | Self::Load(_) | Self::Render { .. } => 2,
        }
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
