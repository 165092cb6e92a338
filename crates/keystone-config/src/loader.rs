//! Configuration loader with layered raw input.
//!
//! This module provides the [`ConfigLoader`] for gathering raw input from
//! several sources before handing it to the [`Composer`].

use std::path::Path;

use crate::{Composer, ConfigErrors, LoadError, RawInput, Validated, ValidationResult};

/// Configuration loader with layered approach.
///
/// The loader stacks raw input in layers, with later layers overriding
/// earlier ones. The usual order is:
/// 1. Environment file (`.env`)
/// 2. Process environment
///
/// # Example
///
/// ```no_run
/// use keystone_config::ConfigLoader;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let validated = ConfigLoader::new()
///     .with_optional_env_file(".env")?
///     .with_process_env()
///     .load()?;
///
/// println!("Listening on {}", validated.config.server.bind_addr());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    input: RawInput,
    composer: Composer,
}

impl ConfigLoader {
    /// Create a loader with no input.
    ///
    /// # Example
    ///
    /// ```
    /// use keystone_config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::new();
    /// assert!(loader.raw().is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer a `KEY=VALUE` file.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the file does not exist or cannot be read.
    pub fn with_env_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, LoadError> {
        self.input.merge(RawInput::from_env_file(path)?);
        Ok(self)
    }

    /// Layer a `KEY=VALUE` file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the file exists but cannot be read.
    pub fn with_optional_env_file<P: AsRef<Path>>(self, path: P) -> Result<Self, LoadError> {
        if path.as_ref().exists() {
            self.with_env_file(path)
        } else {
            tracing::debug!(path = %path.as_ref().display(), "Optional environment file not found");
            Ok(self)
        }
    }

    /// Layer the current process environment.
    #[must_use]
    pub fn with_process_env(mut self) -> Self {
        self.input.merge(RawInput::from_process_env());
        self
    }

    /// Layer explicit key/value pairs.
    ///
    /// # Example
    ///
    /// ```
    /// use keystone_config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::new().with_vars([("PORT", "8080")]);
    /// assert_eq!(loader.raw().get("PORT"), Some("8080"));
    /// ```
    #[must_use]
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.input.merge(RawInput::from_pairs(vars));
        self
    }

    /// Change the prefix of pass-through keys (default `APP_`).
    #[must_use]
    pub fn with_custom_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.composer = self.composer.with_custom_prefix(prefix);
        self
    }

    /// The raw input gathered so far.
    pub fn raw(&self) -> &RawInput {
        &self.input
    }

    /// Run the pipeline over the gathered input.
    pub fn validate(&self) -> ValidationResult {
        self.composer.compose(&self.input)
    }

    /// Run the pipeline and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns every validation failure if the input is invalid.
    pub fn load(self) -> Result<Validated, ConfigErrors> {
        self.validate().into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_loader_with_vars() {
        let validated = ConfigLoader::new()
            .with_vars([("JWT_SECRET", SECRET), ("PORT", "8080")])
            .load()
            .unwrap();
        assert_eq!(validated.config.server.port, 8080);
    }

    #[test]
    fn test_loader_without_secret_fails() {
        let errors = ConfigLoader::new().load().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_later_layers_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "JWT_SECRET={SECRET}").unwrap();
        writeln!(file, "PORT=4000").unwrap();
        writeln!(file, "HOST=file-host").unwrap();

        let validated = ConfigLoader::new()
            .with_env_file(file.path())
            .unwrap()
            .with_vars([("PORT", "5000")])
            .load()
            .unwrap();

        assert_eq!(validated.config.server.port, 5000);
        assert_eq!(validated.config.server.host, "file-host");
    }

    #[test]
    fn test_loader_with_env_file_not_found() {
        let result = ConfigLoader::new().with_env_file("/nonexistent/.env");
        assert!(result.is_err());
    }

    #[test]
    fn test_loader_with_optional_env_file_not_found() {
        let loader = ConfigLoader::new()
            .with_optional_env_file("/nonexistent/.env")
            .unwrap();
        assert!(loader.raw().is_empty());
    }

    #[test]
    fn test_loader_custom_prefix() {
        let validated = ConfigLoader::new()
            .with_vars([("JWT_SECRET", SECRET), ("MYAPP_COLOR", "blue")])
            .with_custom_prefix("MYAPP_")
            .load()
            .unwrap();
        let custom = validated.config.custom.as_present().unwrap();
        assert_eq!(custom.get("MYAPP_COLOR").map(String::as_str), Some("blue"));
    }
}
