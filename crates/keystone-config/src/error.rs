//! Configuration error types.
//!
//! Field-level and cross-field failures are values of [`ConfigError`]. A
//! validation pass never stops at the first failure; everything it finds is
//! collected into a [`ConfigErrors`] list, in the order it was discovered.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A single configuration validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field has no value and no default.
    #[error("missing required configuration field: {field}")]
    MissingRequiredField {
        /// The missing field name.
        field: String,
    },

    /// A numeric field does not hold a base-10 integer.
    #[error("invalid numeric value for {field}: {value:?} is not a base-10 integer")]
    InvalidNumericFormat {
        /// The field with the invalid value.
        field: String,
        /// The raw value as supplied.
        value: String,
    },

    /// A numeric field is outside its declared bounds.
    #[error("value for {field} is out of range: {value} (expected {})", describe_range(.min, .max))]
    ValueOutOfRange {
        /// The field with the invalid value.
        field: String,
        /// The parsed value.
        value: i64,
        /// Inclusive lower bound, if any.
        min: Option<i64>,
        /// Inclusive upper bound, if any.
        max: Option<i64>,
    },

    /// An enumerated field holds a value outside its accepted set.
    #[error("invalid value for {field}: {value:?} (expected one of: {})", .allowed.join(", "))]
    InvalidEnumValue {
        /// The field with the invalid value.
        field: String,
        /// The raw value as supplied.
        value: String,
        /// Every accepted value, in declaration order.
        allowed: Vec<String>,
    },

    /// A composed value failed the shape-level check.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the offending leaf (e.g. `server.host`).
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },

    /// The signing secret is too short to be safe.
    #[error(
        "weak signing secret: {field} must be at least {min_length} characters (got {actual_length})"
    )]
    WeakSigningSecret {
        /// The secret's field name.
        field: String,
        /// Minimum accepted length.
        min_length: usize,
        /// Length of the supplied secret.
        actual_length: usize,
    },

    /// A non-default database backend lacks connection details.
    #[error("incomplete database configuration: {reason} (fields: {})", .fields.join(", "))]
    IncompleteDatabaseConfig {
        /// Fields taking part in the check.
        fields: Vec<String>,
        /// What is missing.
        reason: String,
    },

    /// The custom mail transport lacks a host or port.
    #[error("incomplete mail configuration: {reason} (fields: {})", .fields.join(", "))]
    IncompleteMailConfig {
        /// Fields taking part in the check.
        fields: Vec<String>,
        /// What is missing.
        reason: String,
    },

    /// A failure not attributable to a single field, such as a malformed schema.
    #[error("configuration validation failed: {0}")]
    UnknownValidationError(String),
}

/// Discriminant of a [`ConfigError`], handy for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigErrorKind {
    /// See [`ConfigError::MissingRequiredField`].
    MissingRequiredField,
    /// See [`ConfigError::InvalidNumericFormat`].
    InvalidNumericFormat,
    /// See [`ConfigError::ValueOutOfRange`].
    ValueOutOfRange,
    /// See [`ConfigError::InvalidEnumValue`].
    InvalidEnumValue,
    /// See [`ConfigError::InvalidValue`].
    InvalidValue,
    /// See [`ConfigError::WeakSigningSecret`].
    WeakSigningSecret,
    /// See [`ConfigError::IncompleteDatabaseConfig`].
    IncompleteDatabaseConfig,
    /// See [`ConfigError::IncompleteMailConfig`].
    IncompleteMailConfig,
    /// See [`ConfigError::UnknownValidationError`].
    UnknownValidationError,
}

fn describe_range(min: &Option<i64>, max: &Option<i64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("between {min} and {max}"),
        (Some(min), None) => format!("at least {min}"),
        (None, Some(max)) => format!("at most {max}"),
        (None, None) => "any integer".to_string(),
    }
}

impl ConfigError {
    /// Create a new missing required field error.
    pub fn missing_required(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Create a new invalid numeric format error.
    pub fn invalid_numeric(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidNumericFormat {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a new out-of-range error.
    pub fn out_of_range(
        field: impl Into<String>,
        value: i64,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Self {
        Self::ValueOutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// Create a new invalid enum value error.
    pub fn invalid_enum(
        field: impl Into<String>,
        value: impl Into<String>,
        allowed: &[&str],
    ) -> Self {
        Self::InvalidEnumValue {
            field: field.into(),
            value: value.into(),
            allowed: allowed.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new weak signing secret error.
    pub fn weak_secret(field: impl Into<String>, min_length: usize, actual_length: usize) -> Self {
        Self::WeakSigningSecret {
            field: field.into(),
            min_length,
            actual_length,
        }
    }

    /// Create a new incomplete database configuration error.
    pub fn incomplete_database(fields: &[&str], reason: impl Into<String>) -> Self {
        Self::IncompleteDatabaseConfig {
            fields: fields.iter().map(ToString::to_string).collect(),
            reason: reason.into(),
        }
    }

    /// Create a new incomplete mail configuration error.
    pub fn incomplete_mail(fields: &[&str], reason: impl Into<String>) -> Self {
        Self::IncompleteMailConfig {
            fields: fields.iter().map(ToString::to_string).collect(),
            reason: reason.into(),
        }
    }

    /// Create a new catch-all validation error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::UnknownValidationError(message.into())
    }

    /// Returns the error's discriminant.
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            Self::MissingRequiredField { .. } => ConfigErrorKind::MissingRequiredField,
            Self::InvalidNumericFormat { .. } => ConfigErrorKind::InvalidNumericFormat,
            Self::ValueOutOfRange { .. } => ConfigErrorKind::ValueOutOfRange,
            Self::InvalidEnumValue { .. } => ConfigErrorKind::InvalidEnumValue,
            Self::InvalidValue { .. } => ConfigErrorKind::InvalidValue,
            Self::WeakSigningSecret { .. } => ConfigErrorKind::WeakSigningSecret,
            Self::IncompleteDatabaseConfig { .. } => ConfigErrorKind::IncompleteDatabaseConfig,
            Self::IncompleteMailConfig { .. } => ConfigErrorKind::IncompleteMailConfig,
            Self::UnknownValidationError(_) => ConfigErrorKind::UnknownValidationError,
        }
    }

    /// Name of the cross-field invariant this error reports, if it is one.
    pub fn invariant(&self) -> Option<&'static str> {
        match self {
            Self::WeakSigningSecret { .. } => Some("signing_secret_length"),
            Self::IncompleteDatabaseConfig { .. } => Some("database_connection"),
            Self::IncompleteMailConfig { .. } => Some("mail_transport"),
            _ => None,
        }
    }

    /// Every field this error refers to. Empty for schema-level failures.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::MissingRequiredField { field }
            | Self::InvalidNumericFormat { field, .. }
            | Self::ValueOutOfRange { field, .. }
            | Self::InvalidEnumValue { field, .. }
            | Self::InvalidValue { field, .. }
            | Self::WeakSigningSecret { field, .. } => vec![field.as_str()],
            Self::IncompleteDatabaseConfig { fields, .. }
            | Self::IncompleteMailConfig { fields, .. } => {
                fields.iter().map(String::as_str).collect()
            }
            Self::UnknownValidationError(_) => Vec::new(),
        }
    }
}

/// An ordered, aggregated list of validation failures.
///
/// Produced whenever a validation pass finds at least one problem. The
/// `Display` output lists every error so an operator can fix them all at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigErrors(Vec<ConfigError>);

impl ConfigErrors {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an error.
    pub fn push(&mut self, error: ConfigError) {
        self.0.push(error);
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no error was collected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the errors in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigError> {
        self.0.iter()
    }

    /// Whether any collected error has the given kind.
    pub fn contains_kind(&self, kind: ConfigErrorKind) -> bool {
        self.0.iter().any(|e| e.kind() == kind)
    }

    /// The first error concerning `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&ConfigError> {
        self.0.iter().find(|e| e.fields().contains(&field))
    }

    /// Consume the list.
    pub fn into_vec(self) -> Vec<ConfigError> {
        self.0
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.0.len() == 1 { "error" } else { "errors" };
        write!(f, "invalid configuration ({} {noun}):", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        Self(vec![error])
    }
}

impl From<Vec<ConfigError>> for ConfigErrors {
    fn from(errors: Vec<ConfigError>) -> Self {
        Self(errors)
    }
}

impl Extend<ConfigError> for ConfigErrors {
    fn extend<T: IntoIterator<Item = ConfigError>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConfigErrors {
    type Item = &'a ConfigError;
    type IntoIter = std::slice::Iter<'a, ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors raised while reading raw input from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Environment file not found.
    #[error("environment file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read an environment file.
    #[error("failed to read environment file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }
}
