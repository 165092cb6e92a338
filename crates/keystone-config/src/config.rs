//! Composed configuration types.
//!
//! [`ComposedConfig`] is the nested, typed value handed to the rest of the
//! application. Mandatory sections are plain structs; optional ones are
//! wrapped in [`Section`] so every consumer must handle the absent case.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::{ConfigError, ConfigErrors};

/// Minimum length of the signing secret, in characters.
pub const MIN_SECRET_LENGTH: usize = 32;

/// An optional configuration section.
///
/// `Absent` means none of the section's signal fields were supplied; the
/// section is then left out entirely instead of being filled with defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Section<T> {
    /// The section was not configured.
    #[default]
    Absent,
    /// The section was configured.
    Present(T),
}

impl<T> Section<T> {
    /// Whether the section was configured.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Whether the section was left out.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Borrow the section's value.
    pub fn as_present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Convert into an `Option`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Map the section's value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Section<U> {
        match self {
            Self::Present(value) => Section::Present(f(value)),
            Self::Absent => Section::Absent,
        }
    }
}

impl<T> From<Option<T>> for Section<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

impl<T: Serialize> Serialize for Section<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Present(value) => serializer.serialize_some(value),
            Self::Absent => serializer.serialize_none(),
        }
    }
}

fn redact<S: Serializer>(_value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("[redacted]")
}

fn redact_option<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => serializer.serialize_some("[redacted]"),
        None => serializer.serialize_none(),
    }
}

fn redact_url_credentials<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(url) => serializer.serialize_some(&mask_url_credentials(url)),
        None => serializer.serialize_none(),
    }
}

/// Replace the userinfo of a connection URL (`user:pass@`) with `[redacted]`.
pub(crate) fn mask_url_credentials(url: &str) -> String {
    let authority_start = url.find("://").map_or(0, |i| i + 3);
    let authority_end = url[authority_start..]
        .find(['/', '?', '#'])
        .map_or(url.len(), |i| authority_start + i);
    match url[authority_start..authority_end].rfind('@') {
        Some(at) => format!(
            "{}[redacted]{}",
            &url[..authority_start],
            &url[authority_start + at..]
        ),
        None => url.to_string(),
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    Development,
    /// Production.
    Production,
    /// Automated tests.
    Test,
    /// Pre-production.
    Staging,
}

impl Environment {
    /// Parse an accepted `NODE_ENV` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "development" => Some(Self::Development),
            "production" => Some(Self::Production),
            "test" => Some(Self::Test),
            "staging" => Some(Self::Staging),
            _ => None,
        }
    }

    /// The `NODE_ENV` spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
            Self::Staging => "staging",
        }
    }

    /// Whether this environment serves real traffic.
    pub fn is_deployed(self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Unrecoverable failures only.
    Fatal,
    /// Errors.
    Error,
    /// Warnings.
    Warn,
    /// Informational messages.
    Info,
    /// Debug output.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Parse an accepted `LOG_LEVEL` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fatal" => Some(Self::Fatal),
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    /// The `LOG_LEVEL` spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Embedded file database; needs no connection details.
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// MySQL.
    Mysql,
    /// MongoDB.
    Mongodb,
}

impl DatabaseType {
    /// The zero-configuration backend.
    pub const DEFAULT: Self = Self::Sqlite;

    /// Parse an accepted `DATABASE_TYPE` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqlite" => Some(Self::Sqlite),
            "postgres" => Some(Self::Postgres),
            "mysql" => Some(Self::Mysql),
            "mongodb" => Some(Self::Mongodb),
            _ => None,
        }
    }

    /// The `DATABASE_TYPE` spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongodb => "mongodb",
        }
    }

    /// Whether this backend needs a URL or host and name.
    pub fn needs_connection_details(self) -> bool {
        self != Self::DEFAULT
    }
}

/// Token signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

impl SigningAlgorithm {
    /// Parse an accepted `JWT_ALGORITHM` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "HS256" => Some(Self::HS256),
            "HS384" => Some(Self::HS384),
            "HS512" => Some(Self::HS512),
            _ => None,
        }
    }
}

/// Outbound mail provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailService {
    /// Gmail.
    Gmail,
    /// SendGrid.
    Sendgrid,
    /// Mailgun.
    Mailgun,
    /// Amazon SES.
    Ses,
    /// Self-managed SMTP server; needs host and port.
    Custom,
}

impl MailService {
    /// Parse an accepted `MAIL_SERVICE` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gmail" => Some(Self::Gmail),
            "sendgrid" => Some(Self::Sendgrid),
            "mailgun" => Some(Self::Mailgun),
            "ses" => Some(Self::Ses),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSection {
    /// Listen port, 1 to 65535.
    pub port: u16,
    /// Listen host.
    pub host: String,
    /// Deployment environment.
    pub environment: Environment,
    /// Minimum log level.
    pub log_level: LogLevel,
    /// Request timeout in milliseconds.
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    /// Maximum request body size in bytes.
    pub body_limit: u64,
    /// Trust `X-Forwarded-*` headers.
    pub trust_proxy: bool,
}

impl ServerSection {
    /// `host:port`, suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Where the persistence layer should connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseTarget<'a> {
    /// Embedded backend with no explicit location.
    Embedded,
    /// Full connection URL.
    Url(&'a str),
    /// Host and logical database name.
    Host {
        /// Database host.
        host: &'a str,
        /// Database port, if set.
        port: Option<u16>,
        /// Logical database name.
        name: &'a str,
    },
}

/// Persistence settings.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSection {
    /// Backend.
    #[serde(rename = "type")]
    pub kind: DatabaseType,
    /// Full connection URL. Serialized with its credentials masked.
    #[serde(
        serialize_with = "redact_url_credentials",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    /// Host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// User.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password.
    #[serde(
        serialize_with = "redact_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,
    /// Logical database name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DatabaseSection {
    /// Resolve the connection target. A URL takes precedence over host fields.
    pub fn target(&self) -> DatabaseTarget<'_> {
        if let Some(url) = self.url.as_deref() {
            return DatabaseTarget::Url(url);
        }
        match (self.host.as_deref(), self.name.as_deref()) {
            (Some(host), Some(name)) => DatabaseTarget::Host {
                host,
                port: self.port,
                name,
            },
            _ => DatabaseTarget::Embedded,
        }
    }
}

impl fmt::Debug for DatabaseSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSection")
            .field("kind", &self.kind)
            .field("url", &self.url.as_deref().map(mask_url_credentials))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("name", &self.name)
            .finish()
    }
}

/// Token signing settings.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningSection {
    /// Signing secret, at least [`MIN_SECRET_LENGTH`] characters.
    #[serde(serialize_with = "redact")]
    pub secret: String,
    /// Token lifetime as written (e.g. `1h`).
    pub expires_in: String,
    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,
}

impl SigningSection {
    /// Token lifetime as a duration, if `expires_in` is well-formed.
    pub fn expires_in_duration(&self) -> Option<Duration> {
        humantime::parse_duration(&self.expires_in).ok()
    }
}

impl fmt::Debug for SigningSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSection")
            .field("secret", &"[redacted]")
            .field("expires_in", &self.expires_in)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Allowed cross-origin sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Reflect any origin (`true`) or disable cross-origin access (`false`).
    Boolean(bool),
    /// Explicit origins, in the order given.
    Origins(Vec<String>),
}

impl CorsOrigin {
    /// Parse a raw `CORS_ORIGIN` value.
    ///
    /// `"true"` and `"false"` become booleans; anything else is split on
    /// commas, trimmed, with empty entries dropped.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => Self::Boolean(true),
            "false" => Self::Boolean(false),
            _ => Self::Origins(split_list(raw)),
        }
    }
}

/// Cross-origin policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossOriginSection {
    /// Allowed origins.
    pub origin: CorsOrigin,
    /// Allow credentials.
    pub credentials: bool,
    /// Allowed methods.
    pub methods: Vec<String>,
}

/// Rate limiting and hardening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySection {
    /// Requests per window.
    pub rate_limit_max: u64,
    /// Window length in milliseconds.
    pub rate_limit_window_ms: u64,
    /// Send hardened security headers.
    pub helmet_enabled: bool,
}

impl SecuritySection {
    /// Rate-limit window.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }
}

/// Outbound mail transport.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMailSection {
    /// Provider.
    pub service: MailService,
    /// SMTP host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// SMTP port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Use implicit TLS.
    pub secure: bool,
    /// SMTP user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// SMTP password.
    #[serde(
        serialize_with = "redact_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,
    /// Sender address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl fmt::Debug for OutboundMailSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundMailSection")
            .field("service", &self.service)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("from", &self.from)
            .finish()
    }
}

/// The complete, validated configuration of a Keystone service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedConfig {
    /// HTTP server settings.
    pub server: ServerSection,
    /// Persistence settings.
    pub database: DatabaseSection,
    /// Token signing settings.
    pub signing: SigningSection,
    /// Cross-origin policy.
    #[serde(skip_serializing_if = "Section::is_absent")]
    pub cross_origin: Section<CrossOriginSection>,
    /// Rate limiting and hardening.
    #[serde(skip_serializing_if = "Section::is_absent")]
    pub security: Section<SecuritySection>,
    /// Outbound mail transport.
    #[serde(skip_serializing_if = "Section::is_absent")]
    pub outbound_mail: Section<OutboundMailSection>,
    /// Application-defined keys, passed through untyped.
    #[serde(skip_serializing_if = "Section::is_absent")]
    pub custom: Section<BTreeMap<String, String>>,
}

impl ComposedConfig {
    /// Check the assembled value against its shape rules.
    ///
    /// # Errors
    ///
    /// Returns every violated rule as [`ConfigError::InvalidValue`], keyed by
    /// the dotted path of the offending leaf.
    pub fn validate_shape(&self) -> Result<(), ConfigErrors> {
        let mut errors = ConfigErrors::new();

        if self.server.port == 0 {
            errors.push(ConfigError::invalid_value("server.port", "must be between 1 and 65535"));
        }
        if self.server.host.trim().is_empty() {
            errors.push(ConfigError::invalid_value("server.host", "must not be blank"));
        }
        if self.server.timeout_ms == 0 {
            errors.push(ConfigError::invalid_value("server.timeout", "must be positive"));
        }
        if self.server.body_limit == 0 {
            errors.push(ConfigError::invalid_value("server.bodyLimit", "must be positive"));
        }

        if let Err(e) = humantime::parse_duration(&self.signing.expires_in) {
            errors.push(ConfigError::invalid_value(
                "signing.expiresIn",
                format!("{:?} is not a duration: {e}", self.signing.expires_in),
            ));
        }

        if let Section::Present(cors) = &self.cross_origin {
            if matches!(&cors.origin, CorsOrigin::Origins(origins) if origins.is_empty()) {
                errors.push(ConfigError::invalid_value(
                    "crossOrigin.origin",
                    "must list at least one origin",
                ));
            }
            if cors.methods.is_empty() {
                errors.push(ConfigError::invalid_value(
                    "crossOrigin.methods",
                    "must list at least one method",
                ));
            }
        }

        if let Section::Present(security) = &self.security {
            if security.rate_limit_max == 0 {
                errors.push(ConfigError::invalid_value(
                    "security.rateLimitMax",
                    "must be positive",
                ));
            }
            if security.rate_limit_window_ms == 0 {
                errors.push(ConfigError::invalid_value(
                    "security.rateLimitWindowMs",
                    "must be positive",
                ));
            }
        }

        if let Section::Present(mail) = &self.outbound_mail {
            if let Some(from) = mail.from.as_deref() {
                if !from.contains('@') {
                    errors.push(ConfigError::invalid_value(
                        "outboundMail.from",
                        format!("{from:?} is not an email address"),
                    ));
                }
            }
        }

        errors.into_result()
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}
