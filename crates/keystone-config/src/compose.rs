//! Configuration composition.
//!
//! The [`Composer`] turns a [`RawInput`] into a [`ValidationResult`]:
//!
//! 1. schema self-check
//! 2. per-field coercion ([`Schema::validate_partial`])
//! 3. cross-field invariants, each evaluated independently
//! 4. grouping into sections, with optional sections gated on signal fields
//! 5. shape-level check of the assembled value
//!
//! Failures from every step are collected in order; any failure means no
//! configuration is produced at all.

use std::collections::BTreeMap;

use crate::config::{
    split_list, ComposedConfig, CorsOrigin, CrossOriginSection, DatabaseSection, DatabaseType,
    Environment, LogLevel, MailService, OutboundMailSection, SecuritySection, Section,
    ServerSection, SigningAlgorithm, SigningSection, MIN_SECRET_LENGTH,
};
use crate::schema::keys;
use crate::{ConfigError, ConfigErrors, RawInput, Schema, ValidatedFields};

/// Default prefix of application-defined pass-through keys.
pub const DEFAULT_CUSTOM_PREFIX: &str = "APP_";

/// Signal fields of the cross-origin section.
pub const CROSS_ORIGIN_SIGNALS: &[&str] = &[keys::CORS_ORIGIN];
/// Signal fields of the security section.
pub const SECURITY_SIGNALS: &[&str] = &[
    keys::RATE_LIMIT_MAX,
    keys::RATE_LIMIT_WINDOW_MS,
    keys::HELMET_ENABLED,
];
/// Signal fields of the outbound mail section.
pub const OUTBOUND_MAIL_SIGNALS: &[&str] = &[keys::MAIL_SERVICE, keys::MAIL_HOST];

/// A successfully composed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    /// The nested configuration.
    pub config: ComposedConfig,
    /// The flat typed fields it was built from.
    pub fields: ValidatedFields,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Every check passed.
    Valid(Validated),
    /// At least one check failed; nothing was composed.
    Invalid(ConfigErrors),
}

impl ValidationResult {
    /// Whether the run succeeded.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The collected errors, if the run failed.
    pub fn errors(&self) -> Option<&ConfigErrors> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(errors) => Some(errors),
        }
    }

    /// The composed configuration, if the run succeeded.
    pub fn config(&self) -> Option<&ComposedConfig> {
        match self {
            Self::Valid(validated) => Some(&validated.config),
            Self::Invalid(_) => None,
        }
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<Validated, ConfigErrors> {
        match self {
            Self::Valid(validated) => Ok(validated),
            Self::Invalid(errors) => Err(errors),
        }
    }
}

/// Builds a [`ComposedConfig`] from raw input.
///
/// A composer holds only immutable data and may be shared across threads.
///
/// # Example
///
/// ```
/// use keystone_config::{Composer, RawInput};
///
/// let input = RawInput::from_pairs([("JWT_SECRET", "0123456789abcdef0123456789abcdef")]);
/// let validated = Composer::new().compose(&input).into_result().unwrap();
///
/// assert_eq!(validated.config.server.port, 3000);
/// assert!(validated.config.cross_origin.is_absent());
/// ```
#[derive(Debug, Clone)]
pub struct Composer {
    schema: Schema,
    custom_prefix: String,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    /// A composer over the standard schema.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: Schema::standard(),
            custom_prefix: DEFAULT_CUSTOM_PREFIX.to_string(),
        }
    }

    /// Change the prefix of pass-through keys.
    #[must_use]
    pub fn with_custom_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.custom_prefix = prefix.into();
        self
    }

    /// The schema in use.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The prefix of pass-through keys.
    pub fn custom_prefix(&self) -> &str {
        &self.custom_prefix
    }

    /// Run the whole pipeline over `input`.
    pub fn compose(&self, input: &RawInput) -> ValidationResult {
        if let Err(errors) = self.schema.check() {
            return ValidationResult::Invalid(errors);
        }

        let (fields, mut errors) = self.schema.validate_partial(input);
        errors.extend(check_invariants(&fields, input));

        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "Configuration rejected");
            return ValidationResult::Invalid(errors);
        }

        let config = match self.assemble(&fields, input) {
            Ok(config) => config,
            Err(errors) => return ValidationResult::Invalid(errors),
        };

        if let Err(errors) = config.validate_shape() {
            tracing::debug!(errors = errors.len(), "Composed configuration failed shape check");
            return ValidationResult::Invalid(errors);
        }

        tracing::debug!(
            environment = %config.server.environment,
            cross_origin = config.cross_origin.is_present(),
            security = config.security.is_present(),
            outbound_mail = config.outbound_mail.is_present(),
            "Configuration composed"
        );

        ValidationResult::Valid(Validated { config, fields })
    }

    /// Compose again from fresh input.
    ///
    /// The pipeline keeps no state between runs, so identical input always
    /// yields an identical configuration.
    pub fn reload(&self, input: &RawInput) -> ValidationResult {
        tracing::debug!(keys = input.len(), "Reloading configuration");
        self.compose(input)
    }

    fn assemble(
        &self,
        fields: &ValidatedFields,
        input: &RawInput,
    ) -> Result<ComposedConfig, ConfigErrors> {
        let mut reader = FieldReader {
            fields,
            errors: ConfigErrors::new(),
        };

        let server = ServerSection {
            port: reader.port(keys::PORT),
            host: reader.string(keys::HOST),
            environment: reader
                .enumerated(keys::NODE_ENV, Environment::from_name)
                .unwrap_or(Environment::Development),
            log_level: reader
                .enumerated(keys::LOG_LEVEL, LogLevel::from_name)
                .unwrap_or(LogLevel::Info),
            timeout_ms: reader.unsigned(keys::REQUEST_TIMEOUT),
            body_limit: reader.unsigned(keys::BODY_LIMIT),
            trust_proxy: reader.boolean(keys::TRUST_PROXY),
        };

        let database = DatabaseSection {
            kind: reader
                .enumerated(keys::DATABASE_TYPE, DatabaseType::from_name)
                .unwrap_or(DatabaseType::DEFAULT),
            url: reader.optional_string(keys::DATABASE_URL),
            host: reader.optional_string(keys::DATABASE_HOST),
            port: reader.optional_port(keys::DATABASE_PORT),
            username: reader.optional_string(keys::DATABASE_USERNAME),
            password: reader.optional_string(keys::DATABASE_PASSWORD),
            name: reader.optional_string(keys::DATABASE_NAME),
        };

        let signing = SigningSection {
            secret: reader.string(keys::JWT_SECRET),
            expires_in: reader.string(keys::JWT_EXPIRES_IN),
            algorithm: reader
                .enumerated(keys::JWT_ALGORITHM, SigningAlgorithm::from_name)
                .unwrap_or(SigningAlgorithm::HS256),
        };

        let cross_origin = if is_signalled(input, CROSS_ORIGIN_SIGNALS) {
            Section::Present(CrossOriginSection {
                origin: CorsOrigin::parse(&reader.string(keys::CORS_ORIGIN)),
                credentials: reader.boolean(keys::CORS_CREDENTIALS),
                methods: split_list(&reader.string(keys::CORS_METHODS)),
            })
        } else {
            Section::Absent
        };

        let security = if is_signalled(input, SECURITY_SIGNALS) {
            Section::Present(SecuritySection {
                rate_limit_max: reader.unsigned(keys::RATE_LIMIT_MAX),
                rate_limit_window_ms: reader.unsigned(keys::RATE_LIMIT_WINDOW_MS),
                helmet_enabled: reader.boolean(keys::HELMET_ENABLED),
            })
        } else {
            Section::Absent
        };

        let outbound_mail = if is_signalled(input, OUTBOUND_MAIL_SIGNALS) {
            Section::Present(OutboundMailSection {
                service: mail_service(fields).unwrap_or(MailService::Custom),
                host: reader.optional_string(keys::MAIL_HOST),
                port: reader.optional_port(keys::MAIL_PORT),
                secure: reader.boolean(keys::MAIL_SECURE),
                user: reader.optional_string(keys::MAIL_USER),
                password: reader.optional_string(keys::MAIL_PASSWORD),
                from: reader.optional_string(keys::MAIL_FROM),
            })
        } else {
            Section::Absent
        };

        let custom: BTreeMap<String, String> = input
            .with_prefix(&self.custom_prefix)
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        let custom = if custom.is_empty() {
            Section::Absent
        } else {
            Section::Present(custom)
        };

        reader.errors.into_result()?;

        Ok(ComposedConfig {
            server,
            database,
            signing,
            cross_origin,
            security,
            outbound_mail,
            custom,
        })
    }
}

fn is_signalled(input: &RawInput, signals: &[&str]) -> bool {
    signals.iter().any(|key| input.is_signalled(key))
}

/// The effective mail service: the selector if set, otherwise `None`.
fn mail_service(fields: &ValidatedFields) -> Option<MailService> {
    fields
        .string(keys::MAIL_SERVICE)
        .and_then(MailService::from_name)
}

/// Evaluate every cross-field invariant against the fields that coerced.
///
/// An invariant whose inputs failed coercion is skipped; the coercion error
/// already describes the problem.
fn check_invariants(fields: &ValidatedFields, input: &RawInput) -> ConfigErrors {
    let mut errors = ConfigErrors::new();

    if let Some(secret) = fields.string(keys::JWT_SECRET) {
        let length = secret.chars().count();
        if length < MIN_SECRET_LENGTH {
            errors.push(ConfigError::weak_secret(keys::JWT_SECRET, MIN_SECRET_LENGTH, length));
        }
    }

    if let Some(kind) = fields
        .string(keys::DATABASE_TYPE)
        .and_then(DatabaseType::from_name)
    {
        let has_url = fields.contains(keys::DATABASE_URL);
        let has_host_and_name =
            fields.contains(keys::DATABASE_HOST) && fields.contains(keys::DATABASE_NAME);
        if kind.needs_connection_details() && !has_url && !has_host_and_name {
            errors.push(ConfigError::incomplete_database(
                &[
                    keys::DATABASE_TYPE,
                    keys::DATABASE_URL,
                    keys::DATABASE_HOST,
                    keys::DATABASE_NAME,
                ],
                format!(
                    "{} requires DATABASE_URL or both DATABASE_HOST and DATABASE_NAME",
                    kind.as_str()
                ),
            ));
        }
    }

    let mail_input_ok = !input.is_signalled(keys::MAIL_SERVICE) || fields.contains(keys::MAIL_SERVICE);
    if mail_input_ok && is_signalled(input, OUTBOUND_MAIL_SIGNALS) {
        let service = mail_service(fields).unwrap_or(MailService::Custom);
        let port_ok = !input.is_signalled(keys::MAIL_PORT) || fields.contains(keys::MAIL_PORT);
        if service == MailService::Custom && port_ok {
            let missing: Vec<&str> = [keys::MAIL_HOST, keys::MAIL_PORT]
                .into_iter()
                .filter(|key| !fields.contains(key))
                .collect();
            if !missing.is_empty() {
                errors.push(ConfigError::incomplete_mail(
                    &[keys::MAIL_SERVICE, keys::MAIL_HOST, keys::MAIL_PORT],
                    format!("custom mail service requires {}", missing.join(" and ")),
                ));
            }
        }
    }

    errors
}

/// Typed reads from the validated field set.
///
/// A missing or mistyped value here means the schema and the grouping table
/// disagree; it is recorded as an [`ConfigError::UnknownValidationError`]
/// instead of panicking.
struct FieldReader<'a> {
    fields: &'a ValidatedFields,
    errors: ConfigErrors,
}

impl FieldReader<'_> {
    fn mismatch(&mut self, key: &str, expected: &str) {
        self.errors.push(ConfigError::unknown(format!(
            "schema does not provide {expected} field {key}"
        )));
    }

    fn string(&mut self, key: &str) -> String {
        match self.fields.string(key) {
            Some(value) => value.to_string(),
            None => {
                self.mismatch(key, "string");
                String::new()
            }
        }
    }

    fn optional_string(&mut self, key: &str) -> Option<String> {
        self.fields.string(key).map(ToString::to_string)
    }

    fn boolean(&mut self, key: &str) -> bool {
        self.fields.boolean(key).unwrap_or_else(|| {
            self.mismatch(key, "boolean");
            false
        })
    }

    fn unsigned(&mut self, key: &str) -> u64 {
        match self.fields.integer(key).map(u64::try_from) {
            Some(Ok(value)) => value,
            _ => {
                self.mismatch(key, "non-negative integer");
                0
            }
        }
    }

    fn port(&mut self, key: &str) -> u16 {
        match self.fields.integer(key).map(u16::try_from) {
            Some(Ok(value)) => value,
            _ => {
                self.mismatch(key, "port");
                0
            }
        }
    }

    fn optional_port(&mut self, key: &str) -> Option<u16> {
        let value = self.fields.integer(key)?;
        match u16::try_from(value) {
            Ok(port) => Some(port),
            Err(_) => {
                self.mismatch(key, "port");
                None
            }
        }
    }

    fn enumerated<T>(&mut self, key: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
        let parsed = self.fields.string(key).and_then(parse);
        if parsed.is_none() {
            self.mismatch(key, "enumerated");
        }
        parsed
    }
}
