//! Field descriptors and per-field coercion.
//!
//! A [`FieldDescriptor`] declares one environment key: its primitive kind,
//! default and constraints. [`coerce_field`] turns the raw string for that key
//! into a [`TypedValue`], or a field-scoped [`ConfigError`].

use std::fmt;

use serde::Serialize;

use crate::ConfigError;

/// Primitive type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Base-10 integer with optional inclusive bounds.
    Integer {
        /// Inclusive lower bound.
        min: Option<i64>,
        /// Inclusive upper bound.
        max: Option<i64>,
    },
    /// Boolean; only the exact literal `"true"` is true.
    Boolean,
    /// Any string, taken verbatim.
    String,
    /// String restricted to a fixed, case-sensitive set.
    Enum(&'static [&'static str]),
}

impl FieldKind {
    /// Short human name used in generated documentation.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer { .. } => "integer",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Enum(_) => "enum",
        }
    }
}

/// Default policy of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// No default; absence is an error.
    Required,
    /// Optional with no default; absence leaves the field out.
    Unset,
    /// Integer default.
    Integer(i64),
    /// Boolean default.
    Boolean(bool),
    /// String or enum default.
    Str(&'static str),
}

/// Schema entry for one configuration key.
///
/// Descriptors are `Copy` and built with `const fn` so a whole schema can live
/// in a `static` table:
///
/// ```
/// use keystone_config::{coerce_field, FieldDescriptor, TypedValue};
///
/// const PORT: FieldDescriptor = FieldDescriptor::integer("PORT")
///     .range(1, 65535)
///     .default_integer(3000)
///     .describe("HTTP listen port");
///
/// assert_eq!(coerce_field(&PORT, None).unwrap(), Some(TypedValue::Integer(3000)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Environment key.
    pub key: &'static str,
    /// Primitive type and constraints.
    pub kind: FieldKind,
    /// Default policy.
    pub default: DefaultValue,
    /// Human-readable description, used in messages and example files.
    pub description: &'static str,
    /// Illustrative value for example files when there is no default.
    pub example: Option<&'static str>,
}

impl FieldDescriptor {
    const fn new(key: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            kind,
            default: DefaultValue::Unset,
            description: "",
            example: None,
        }
    }

    /// An unbounded optional integer field.
    pub const fn integer(key: &'static str) -> Self {
        Self::new(key, FieldKind::Integer { min: None, max: None })
    }

    /// An optional boolean field.
    pub const fn boolean(key: &'static str) -> Self {
        Self::new(key, FieldKind::Boolean)
    }

    /// An optional string field.
    pub const fn string(key: &'static str) -> Self {
        Self::new(key, FieldKind::String)
    }

    /// An optional enumerated field.
    pub const fn one_of(key: &'static str, allowed: &'static [&'static str]) -> Self {
        Self::new(key, FieldKind::Enum(allowed))
    }

    /// Bound an integer field on both sides (inclusive).
    pub const fn range(self, min: i64, max: i64) -> Self {
        Self {
            kind: FieldKind::Integer {
                min: Some(min),
                max: Some(max),
            },
            ..self
        }
    }

    /// Bound an integer field from below (inclusive).
    pub const fn at_least(self, min: i64) -> Self {
        Self {
            kind: FieldKind::Integer {
                min: Some(min),
                max: None,
            },
            ..self
        }
    }

    /// Mark the field as required with no default.
    pub const fn required(self) -> Self {
        Self {
            default: DefaultValue::Required,
            ..self
        }
    }

    /// Integer default.
    pub const fn default_integer(self, value: i64) -> Self {
        Self {
            default: DefaultValue::Integer(value),
            ..self
        }
    }

    /// Boolean default.
    pub const fn default_bool(self, value: bool) -> Self {
        Self {
            default: DefaultValue::Boolean(value),
            ..self
        }
    }

    /// String or enum default.
    pub const fn default_str(self, value: &'static str) -> Self {
        Self {
            default: DefaultValue::Str(value),
            ..self
        }
    }

    /// Human-readable description.
    pub const fn describe(self, description: &'static str) -> Self {
        Self {
            description,
            ..self
        }
    }

    /// Illustrative value shown in example files.
    pub const fn example(self, example: &'static str) -> Self {
        Self {
            example: Some(example),
            ..self
        }
    }

    /// Whether absence of this field is an error.
    pub fn is_required(&self) -> bool {
        self.default == DefaultValue::Required
    }

    /// The default as a typed value, if there is one.
    pub fn default_value(&self) -> Option<TypedValue> {
        match self.default {
            DefaultValue::Required | DefaultValue::Unset => None,
            DefaultValue::Integer(value) => Some(TypedValue::Integer(value)),
            DefaultValue::Boolean(value) => Some(TypedValue::Boolean(value)),
            DefaultValue::Str(value) => Some(TypedValue::String(value.to_string())),
        }
    }
}

/// A coerced, typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    /// Integer value.
    Integer(i64),
    /// Boolean value.
    Boolean(bool),
    /// String or enum value.
    String(String),
}

impl TypedValue {
    /// The integer, if this is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

/// Coerce one raw value against its descriptor.
///
/// Returns `Ok(None)` only for optional fields with no default and no input.
/// An empty string counts as absent.
///
/// # Errors
///
/// - [`ConfigError::MissingRequiredField`] when a required field is absent
/// - [`ConfigError::InvalidNumericFormat`] when an integer field is not a
///   whole base-10 integer
/// - [`ConfigError::ValueOutOfRange`] when an integer is outside its bounds
/// - [`ConfigError::InvalidEnumValue`] when an enum field is not in its set
pub fn coerce_field(
    descriptor: &FieldDescriptor,
    raw: Option<&str>,
) -> Result<Option<TypedValue>, ConfigError> {
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        if descriptor.is_required() {
            return Err(ConfigError::missing_required(descriptor.key));
        }
        return Ok(descriptor.default_value());
    };

    let value = match descriptor.kind {
        FieldKind::Integer { min, max } => {
            let parsed: i64 = raw
                .parse()
                .map_err(|_| ConfigError::invalid_numeric(descriptor.key, raw))?;
            let below = min.is_some_and(|min| parsed < min);
            let above = max.is_some_and(|max| parsed > max);
            if below || above {
                return Err(ConfigError::out_of_range(descriptor.key, parsed, min, max));
            }
            TypedValue::Integer(parsed)
        }
        // Strict on purpose: "TRUE", "1" and "yes" are all false.
        FieldKind::Boolean => TypedValue::Boolean(raw == "true"),
        FieldKind::Enum(allowed) => {
            if !allowed.contains(&raw) {
                return Err(ConfigError::invalid_enum(descriptor.key, raw, allowed));
            }
            TypedValue::String(raw.to_string())
        }
        FieldKind::String => TypedValue::String(raw.to_string()),
    };

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigErrorKind;

    const PORT: FieldDescriptor = FieldDescriptor::integer("PORT")
        .range(1, 65535)
        .default_integer(3000);
    const SECRET: FieldDescriptor = FieldDescriptor::string("JWT_SECRET").required();
    const FLAG: FieldDescriptor = FieldDescriptor::boolean("FLAG").default_bool(false);
    const MODE: FieldDescriptor =
        FieldDescriptor::one_of("MODE", &["a", "b"]).default_str("a");
    const OPTIONAL: FieldDescriptor = FieldDescriptor::string("OPTIONAL");

    fn kind_of(result: Result<Option<TypedValue>, ConfigError>) -> ConfigErrorKind {
        result.unwrap_err().kind()
    }

    #[test]
    fn test_absent_uses_default() {
        assert_eq!(coerce_field(&PORT, None).unwrap(), Some(TypedValue::Integer(3000)));
        assert_eq!(coerce_field(&FLAG, None).unwrap(), Some(TypedValue::Boolean(false)));
        assert_eq!(
            coerce_field(&MODE, None).unwrap(),
            Some(TypedValue::String("a".to_string()))
        );
    }

    #[test]
    fn test_empty_string_counts_as_absent() {
        assert_eq!(coerce_field(&PORT, Some("")).unwrap(), Some(TypedValue::Integer(3000)));
        assert_eq!(kind_of(coerce_field(&SECRET, Some(""))), ConfigErrorKind::MissingRequiredField);
    }

    #[test]
    fn test_absent_optional_without_default_is_none() {
        assert_eq!(coerce_field(&OPTIONAL, None).unwrap(), None);
    }

    #[test]
    fn test_absent_required_fails() {
        let err = coerce_field(&SECRET, None).unwrap_err();
        assert_eq!(err, ConfigError::missing_required("JWT_SECRET"));
    }

    #[test]
    fn test_integer_parse_is_strict() {
        assert_eq!(coerce_field(&PORT, Some("8080")).unwrap(), Some(TypedValue::Integer(8080)));
        assert_eq!(kind_of(coerce_field(&PORT, Some("abc"))), ConfigErrorKind::InvalidNumericFormat);
        assert_eq!(kind_of(coerce_field(&PORT, Some("80abc"))), ConfigErrorKind::InvalidNumericFormat);
        assert_eq!(kind_of(coerce_field(&PORT, Some("80.5"))), ConfigErrorKind::InvalidNumericFormat);
        assert_eq!(kind_of(coerce_field(&PORT, Some(" 80"))), ConfigErrorKind::InvalidNumericFormat);
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(kind_of(coerce_field(&PORT, Some("0"))), ConfigErrorKind::ValueOutOfRange);
        assert_eq!(kind_of(coerce_field(&PORT, Some("-1"))), ConfigErrorKind::ValueOutOfRange);
        assert_eq!(kind_of(coerce_field(&PORT, Some("70000"))), ConfigErrorKind::ValueOutOfRange);
        assert!(coerce_field(&PORT, Some("1")).is_ok());
        assert!(coerce_field(&PORT, Some("65535")).is_ok());
    }

    #[test]
    fn test_boolean_only_exact_true() {
        for raw in ["TRUE", "True", "1", "yes", "on", "false"] {
            assert_eq!(
                coerce_field(&FLAG, Some(raw)).unwrap(),
                Some(TypedValue::Boolean(false)),
                "{raw} should coerce to false"
            );
        }
        assert_eq!(coerce_field(&FLAG, Some("true")).unwrap(), Some(TypedValue::Boolean(true)));
    }

    #[test]
    fn test_enum_membership_is_case_sensitive() {
        assert!(coerce_field(&MODE, Some("b")).is_ok());
        let err = coerce_field(&MODE, Some("B")).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnumValue {
                field: "MODE".to_string(),
                value: "B".to_string(),
                allowed: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(
            coerce_field(&OPTIONAL, Some("  spaced  ")).unwrap(),
            Some(TypedValue::String("  spaced  ".to_string()))
        );
    }

    #[test]
    fn test_typed_value_accessors() {
        assert_eq!(TypedValue::Integer(5).as_integer(), Some(5));
        assert_eq!(TypedValue::Boolean(true).as_bool(), Some(true));
        assert_eq!(TypedValue::String("x".into()).as_str(), Some("x"));
        assert_eq!(TypedValue::Integer(5).as_str(), None);
        assert_eq!(TypedValue::Boolean(false).to_string(), "false");
    }
}
