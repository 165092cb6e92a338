//! Property-based tests for field coercion.

use keystone_config::{coerce_field, schema::keys, ConfigErrorKind, FieldKind, Schema, TypedValue};
use proptest::prelude::*;

fn boolean_fields() -> Vec<keystone_config::FieldDescriptor> {
    Schema::standard()
        .fields()
        .filter(|field| field.kind == FieldKind::Boolean)
        .copied()
        .collect()
}

proptest! {
    /// Only the exact literal "true" coerces to true.
    #[test]
    fn boolean_is_true_only_for_exact_literal(raw in "\\PC{0,8}") {
        for field in boolean_fields() {
            let value = coerce_field(&field, Some(raw.as_str())).unwrap();
            let expected = if raw.is_empty() {
                field.default_value()
            } else {
                Some(TypedValue::Boolean(raw == "true"))
            };
            prop_assert_eq!(value, expected);
        }
    }

    /// Strings containing a non-digit never parse as integers.
    #[test]
    fn non_numeric_port_is_rejected(raw in "[0-9]{0,3}[a-zA-Z. ][0-9a-z]{0,3}") {
        let schema = Schema::standard();
        let port = schema.field(keys::PORT).unwrap();
        let err = coerce_field(port, Some(raw.as_str())).unwrap_err();
        prop_assert_eq!(err.kind(), ConfigErrorKind::InvalidNumericFormat);
    }

    /// Every integer in range is accepted verbatim; everything else is out of range.
    #[test]
    fn port_bounds_are_enforced(value in -100_000i64..200_000) {
        let schema = Schema::standard();
        let port = schema.field(keys::PORT).unwrap();
        let result = coerce_field(port, Some(value.to_string().as_str()));
        if (1..=65535).contains(&value) {
            prop_assert_eq!(result.unwrap(), Some(TypedValue::Integer(value)));
        } else {
            prop_assert_eq!(result.unwrap_err().kind(), ConfigErrorKind::ValueOutOfRange);
        }
    }

    /// Absent input always yields the declared default.
    #[test]
    fn absent_input_yields_default(index in 0usize..64) {
        let schema = Schema::standard();
        let fields: Vec<_> = schema.fields().collect();
        let field = fields[index % fields.len()];
        if let Some(default) = field.default_value() {
            prop_assert_eq!(coerce_field(field, None).unwrap(), Some(default));
        }
    }
}
