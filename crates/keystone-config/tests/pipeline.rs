//! End-to-end tests of the configuration pipeline.
//!
//! These drive the public API the way process startup does: raw input in,
//! either a composed configuration or a complete error report out.

use keystone_config::{
    Composer, ConfigErrorKind, CorsOrigin, DatabaseType, Environment, RawInput, ValidationResult,
};

const SECRET_32: &str = "abcdefghijklmnopqrstuvwxyz012345";

fn compose(pairs: &[(&str, &str)]) -> ValidationResult {
    Composer::new().compose(&RawInput::from_pairs(pairs.iter().copied()))
}

#[test]
fn test_missing_secret_is_missing_required_field() {
    let result = compose(&[]);
    let errors = result.errors().expect("missing secret must fail");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.iter().next().unwrap().kind(),
        ConfigErrorKind::MissingRequiredField
    );
}

#[test]
fn test_short_secret_is_weak() {
    let result = compose(&[("JWT_SECRET", "0123456789")]);
    let errors = result.errors().expect("short secret must fail");
    assert!(errors.contains_kind(ConfigErrorKind::WeakSigningSecret));
}

#[test]
fn test_secret_of_exactly_32_characters_is_accepted() {
    assert_eq!(SECRET_32.len(), 32);
    assert!(compose(&[("JWT_SECRET", SECRET_32)]).is_valid());
}

#[test]
fn test_secret_of_31_characters_is_rejected() {
    let result = compose(&[("JWT_SECRET", &SECRET_32[..31])]);
    assert!(result.errors().unwrap().contains_kind(ConfigErrorKind::WeakSigningSecret));
}

#[test]
fn test_multiple_invalid_fields_are_all_reported() {
    let result = compose(&[
        ("PORT", "-1"),
        ("NODE_ENV", "invalid-env"),
        ("DATABASE_TYPE", "invalid-db"),
        ("JWT_SECRET", "short"),
    ]);

    let errors = result.errors().expect("invalid input must fail");
    assert!(errors.len() >= 4, "expected at least four errors, got: {errors}");

    let fields: Vec<_> = errors.iter().flat_map(|e| e.fields()).collect();
    for field in ["PORT", "NODE_ENV", "DATABASE_TYPE", "JWT_SECRET"] {
        assert!(fields.contains(&field), "no error for {field}: {errors}");
    }

    let report = errors.to_string();
    assert!(report.contains("invalid-env"));
    assert!(report.contains("invalid-db"));
}

#[test]
fn test_secret_only_yields_defaults_and_no_optional_sections() {
    let validated = compose(&[("JWT_SECRET", SECRET_32)])
        .into_result()
        .expect("secret alone is enough");
    let config = &validated.config;

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "localhost");
    assert_eq!(config.server.environment, Environment::Development);
    assert_eq!(config.database.kind, DatabaseType::DEFAULT);
    assert!(config.cross_origin.is_absent());
    assert!(config.security.is_absent());
    assert!(config.outbound_mail.is_absent());
}

#[test]
fn test_cors_origin_list_keeps_order() {
    let validated = compose(&[
        ("JWT_SECRET", SECRET_32),
        ("CORS_ORIGIN", "https://a.com,https://b.com"),
    ])
    .into_result()
    .unwrap();

    let cors = validated.config.cross_origin.as_present().unwrap();
    assert_eq!(
        cors.origin,
        CorsOrigin::Origins(vec!["https://a.com".to_string(), "https://b.com".to_string()])
    );
}

#[test]
fn test_cors_origin_true_is_boolean() {
    let validated = compose(&[("JWT_SECRET", SECRET_32), ("CORS_ORIGIN", "true")])
        .into_result()
        .unwrap();

    let cors = validated.config.cross_origin.as_present().unwrap();
    assert_eq!(cors.origin, CorsOrigin::Boolean(true));
}

#[test]
fn test_compose_is_deterministic() {
    let input = RawInput::from_pairs([
        ("JWT_SECRET", SECRET_32),
        ("CORS_ORIGIN", "https://a.com"),
        ("RATE_LIMIT_MAX", "10"),
        ("MAIL_SERVICE", "gmail"),
        ("APP_NAME", "demo"),
    ]);
    let composer = Composer::new();

    let first = composer.compose(&input).into_result().unwrap();
    let second = composer.compose(&input).into_result().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_composer_shared_across_threads() {
    let composer = std::sync::Arc::new(Composer::new());

    let handles: Vec<_> = (0..4u16)
        .map(|i| {
            let composer = std::sync::Arc::clone(&composer);
            std::thread::spawn(move || {
                let port = (4000 + i).to_string();
                let input = RawInput::from_pairs([("JWT_SECRET", SECRET_32), ("PORT", port.as_str())]);
                composer.compose(&input).into_result().unwrap().config.server.port
            })
        })
        .collect();

    let ports: Vec<u16> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ports, vec![4000, 4001, 4002, 4003]);
}

#[test]
fn test_env_file_round_trip_through_pipeline() {
    let input = RawInput::parse_env_str(&format!(
        "# service\nJWT_SECRET={SECRET_32}\nPORT=8080\nnot a valid line\nNODE_ENV=production\n"
    ));

    let validated = Composer::new().compose(&input).into_result().unwrap();
    assert_eq!(validated.config.server.port, 8080);
    assert_eq!(validated.config.server.environment, Environment::Production);
}
