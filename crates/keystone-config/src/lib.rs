//! Environment configuration for Keystone services.
//!
//! This crate turns a flat map of raw environment strings into a validated,
//! strongly-typed, nested configuration:
//!
//! - **Coercion**: every key is declared once by a [`FieldDescriptor`] and
//!   coerced by [`coerce_field`] (strict integers, exact-`"true"` booleans,
//!   case-sensitive enums, verbatim strings)
//! - **Composition**: the [`Composer`] groups fields into sections, includes
//!   optional sections only when one of their signal fields is set, and
//!   enforces cross-field invariants
//! - **Aggregation**: every failure is collected into one [`ConfigErrors`]
//!   report instead of stopping at the first
//!
//! # Example
//!
//! ```no_run
//! use keystone_config::ConfigLoader;
//!
//! let validated = match ConfigLoader::new()
//!     .with_optional_env_file(".env")
//!     .expect("readable .env")
//!     .with_process_env()
//!     .load()
//! {
//!     Ok(validated) => validated,
//!     Err(errors) => {
//!         eprintln!("{errors}");
//!         std::process::exit(1);
//!     }
//! };
//!
//! println!("Server will listen on: {}", validated.config.server.bind_addr());
//! ```
//!
//! # Sections
//!
//! | Section | Presence | Keys |
//! |---------|----------|------|
//! | `server` | always | `NODE_ENV`, `PORT`, `HOST`, `LOG_LEVEL`, `REQUEST_TIMEOUT`, `BODY_LIMIT`, `TRUST_PROXY` |
//! | `database` | always | `DATABASE_TYPE`, `DATABASE_URL`, `DATABASE_HOST`, `DATABASE_PORT`, `DATABASE_USERNAME`, `DATABASE_PASSWORD`, `DATABASE_NAME` |
//! | `signing` | always | `JWT_SECRET`, `JWT_EXPIRES_IN`, `JWT_ALGORITHM` |
//! | `crossOrigin` | `CORS_ORIGIN` set | `CORS_ORIGIN`, `CORS_CREDENTIALS`, `CORS_METHODS` |
//! | `security` | any rate-limit or helmet key set | `RATE_LIMIT_MAX`, `RATE_LIMIT_WINDOW_MS`, `HELMET_ENABLED` |
//! | `outboundMail` | `MAIL_SERVICE` or `MAIL_HOST` set | `MAIL_*` |
//! | `custom` | any `APP_*` key set | `APP_*`, passed through untyped |

#![warn(missing_docs)]

mod compose;
mod config;
mod error;
mod example;
mod field;
mod input;
mod loader;
pub mod schema;

pub use compose::{
    Composer, Validated, ValidationResult, CROSS_ORIGIN_SIGNALS, DEFAULT_CUSTOM_PREFIX,
    OUTBOUND_MAIL_SIGNALS, SECURITY_SIGNALS,
};
pub use config::*;
pub use error::{ConfigError, ConfigErrorKind, ConfigErrors, LoadError};
pub use example::render_env_example;
pub use field::{coerce_field, DefaultValue, FieldDescriptor, FieldKind, TypedValue};
pub use input::RawInput;
pub use loader::ConfigLoader;
pub use schema::{Schema, SchemaSection, ValidatedFields};
