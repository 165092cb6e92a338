//! `keystone check`: load, validate, and print the composed configuration.

use std::path::{Path, PathBuf};

use keystone_config::{ComposedConfig, ConfigLoader, Validated};

use crate::error::{CliError, CliResult};

/// Output format for the composed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// TOML.
    Toml,
}

/// Inputs for a configuration check.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Project root; a relative `env_file` is resolved against it.
    pub root: PathBuf,
    /// Environment file, loaded if it exists.
    pub env_file: PathBuf,
    /// Prefix of pass-through keys.
    pub custom_prefix: Option<String>,
    /// Whether the process environment overrides the file.
    pub process_env: bool,
}

impl CheckOptions {
    /// Options for `root` with the default `.env` file and process environment.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            env_file: PathBuf::from(crate::scaffold::ENV_FILE),
            custom_prefix: None,
            process_env: true,
        }
    }

    /// The environment file path after resolving against the root.
    pub fn env_path(&self) -> PathBuf {
        resolve(&self.root, &self.env_file)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Load and validate configuration.
///
/// # Errors
///
/// Returns `CliError::Load` if the env file exists but cannot be read, and
/// `CliError::Invalid` with every validation failure otherwise.
pub fn load(options: &CheckOptions) -> CliResult<Validated> {
    let env_path = options.env_path();
    tracing::debug!(path = %env_path.display(), "Checking configuration");

    let mut loader = ConfigLoader::new().with_optional_env_file(&env_path)?;
    if options.process_env {
        loader = loader.with_process_env();
    }
    if let Some(prefix) = &options.custom_prefix {
        loader = loader.with_custom_prefix(prefix.clone());
    }

    let validated = loader.load()?;
    tracing::info!(
        environment = %validated.config.server.environment,
        fields = validated.fields.len(),
        "Configuration is valid"
    );
    Ok(validated)
}

/// Render the composed configuration.
///
/// Secrets are redacted by the configuration's serializer.
pub fn render(config: &ComposedConfig, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| CliError::render("json", e))
        }
        OutputFormat::Toml => toml::to_string(config).map_err(|e| CliError::render("toml", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn options(dir: &Path) -> CheckOptions {
        CheckOptions {
            process_env: false,
            ..CheckOptions::new(dir)
        }
    }

    #[test]
    fn test_check_valid_env_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".env"),
            format!("JWT_SECRET={SECRET}\nPORT=8080\nCORS_ORIGIN=https://a.com\n"),
        )
        .unwrap();

        let validated = load(&options(dir.path())).unwrap();
        assert_eq!(validated.config.server.port, 8080);
        assert!(validated.config.cross_origin.is_present());
    }

    #[test]
    fn test_check_reports_every_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".env"),
            "PORT=abc\nNODE_ENV=invalid-env\nDATABASE_TYPE=nope\n",
        )
        .unwrap();

        let err = load(&options(dir.path())).unwrap_err();
        match err {
            CliError::Invalid(errors) => assert!(errors.len() >= 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&options(dir.path())).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_custom_prefix_and_absolute_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join("custom.env");
        fs::write(&env_file, format!("JWT_SECRET={SECRET}\nSVC_MODE=fast\n")).unwrap();

        let options = CheckOptions {
            env_file: env_file.clone(),
            custom_prefix: Some("SVC_".to_string()),
            ..options(Path::new("/does/not/matter"))
        };
        assert_eq!(options.env_path(), env_file);

        let validated = load(&options).unwrap();
        let custom = validated.config.custom.as_present().unwrap();
        assert_eq!(custom.get("SVC_MODE").map(String::as_str), Some("fast"));
    }

    #[test]
    fn test_render_redacts_secret() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), format!("JWT_SECRET={SECRET}\n")).unwrap();
        let validated = load(&options(dir.path())).unwrap();

        let json = render(&validated.config, OutputFormat::Json).unwrap();
        assert!(json.contains("\"port\": 3000"));
        assert!(!json.contains(SECRET));

        let toml = render(&validated.config, OutputFormat::Toml).unwrap();
        assert!(toml.contains("[server]"));
        assert!(!toml.contains(SECRET));
    }

    #[test]
    fn test_render_masks_database_url_credentials() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".env"),
            format!(
                "JWT_SECRET={SECRET}\nDATABASE_TYPE=postgres\n\
                 DATABASE_URL=postgres://app:hunter2@db/app\nDATABASE_PASSWORD=hunter2\n"
            ),
        )
        .unwrap();
        let validated = load(&options(dir.path())).unwrap();

        for format in [OutputFormat::Json, OutputFormat::Toml] {
            let rendered = render(&validated.config, format).unwrap();
            assert!(!rendered.contains("hunter2"), "{rendered}");
            assert!(rendered.contains("postgres://[redacted]@db/app"));
        }
    }
}
