//! Project scaffolding.
//!
//! Every step is idempotent: an existing target is reported as `skipped`
//! and left untouched. Steps are reported as a numbered task list:
//!
//! ```text
//! [1/2] Create config directory ... created
//! [2/2] Write .env.example ... skipped
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use keystone_config::{render_env_example, Schema};

use crate::error::{CliError, CliResult};

/// Example environment file name.
pub const ENV_EXAMPLE_FILE: &str = ".env.example";
/// Active environment file name.
pub const ENV_FILE: &str = ".env";
/// Configuration check script, relative to the project root.
pub const CHECK_SCRIPT: &str = "scripts/check-config.sh";

const CHECK_SCRIPT_BODY: &str = r#"#!/bin/sh
# Validate the environment before starting the service.
set -e
exec keystone check --env-file "${1:-.env}"
"#;

/// What `keystone init` should scaffold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Target {
    /// `config/` and `.env.example`.
    Config,
    /// `.env` copied from `.env.example`.
    Env,
    /// `scripts/check-config.sh`.
    Scripts,
    /// `api/routes/` and `api/handlers/`.
    Api,
    /// Everything, in the order above.
    All,
}

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The target was created.
    Created,
    /// The target already existed.
    Skipped,
}

impl StepOutcome {
    /// Report word for this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone)]
enum Action {
    CreateDir(PathBuf),
    WriteFile { path: PathBuf, contents: String },
    CopyFile { from: PathBuf, to: PathBuf },
}

/// One labelled scaffolding step.
#[derive(Debug, Clone)]
pub struct Step {
    label: String,
    action: Action,
}

impl Step {
    fn new(label: &str, action: Action) -> Self {
        Self {
            label: label.to_string(),
            action,
        }
    }

    /// Label shown in the task list.
    pub fn label(&self) -> &str {
        &self.label
    }

    fn run(&self) -> CliResult<StepOutcome> {
        match &self.action {
            Action::CreateDir(path) => {
                if path.is_dir() {
                    return Ok(StepOutcome::Skipped);
                }
                fs::create_dir_all(path).map_err(|e| CliError::io(path, e))?;
            }
            Action::WriteFile { path, contents } => {
                if path.exists() {
                    return Ok(StepOutcome::Skipped);
                }
                create_parent(path)?;
                fs::write(path, contents).map_err(|e| CliError::io(path, e))?;
                if path.extension().is_some_and(|ext| ext == "sh") {
                    make_executable(path)?;
                }
            }
            Action::CopyFile { from, to } => {
                if to.exists() {
                    return Ok(StepOutcome::Skipped);
                }
                if !from.exists() {
                    return Err(CliError::MissingExample { path: from.clone() });
                }
                fs::copy(from, to).map_err(|e| CliError::io(to, e))?;
            }
        }
        tracing::info!(step = %self.label, "Scaffold step created");
        Ok(StepOutcome::Created)
    }
}

fn create_parent(path: &Path) -> CliResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| CliError::io(parent, e))
        }
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> CliResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| CliError::io(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> CliResult<()> {
    Ok(())
}

/// Plans and runs scaffolding steps under a project root.
#[derive(Debug, Clone)]
pub struct Scaffolder {
    root: PathBuf,
    schema: Schema,
}

impl Scaffolder {
    /// Create a scaffolder for `root` using the standard schema.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            schema: Schema::standard(),
        }
    }

    /// Render `.env.example` from `schema` instead of the standard one.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The steps `target` would run, in order.
    pub fn plan(&self, target: Target) -> Vec<Step> {
        match target {
            Target::Config => vec![
                Step::new("Create config directory", Action::CreateDir(self.root.join("config"))),
                Step::new(
                    "Write .env.example",
                    Action::WriteFile {
                        path: self.root.join(ENV_EXAMPLE_FILE),
                        contents: render_env_example(&self.schema),
                    },
                ),
            ],
            Target::Env => vec![Step::new(
                "Copy .env.example to .env",
                Action::CopyFile {
                    from: self.root.join(ENV_EXAMPLE_FILE),
                    to: self.root.join(ENV_FILE),
                },
            )],
            Target::Scripts => vec![
                Step::new("Create scripts directory", Action::CreateDir(self.root.join("scripts"))),
                Step::new(
                    "Write check-config.sh",
                    Action::WriteFile {
                        path: self.root.join(CHECK_SCRIPT),
                        contents: CHECK_SCRIPT_BODY.to_string(),
                    },
                ),
            ],
            Target::Api => vec![
                Step::new("Create api/routes", Action::CreateDir(self.root.join("api").join("routes"))),
                Step::new(
                    "Create api/handlers",
                    Action::CreateDir(self.root.join("api").join("handlers")),
                ),
            ],
            Target::All => [Target::Config, Target::Env, Target::Scripts, Target::Api]
                .into_iter()
                .flat_map(|target| self.plan(target))
                .collect(),
        }
    }

    /// Run every step of `target`, writing the task list to `out`.
    ///
    /// Stops at the first failing step.
    pub fn run<W: Write>(&self, target: Target, out: &mut W) -> CliResult<Vec<StepOutcome>> {
        let steps = self.plan(target);
        let total = steps.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, step) in steps.iter().enumerate() {
            let outcome = step.run()?;
            writeln!(out, "[{}/{}] {} ... {}", index + 1, total, step.label, outcome.as_str())
                .map_err(|e| CliError::io("<stdout>", e))?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(scaffolder: &Scaffolder, target: Target) -> (Vec<StepOutcome>, String) {
        let mut out = Vec::new();
        let outcomes = scaffolder.run(target, &mut out).unwrap();
        (outcomes, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_init_config() {
        let dir = tempfile::tempdir().unwrap();
        let scaffolder = Scaffolder::new(dir.path());

        let (outcomes, report) = run(&scaffolder, Target::Config);
        assert_eq!(outcomes, vec![StepOutcome::Created, StepOutcome::Created]);
        assert!(report.contains("[1/2] Create config directory ... created"));
        assert!(report.contains("[2/2] Write .env.example ... created"));

        assert!(dir.path().join("config").is_dir());
        let example = fs::read_to_string(dir.path().join(ENV_EXAMPLE_FILE)).unwrap();
        assert!(example.contains("JWT_SECRET="));
    }

    #[test]
    fn test_rerun_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let scaffolder = Scaffolder::new(dir.path());
        run(&scaffolder, Target::Config);

        fs::write(dir.path().join(ENV_EXAMPLE_FILE), "EDITED=1\n").unwrap();
        let (outcomes, report) = run(&scaffolder, Target::Config);

        assert_eq!(outcomes, vec![StepOutcome::Skipped, StepOutcome::Skipped]);
        assert!(report.contains("... skipped"));
        let example = fs::read_to_string(dir.path().join(ENV_EXAMPLE_FILE)).unwrap();
        assert_eq!(example, "EDITED=1\n");
    }

    #[test]
    fn test_init_env_without_example_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let err = Scaffolder::new(dir.path())
            .run(Target::Env, &mut out)
            .unwrap_err();
        assert!(matches!(err, CliError::MissingExample { .. }));
        assert!(!dir.path().join(ENV_FILE).exists());
    }

    #[test]
    fn test_init_env_keeps_existing_env() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ENV_FILE), "PORT=9999\n").unwrap();

        let (outcomes, _) = run(&Scaffolder::new(dir.path()), Target::Env);
        assert_eq!(outcomes, vec![StepOutcome::Skipped]);
        assert_eq!(
            fs::read_to_string(dir.path().join(ENV_FILE)).unwrap(),
            "PORT=9999\n"
        );
    }

    #[test]
    fn test_init_all() {
        let dir = tempfile::tempdir().unwrap();
        let scaffolder = Scaffolder::new(dir.path());

        let (outcomes, report) = run(&scaffolder, Target::All);
        assert_eq!(outcomes.len(), 7);
        assert!(outcomes.iter().all(|o| *o == StepOutcome::Created));
        assert!(report.starts_with("[1/7] "));

        assert_eq!(
            fs::read_to_string(dir.path().join(ENV_FILE)).unwrap(),
            fs::read_to_string(dir.path().join(ENV_EXAMPLE_FILE)).unwrap()
        );
        assert!(dir.path().join(CHECK_SCRIPT).is_file());
        assert!(dir.path().join("api/routes").is_dir());
        assert!(dir.path().join("api/handlers").is_dir());

        let (outcomes, _) = run(&scaffolder, Target::All);
        assert!(outcomes.iter().all(|o| *o == StepOutcome::Skipped));
    }

    #[cfg(unix)]
    #[test]
    fn test_check_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        run(&Scaffolder::new(dir.path()), Target::Scripts);
        let mode = fs::metadata(dir.path().join(CHECK_SCRIPT))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
