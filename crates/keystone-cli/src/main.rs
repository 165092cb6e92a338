//! Keystone CLI - Entry point

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;

use keystone_cli::{check, CheckOptions, CliError, OutputFormat, Scaffolder, Target};
use keystone_config::{render_env_example, Schema};
use keystone_telemetry::{init_logging, LogConfig};

/// Validate service configuration and scaffold projects.
#[derive(Debug, Parser)]
#[command(name = "keystone", version, about)]
struct Cli {
    /// Project root directory.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Environment file, relative to the root unless absolute.
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Prefix of keys passed through into the `custom` section.
    #[arg(long, global = true)]
    custom_prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the configuration and print the composed result.
    Check {
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Scaffold project files. Existing files are left untouched.
    Init {
        /// What to scaffold.
        #[arg(value_enum)]
        target: Target,
    },
    /// Print a documented example environment file.
    Example,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| keystone_cli::DEFAULT_LOG_FILTER.to_string());
    let log_config = LogConfig {
        span_events: false,
        file_line_info: false,
        ..LogConfig::development().with_level(level)
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("warning: logging disabled: {e}");
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Check { format } => {
            let options = CheckOptions {
                env_file: cli.env_file,
                custom_prefix: cli.custom_prefix,
                ..CheckOptions::new(cli.root)
            };
            match check::load(&options) {
                Ok(validated) => {
                    let rendered = check::render(&validated.config, format)?;
                    writeln!(stdout, "{rendered}").context("failed to write output")?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(err @ CliError::Invalid(_)) => {
                    error!(env_file = %options.env_path().display(), "Invalid configuration");
                    eprintln!("{err}");
                    Ok(ExitCode::from(err.exit_code()))
                }
                Err(err) => Err(err).context("failed to load configuration"),
            }
        }
        Command::Init { target } => {
            Scaffolder::new(&cli.root)
                .run(target, &mut stdout)
                .with_context(|| format!("failed to scaffold {}", cli.root.display()))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Example => {
            write!(stdout, "{}", render_env_example(&Schema::standard()))
                .context("failed to write output")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
