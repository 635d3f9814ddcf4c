//! # patrol-step
//!
//! CI step that prepares [Patrol](https://patrol.leancode.co) UI tests of a
//! Flutter app for a device farm.
//!
//! ## Overview
//!
//! A run goes through four stages and stops at the first failure:
//!
//! - **Install** - finds the Patrol CLI version, activating `patrol_cli` first if needed
//! - **Validate** - checks Flutter, Patrol CLI and the `patrol` package against the compatibility table
//! - **Build** - runs `patrol build android` and/or `patrol build ios`
//! - **Export** - copies the APKs / app bundles into `patrol/` and publishes them with `envman`
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | All four stages (default) |
//! | `install` | Install stage only |
//! | `validate` | Validate against the already installed CLI |
//! | `build` | Build stage only |
//! | `export` | Export the outputs of an earlier build |
//! | `print-commands` | Print the `patrol build` lines without running them |
//!
//! ## Inputs
//!
//! | Variable | Required | Meaning |
//! |----------|----------|---------|
//! | `PLATFORM` | yes | `android`, `ios` or `both` |
//! | `TEST_TARGET_DIRECTORY` | yes | Value of `patrol build --target` |
//! | `TEST_BUILD_TYPE` | yes | `release`, `debug` or `simulator` |
//! | `TAGS` / `EXCLUDED_TAGS` | no | Comma-separated tag filters |
//! | `IS_VERBOSE_MODE` / `IS_COVERAGE_MODE` | no | `true` or `false` |
//! | `CUSTOM_PATROL_CLI_VERSION` | no | Pinned `patrol_cli` version |
//!
//! A `.env` file in the working directory is loaded first; variables already
//! set in the environment win. Project settings live in `patrol-step.toml`,
//! see [`config`].
//!
//! ## Logging
//!
//! Step banners go to stdout. Diagnostics use `tracing` and are written to
//! stderr; set `RUST_LOG=patrol_step=debug` to see every spawned command.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use patrol_step_sdk::{EnvmanSink, Printer, ProcessExecutor};
use serde_json::json;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod inputs;
pub mod stages;

use config::StepConfig;
use inputs::StepInputs;
use stages::Pipeline;

/// Installs the Patrol CLI, validates versions, builds and exports Patrol test binaries.
#[derive(Parser, Debug)]
#[command(name = "patrol-step", author, version, about = "Patrol UI-test CI step", long_about = None)]
pub struct Cli {
    /// Path to patrol-step.toml (discovered from the working directory otherwise)
    #[arg(long, env = "PATROL_STEP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Disable colored banners
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run install, validate, build and export.
    Run,
    /// Make sure the Patrol CLI is installed.
    Install,
    /// Check Flutter, Patrol CLI and patrol package compatibility.
    Validate,
    /// Run the patrol build commands.
    Build,
    /// Copy and publish the build outputs.
    Export,
    /// Print the patrol build command lines without running them.
    PrintCommands {
        #[arg(long, help = "Print a JSON document instead of shell lines")]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing();

    let printer = Printer::new(use_color(cli.no_color));
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let (config, config_path) = match StepConfig::resolve(cli.config.as_deref())? {
        Some((config, path)) => {
            tracing::info!(path = %path.display(), "loaded configuration");
            (config, Some(path))
        }
        None => (StepConfig::default(), None),
    };
    let project_root = config.project_root(config_path.as_deref(), &cwd);
    let project_root = std::path::absolute(&project_root)
        .with_context(|| format!("resolving project root {:?}", project_root))?;

    let inputs = StepInputs::from_env()
        .with_default_cli_version(config.install.patrol_cli_version.as_deref());

    let executor = ProcessExecutor::new().working_dir(&project_root);
    let sink = EnvmanSink::new(&executor);
    let pipeline = Pipeline::new(&executor, &sink)
        .printer(printer)
        .project_root(&project_root)
        .compatibility(config.compatibility.clone());

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let report = pipeline.run(&inputs)?;
            tracing::info!(
                flutter = %report.versions.flutter,
                patrol_cli = %report.versions.patrol_cli,
                patrol = %report.versions.patrol,
                "step completed"
            );
        }
        Command::Install => {
            pipeline.install(&inputs)?;
        }
        Command::Validate => {
            pipeline.validate_installed()?;
        }
        Command::Build => {
            pipeline.build(&inputs)?;
        }
        Command::Export => {
            pipeline.export(&inputs)?;
        }
        Command::PrintCommands { json } => print_commands(&inputs, json)?,
    }
    Ok(())
}

/// Renders the build command lines for `inputs`, one per line or as JSON.
pub fn render_commands(inputs: &StepInputs, as_json: bool) -> Result<String> {
    let config = inputs
        .build_configuration()
        .context("invalid build inputs")?;
    let lines = config.command_lines();
    if as_json {
        let document = json!({
            "platform": config.platform().as_str(),
            "buildType": config.build_type().as_str(),
            "commands": lines,
        });
        return serde_json::to_string_pretty(&document).context("serializing build commands");
    }
    Ok(lines.join("\n"))
}

fn print_commands(inputs: &StepInputs, as_json: bool) -> Result<()> {
    println!("{}", render_commands(inputs, as_json)?);
    Ok(())
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn use_color(no_color_flag: bool) -> bool {
    !no_color_flag && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
