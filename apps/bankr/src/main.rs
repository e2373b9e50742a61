//! bankr - Deadlock detection and avoidance with the Banker's algorithm
//!
//! This is the CLI front end over the analysis engine: it loads a snapshot,
//! runs one engine operation and renders the result as tables or JSON.

mod cli;
mod commands;
mod display;
mod error;
mod protocol;
mod report;

use crate::cli::{Cli, Commands, InputArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::protocol::RequestArg;
use crate::report::CommandOutput;
use bankr_config::Config;
use bankr_engine::scenarios::Scenario;
use bankr_engine::{ResourceRequest, StepState, SystemState};
use bankr_errors::Error;
use bankr_types::{OutputFormat, StateLimits};
use clap::Parser;
use std::path::Path;
use std::process;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.debug, cli.global.log_json);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting bankr v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global)?;

    let limits = config.state_limits();
    debug!(?limits, "effective snapshot limits");

    let output = match cli.command {
        Commands::Worker { input } => {
            let text = read_input(input.as_deref()).await?;
            let job = protocol::parse_job(&text, &limits)?;
            // Worker replies are always a single JSON line.
            let line = commands::run_job(job)?.to_json()?;
            println!("{line}");
            return Ok(());
        }
        command => execute_command(command, &limits).await?,
    };

    let json_output = cli.global.json || config.general.default_output == OutputFormat::Json;
    let renderer = OutputRenderer::new(json_output, config.general.color);
    renderer.render(&output)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute a snapshot subcommand
async fn execute_command(
    command: Commands,
    limits: &StateLimits,
) -> Result<CommandOutput, CliError> {
    let Some(source) = command.source() else {
        return Err(CliError::InvalidArguments(
            "command does not read a snapshot".to_string(),
        ));
    };
    let mut state = load_state(source, limits).await?;

    let output = match command {
        Commands::Detect { .. } => commands::detect(&state)?,
        Commands::Rag { .. } => commands::rag(&state)?,
        Commands::Resolve { all: true, .. } => commands::resolve_until_safe(&state)?,
        Commands::Resolve { victim, .. } => commands::resolve(&state, victim)?,
        Commands::Simulate {
            process,
            resource,
            amount,
            ..
        } => commands::simulate_request(
            &mut state,
            RequestArg::Request(ResourceRequest::new(process, resource, amount)),
        )?,
        Commands::Step {
            once: false,
            ..
        } => commands::step_log(&state)?,
        Commands::Step { resume, .. } => {
            let resume = match resume {
                Some(path) => Some(load_step_state(&path).await?),
                None => None,
            };
            commands::step_once(&state, resume)?
        }
        Commands::State { .. } => commands::show_state(state)?,
        Commands::Worker { .. } => {
            return Err(CliError::InvalidArguments(
                "worker jobs are handled separately".to_string(),
            ))
        }
    };
    Ok(output)
}

/// Resolve the snapshot for a subcommand: scenario, file or stdin
async fn load_state(source: &InputArgs, limits: &StateLimits) -> Result<SystemState, CliError> {
    if let Some(name) = &source.scenario {
        let scenario: Scenario = name.parse()?;
        debug!(scenario = scenario.name(), "using built-in scenario");
        let state = scenario.state();
        state.validate(limits)?;
        return Ok(state);
    }

    let text = read_input(source.input.as_deref()).await?;
    Ok(protocol::parse_state(&text, limits)?)
}

/// Read all of `path`, or stdin when no path is given
async fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path).into()),
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            Ok(text)
        }
    }
}

async fn load_step_state(path: &Path) -> Result<StepState, CliError> {
    let text = read_input(Some(path)).await?;
    Ok(serde_json::from_str(&text)?)
}

/// Initialize tracing on stderr so stdout carries only results
fn init_tracing(debug_enabled: bool, json_logs: bool) {
    let default_filter = if debug_enabled {
        "debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    if json_logs {
        builder.json().init();
    } else {
        builder.with_target(debug_enabled).init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) -> Result<(), CliError> {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if global.json {
        config.general.default_output = OutputFormat::Json;
    }
    if let Some(max) = global.max_processes {
        config.limits.max_processes = max;
    }
    if let Some(max) = global.max_resources {
        config.limits.max_resources = max;
    }

    config.validate()?;
    Ok(())
}
