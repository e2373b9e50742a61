//! Command line interface definition

use bankr_types::ColorChoice;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// bankr - Deadlock detection and avoidance with the Banker's algorithm
#[derive(Parser)]
#[command(name = "bankr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deadlock detection and avoidance with the Banker's algorithm")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Largest accepted number of processes
    #[arg(long, global = true, value_name = "N")]
    pub max_processes: Option<usize>,

    /// Largest accepted number of resource types
    #[arg(long, global = true, value_name = "N")]
    pub max_resources: Option<usize>,
}

/// Where a subcommand gets its snapshot from
#[derive(Args, Clone, Debug)]
pub struct InputArgs {
    /// Read the snapshot from a file instead of stdin
    #[arg(short, long, value_name = "FILE", conflicts_with = "scenario")]
    pub input: Option<PathBuf>,

    /// Use a built-in sample snapshot (safe, deadlock)
    #[arg(short, long, value_name = "NAME")]
    pub scenario: Option<String>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the safety algorithm and report the verdict
    Detect {
        #[command(flatten)]
        source: InputArgs,
    },

    /// Build the resource-allocation graph and check it for cycles
    #[command(alias = "graph")]
    Rag {
        #[command(flatten)]
        source: InputArgs,
    },

    /// Terminate a deadlocked process and re-evaluate
    Resolve {
        #[command(flatten)]
        source: InputArgs,

        /// Process to terminate (default: the one holding the fewest units)
        #[arg(long, conflicts_with = "all")]
        victim: Option<usize>,

        /// Keep terminating until the state is safe
        #[arg(long)]
        all: bool,
    },

    /// Check whether granting a request keeps the system safe
    #[command(alias = "sim")]
    Simulate {
        #[command(flatten)]
        source: InputArgs,

        /// Requesting process
        process: usize,

        /// Requested resource type
        resource: usize,

        /// Units requested
        amount: u32,
    },

    /// Walk through the safety algorithm one discharge at a time
    Step {
        #[command(flatten)]
        source: InputArgs,

        /// Perform a single step and print the state to resume from
        #[arg(long)]
        once: bool,

        /// Step state (JSON) produced by a previous `--once` run
        #[arg(long, value_name = "FILE", requires = "once")]
        resume: Option<PathBuf>,
    },

    /// Show the snapshot with its derived need matrix
    State {
        #[command(flatten)]
        source: InputArgs,
    },

    /// Answer one protocol job read from stdin with a single JSON line
    Worker {
        /// Read the job from a file instead of stdin
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
}

impl Commands {
    /// Snapshot source, for every command except `worker`
    pub fn source(&self) -> Option<&InputArgs> {
        match self {
            Commands::Detect { source }
            | Commands::Rag { source }
            | Commands::Resolve { source, .. }
            | Commands::Simulate { source, .. }
            | Commands::Step { source, .. }
            | Commands::State { source } => Some(source),
            Commands::Worker { .. } => None,
        }
    }
}
