//! CLI Commands Module
//!
//! Command definitions for the NDR CLI.

pub mod config;
pub mod evaluate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// NDR verification and RTO prevention CLI
#[derive(Parser, Debug)]
#[command(name = "ndr")]
#[command(version)]
#[command(about = "NDR Verification & RTO Prevention")]
#[command(long_about = "Run the NDR verification service, or evaluate courier proof \
    offline against the same policy the service uses.")]
pub struct Cli {
    /// Policy file (JSON); defaults apply when omitted (env: NDR_POLICY_FILE)
    #[arg(long, env = "NDR_POLICY_FILE")]
    pub policy: Option<PathBuf>,

    /// Output format (json, table, plain)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Table format (human-readable)
    #[default]
    Table,
    /// Plain text
    Plain,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the NDR API server with the expiry sweeper
    Start {
        /// Host to bind to (env: NDR_API_HOST)
        #[arg(short = 'H', long, env = "NDR_API_HOST", default_value = config::defaults::HOST)]
        host: String,
        /// Port to listen on (env: NDR_API_PORT)
        #[arg(short, long, env = "NDR_API_PORT", default_value_t = config::defaults::PORT)]
        port: u16,
        /// Seconds between resolution expiry sweeps (env: NDR_SWEEP_INTERVAL_SECS)
        #[arg(
            long,
            env = "NDR_SWEEP_INTERVAL_SECS",
            default_value_t = config::defaults::SWEEP_INTERVAL_SECS
        )]
        sweep_interval_secs: u64,
    },

    /// Evaluate proof offline
    #[command(subcommand)]
    Evaluate(evaluate::EvaluateCommands),

    /// Policy configuration
    #[command(subcommand)]
    Config(config::ConfigCommands),
}
