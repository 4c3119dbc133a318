//! Config Commands
//!
//! Commands for inspecting the engine policy.

use clap::Subcommand;
use std::path::PathBuf;

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective policy
    Show,

    /// Validate a policy file
    Check {
        /// Policy file; falls back to --policy
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Default configuration values
pub mod defaults {
    /// Default listen host
    pub const HOST: &str = "0.0.0.0";
    /// Default listen port
    pub const PORT: u16 = 3000;
    /// Default sweep interval (seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 60;
    /// Default log filter
    pub const LOG_FILTER: &str = "ndr_cli=info,ndr_engine=info,ndr_api=info";
    /// Log filter with --verbose
    pub const VERBOSE_LOG_FILTER: &str =
        "ndr_cli=debug,ndr_engine=debug,ndr_api=debug,tower_http=debug";
}
