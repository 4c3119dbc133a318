//! NDR CLI - Command Line Interface
//!
//! Runs the NDR verification service and evaluates courier proof offline
//! against the same policy.
//!
//! # Usage
//!
//! ```text
//! ndr [OPTIONS] <COMMAND>
//!
//! Commands:
//!   start     Start the NDR API server with the expiry sweeper
//!   evaluate  Evaluate proof offline
//!   config    Policy configuration
//!
//! Options:
//!       --policy <FILE>    Policy file (JSON) [env: NDR_POLICY_FILE]
//!   -f, --format <FORMAT>  Output format (json, table, plain) [default: table]
//!   -v, --verbose          Enable verbose output
//! ```
//!
//! # Examples
//!
//! ```text
//! ndr start --port 8080 --sweep-interval-secs 30
//! ndr evaluate ndr --input attempt.json
//! ndr evaluate reply --text "change address"
//! ndr --policy policy.json config show
//! ```

pub mod commands;
pub mod error;
pub mod handler;
pub mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use error::{CliError, CliResult};

/// NDR CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
