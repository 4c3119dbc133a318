//! Evaluate Commands
//!
//! Offline evaluation against the configured policy, without a running
//! service.

use clap::Subcommand;
use std::path::PathBuf;

/// Evaluate subcommands
#[derive(Subcommand, Debug)]
pub enum EvaluateCommands {
    /// Classify one NDR attempt from a JSON file with `order`, `attempt`
    /// and optional `proof`
    Ndr {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show how a customer reply would be interpreted
    Reply {
        /// Reply text
        #[arg(short, long)]
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        cmd: EvaluateCommands,
    }

    #[test]
    fn test_evaluate_ndr() {
        let args = TestCli::try_parse_from(["test", "ndr", "--input", "/tmp/ndr.json"]);
        assert!(args.is_ok());
    }

    #[test]
    fn test_evaluate_reply() {
        let args = TestCli::try_parse_from(["test", "reply", "--text", "change address"]);
        assert!(args.is_ok());
    }

    #[test]
    fn test_evaluate_ndr_requires_input() {
        assert!(TestCli::try_parse_from(["test", "ndr"]).is_err());
    }
}
