//! NDR CLI Entry Point
//!
//! Configuration is loaded from environment variables (via .env file).
//! Command-line arguments override environment variables.
//!
//! Usage:
//!   ndr start      - Start the API server and expiry sweeper
//!   ndr evaluate   - Evaluate proof or replies offline
//!   ndr config     - Show or check the policy

use clap::Parser;
use ndr_cli::commands::config::defaults;
use ndr_cli::{handler, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = handler::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Initialize logging with tracing
fn init_logging(verbose: bool) {
    let fallback = if verbose {
        defaults::VERBOSE_LOG_FILTER
    } else {
        defaults::LOG_FILTER
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
