//! clr-sweep - Main Entry Point
//!
//! Runs one hyperparameter sweep over a named regression dataset.

use clap::Parser;
use clr_sweep::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clr_sweep=info".into()),
        )
        .init();

    let cli = Cli::parse();
    run(cli)
}
