// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tk - ticker CLI

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{passes, preview, ticker};
use std::path::PathBuf;
use tk_daemon::Config;

#[derive(Parser)]
#[command(
    name = "tk",
    version,
    about = "tk - recurring reminders kept in line with their alarms"
)]
struct Cli {
    /// State directory (defaults to $TICKER_STATE_DIR, then the platform data dir)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a ticker and materialize its alarms
    Add(ticker::AddArgs),
    /// List tickers
    List(ticker::ListArgs),
    /// Remove a ticker and cancel its alarms
    Remove {
        /// Ticker id
        id: String,
    },
    /// Enable a ticker
    Enable {
        /// Ticker id
        id: String,
    },
    /// Disable a ticker, cancelling its alarms
    Disable {
        /// Ticker id
        id: String,
    },
    /// Print the occurrences a schedule would produce
    Preview(preview::PreviewArgs),
    /// Regenerate one ticker, or all of them
    Regenerate(passes::RegenerateArgs),
    /// Reconcile tickers with materialized alarms
    Sync,
    /// Synchronize, then delete tickers with nothing left to fire
    Sweep,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let command = match cli.command {
        // Preview needs no state
        Commands::Preview(args) => return preview::handle(args),
        command => command,
    };

    let config = match cli.state_dir {
        Some(dir) => Config::in_dir(&dir),
        None => Config::from_env()?,
    };

    match command {
        Commands::Add(args) => ticker::add(&config, args).await,
        Commands::List(args) => ticker::list(&config, args).await,
        Commands::Remove { id } => ticker::remove(&config, &id).await,
        Commands::Enable { id } => ticker::set_enabled(&config, &id, true).await,
        Commands::Disable { id } => ticker::set_enabled(&config, &id, false).await,
        Commands::Regenerate(args) => passes::regenerate(&config, args).await,
        Commands::Sync => passes::sync(&config).await,
        Commands::Sweep => passes::sweep(&config).await,
        Commands::Preview(_) => Ok(()),
    }
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
