// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticker commands

use super::open_exclusive;
use super::schedule::ScheduleArgs;
use anyhow::{bail, Context};
use clap::Args;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tk_adapters::{AlarmScheduler, FileAlarmScheduler, WalTickerStore};
use tk_core::{Ticker, TickerId};
use tk_daemon::Config;
use tk_engine::{RegenerationOutcome, SkipReason};

#[derive(Args)]
pub struct AddArgs {
    /// Text shown when the alarm fires
    pub label: String,
    /// Ticker id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,
    /// Store the ticker without materializing alarms
    #[arg(long)]
    pub disabled: bool,
    #[command(flatten)]
    pub schedule: ScheduleArgs,
}

#[derive(Args)]
pub struct ListArgs {
    /// Print tickers as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct TickerInfo {
    id: String,
    label: String,
    enabled: bool,
    schedule: String,
    live: usize,
}

impl fmt::Display for TickerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<38} {:<4} {:>5}  {:<32} {}",
            self.id,
            if self.enabled { "on" } else { "off" },
            self.live,
            self.schedule,
            self.label
        )
    }
}

pub async fn add(config: &Config, args: AddArgs) -> anyhow::Result<()> {
    let schedule = args.schedule.parse()?;
    let id = args.id.map_or_else(TickerId::generate, TickerId::from);
    let mut ticker = Ticker::new(id.clone(), args.label, schedule);
    if args.disabled {
        ticker = ticker.disabled();
    }

    let open = open_exclusive(config)?;
    if open.runtime.stored_tickers().await?.iter().any(|t| t.id == ticker.id) {
        bail!("ticker {id} already exists");
    }
    let outcome = open.runtime.add_ticker(ticker).await?;
    println!("{id}: {}", describe(&outcome));
    Ok(())
}

/// Reads the log and alarm files without opening either for writing, so it
/// runs safely alongside the daemon
pub async fn list(config: &Config, args: ListArgs) -> anyhow::Result<()> {
    let tickers = WalTickerStore::load_snapshot(&config.wal_path).context("reading tickers")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tickers)?);
        return Ok(());
    }

    if tickers.is_empty() {
        println!("No tickers found.");
        return Ok(());
    }

    let instances = FileAlarmScheduler::new(&config.alarms_path)
        .list_instances()
        .await
        .context("reading materialized alarms")?;
    let mut live: HashMap<&str, usize> = HashMap::new();
    for ticker in &tickers {
        let count = instances.iter().filter(|i| ticker.owns(&i.id)).count();
        live.insert(ticker.id.as_str(), count);
    }

    println!(
        "{:<38} {:<4} {:>5}  {:<32} LABEL",
        "ID", "ON", "LIVE", "SCHEDULE"
    );
    println!("{}", "-".repeat(90));
    for ticker in &tickers {
        let info = TickerInfo {
            id: ticker.id.to_string(),
            label: ticker.label.clone(),
            enabled: ticker.is_enabled,
            schedule: ticker
                .schedule
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            live: live.get(ticker.id.as_str()).copied().unwrap_or_default(),
        };
        println!("{info}");
    }
    Ok(())
}

pub async fn remove(config: &Config, id: &str) -> anyhow::Result<()> {
    let open = open_exclusive(config)?;
    let cancelled = open.runtime.remove_ticker(&TickerId::new(id)).await?;
    println!("{id}: removed, {cancelled} alarm(s) cancelled");
    Ok(())
}

pub async fn set_enabled(config: &Config, id: &str, enabled: bool) -> anyhow::Result<()> {
    let open = open_exclusive(config)?;
    let id = TickerId::new(id);
    let Some(mut ticker) = open
        .runtime
        .stored_tickers()
        .await?
        .into_iter()
        .find(|t| t.id == id)
    else {
        bail!("ticker {id} not found");
    };
    if ticker.is_enabled == enabled {
        println!("{id}: unchanged");
        return Ok(());
    }

    ticker.is_enabled = enabled;
    let outcome = open.runtime.update_ticker(ticker).await?;
    println!("{id}: {}", describe(&outcome));
    Ok(())
}

pub fn describe(outcome: &RegenerationOutcome) -> String {
    match outcome {
        RegenerationOutcome::Applied { cancelled, created } => {
            format!("{created} alarm(s) created, {cancelled} cancelled")
        }
        RegenerationOutcome::Skipped(SkipReason::UpToDate) => "up to date".to_string(),
        RegenerationOutcome::Skipped(SkipReason::NotSchedulable) => "no alarms".to_string(),
        RegenerationOutcome::Skipped(SkipReason::RateLimited { retry_after }) => {
            format!("rate limited, retry after {retry_after}")
        }
    }
}
