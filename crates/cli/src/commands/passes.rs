// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation passes run on demand

use super::open_exclusive;
use super::ticker::describe;
use anyhow::bail;
use clap::Args;
use tk_core::TickerId;
use tk_daemon::Config;
use tk_engine::{SweepReport, SyncReport};

#[derive(Args)]
pub struct RegenerateArgs {
    /// Only regenerate this ticker
    pub id: Option<String>,
    /// Ignore freshness and the cooldown
    #[arg(long)]
    pub force: bool,
}

pub async fn regenerate(config: &Config, args: RegenerateArgs) -> anyhow::Result<()> {
    let open = open_exclusive(config)?;

    if let Some(id) = args.id {
        let outcome = open
            .runtime
            .regenerate_ticker(&TickerId::new(id.as_str()), args.force)
            .await?;
        println!("{id}: {}", describe(&outcome));
        return Ok(());
    }

    let summary = open.runtime.regenerate_all(args.force).await?;
    println!(
        "{} applied, {} skipped, {} failed",
        summary.applied,
        summary.skipped,
        summary.failed.len()
    );
    for id in &summary.failed {
        println!("  failed: {id}");
    }
    if !summary.failed.is_empty() {
        bail!("{} ticker(s) failed to regenerate", summary.failed.len());
    }
    Ok(())
}

pub async fn sync(config: &Config) -> anyhow::Result<()> {
    let open = open_exclusive(config)?;
    let report = open.runtime.synchronize().await;
    print_sync(&report)
}

pub async fn sweep(config: &Config) -> anyhow::Result<()> {
    let open = open_exclusive(config)?;
    // The sweep trusts cached live counts, which a sync pass fills in
    let sync = open.runtime.synchronize().await;
    print_sync(&sync)?;
    let report = open.runtime.sweep().await;
    print_sweep(&report)
}

fn print_sync(report: &SyncReport) -> anyhow::Result<()> {
    if report.aborted {
        bail!("synchronization aborted; see log for details");
    }
    println!(
        "sync: {} retained, {} deleted, {} alarm(s) cancelled, {} stale id(s) pruned",
        report.retained,
        report.deleted.len(),
        report.cancelled,
        report.pruned
    );
    if report.cancel_failures > 0 {
        println!("  {} cancel(s) failed", report.cancel_failures);
    }
    if !report.persisted {
        println!("  changes were not saved");
    }
    Ok(())
}

fn print_sweep(report: &SweepReport) -> anyhow::Result<()> {
    if report.aborted {
        bail!("sweep aborted; see log for details");
    }
    println!(
        "sweep: {} deleted, {} protected",
        report.deleted.len(),
        report.protected.len()
    );
    for id in &report.deleted {
        println!("  deleted: {id}");
    }
    Ok(())
}
