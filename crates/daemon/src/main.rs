// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticker Daemon (tickerd)
//!
//! Background process that keeps materialized alarms in line with tickers.
//! Prints `READY` on stdout once the startup reconciliation has run.

use std::path::PathBuf;
use std::time::Duration;

use tk_daemon::{startup, Config, DaemonState, LifecycleError};
use tk_engine::Trigger;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(dir) => Config::in_dir(&PathBuf::from(dir)),
        None => Config::from_env()?,
    };

    let _log_guard = init_file_logging(&config)?;
    info!(state_dir = %config.state_dir.display(), "tickerd starting");

    let mut daemon = match startup(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            // the non-blocking writer may drop this on exit
            record_startup_failure(&config, &e);
            error!(error = %e, "startup failed");
            return Err(e.into());
        }
    };

    println!("READY");
    let signal_name = serve(&mut daemon).await?;
    info!(signal = signal_name, "shutting down");
    daemon.shutdown().await?;
    info!("tickerd stopped");
    Ok(())
}

/// Drive periodic triggers until a termination signal arrives
async fn serve(daemon: &mut DaemonState) -> Result<&'static str, LifecycleError> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let mut alarm_check = every(daemon.engine.alarm_check_interval);
    let mut background = every(daemon.engine.background_interval);
    let mut sweep = every(daemon.engine.sweep_interval);

    loop {
        tokio::select! {
            _ = alarm_check.tick() => {
                if let Err(e) = daemon.fire_due().await {
                    error!(error = %e, "firing due alarms failed");
                }
            }
            _ = background.tick() => {
                let trigger = if daemon.timezone_changed() {
                    Trigger::TimezoneChanged
                } else {
                    Trigger::BackgroundTick
                };
                run_trigger(daemon, trigger).await;
            }
            _ = sweep.tick() => run_trigger(daemon, Trigger::CleanupSweep).await,
            Ok(()) = daemon.refresh.changed() => {
                let generation = *daemon.refresh.borrow_and_update();
                debug!(generation, "tickers changed");
            }
            _ = sigterm.recv() => return Ok("SIGTERM"),
            _ = sigint.recv() => return Ok("SIGINT"),
        }
    }
}

async fn run_trigger(daemon: &DaemonState, trigger: Trigger) {
    match daemon.runtime.handle_trigger(trigger).await {
        Ok(report) => {
            if let Some(summary) = report.regeneration.filter(|s| !s.failed.is_empty()) {
                warn!(?trigger, failed = summary.failed.len(), "some tickers failed to regenerate");
            }
        }
        Err(e) => error!(?trigger, error = %e, "trigger failed"),
    }
}

/// Interval whose first tick lands one period from now
fn every(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(100));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Append a startup failure to the log file directly
fn record_startup_failure(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path);
    if let Ok(mut file) = file {
        let _ = writeln!(file, "ERROR tickerd failed to start: {error}");
    }
}

fn init_file_logging(config: &Config) -> Result<WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = config.log_path.parent().ok_or(LifecycleError::NoStateDir)?;
    let name = config.log_path.file_name().ok_or(LifecycleError::NoStateDir)?;
    std::fs::create_dir_all(dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(guard)
}
