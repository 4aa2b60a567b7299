// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: paths, startup, alarm firing, shutdown.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{FixedOffset, Local, Offset};
use fs2::FileExt;
use thiserror::Error;
use tk_adapters::{
    ChannelRefreshSignal, FileAlarmScheduler, SchedulerError, StoreError, TracedAlarmScheduler,
    TracedTickerStore, WalTickerStore,
};
use tk_core::{Clock, ConfigError, EngineConfig, Expander, SystemClock, UuidIdGen};
use tk_engine::{EngineError, Runtime, RuntimeConfig, RuntimeDeps, Trigger};
use tokio::sync::watch;
use tracing::{info, warn};

/// Environment variable overriding the state directory
pub const STATE_DIR_ENV: &str = "TICKER_STATE_DIR";

/// Runtime with concrete adapter types (wrapped with tracing)
pub type DaemonRuntime = Runtime<
    TracedAlarmScheduler<FileAlarmScheduler>,
    TracedTickerStore<WalTickerStore>,
    ChannelRefreshSignal,
    SystemClock,
    UuidIdGen,
    Local,
>;

/// On-disk locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub state_dir: PathBuf,
    /// Engine tunables (TOML)
    pub config_path: PathBuf,
    /// Ticker write-ahead log
    pub wal_path: PathBuf,
    /// Materialized alarms
    pub alarms_path: PathBuf,
    /// Daemon log file
    pub log_path: PathBuf,
    /// Lock/PID file
    pub lock_path: PathBuf,
}

impl Config {
    /// Paths rooted at `state_dir`
    pub fn in_dir(state_dir: &Path) -> Self {
        Self {
            state_dir: state_dir.to_path_buf(),
            config_path: state_dir.join("config.toml"),
            wal_path: state_dir.join("tickers.wal"),
            alarms_path: state_dir.join("alarms.json"),
            log_path: state_dir.join("tickerd.log"),
            lock_path: state_dir.join("tickerd.pid"),
        }
    }

    /// Resolve from `$TICKER_STATE_DIR`, else the platform data directory
    pub fn from_env() -> Result<Self, LifecycleError> {
        if let Some(dir) = std::env::var_os(STATE_DIR_ENV) {
            return Ok(Self::in_dir(Path::new(&dir)));
        }
        let data = dirs::data_dir().ok_or(LifecycleError::NoStateDir)?;
        Ok(Self::in_dir(&data.join("ticker")))
    }

    /// Load engine tunables; defaults when the file is missing
    pub fn engine(&self) -> Result<EngineConfig, LifecycleError> {
        Ok(EngineConfig::load(&self.config_path)?)
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A runtime together with the handles the daemon drives directly
pub struct OpenRuntime {
    pub runtime: DaemonRuntime,
    pub alarms: FileAlarmScheduler,
    pub refresh: watch::Receiver<u64>,
}

/// Assemble a runtime over the state directory without taking the daemon lock
pub fn open_runtime(config: &Config, engine: &EngineConfig) -> Result<OpenRuntime, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let store = WalTickerStore::open(&config.wal_path)?;
    let alarms = FileAlarmScheduler::new(&config.alarms_path);
    let (refresh, refresh_rx) = ChannelRefreshSignal::new();

    let runtime = Runtime::new(
        RuntimeDeps {
            scheduler: TracedAlarmScheduler::new(alarms.clone()),
            store: TracedTickerStore::new(store),
            refresh,
        },
        Expander::new(Local),
        SystemClock,
        UuidIdGen,
        RuntimeConfig::from(engine),
    );

    Ok(OpenRuntime {
        runtime,
        alarms,
        refresh: refresh_rx,
    })
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    pub engine: EngineConfig,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub runtime: DaemonRuntime,
    /// Direct handle for firing due alarms
    pub alarms: FileAlarmScheduler,
    pub refresh: watch::Receiver<u64>,
    /// Local UTC offset seen at the last check
    offset: FixedOffset,
    pub start_time: Instant,
}

impl DaemonState {
    /// Fire every alarm whose time has come. Returns how many fired.
    ///
    /// Fired alarms leave the scheduler, so a replenish pass follows.
    pub async fn fire_due(&mut self) -> Result<usize, LifecycleError> {
        let due = self.alarms.take_due(SystemClock.now()).await?;
        for alarm in &due {
            info!(
                alarm = %alarm.id,
                ticker = %alarm.request.ticker_id,
                label = %alarm.request.label,
                fire_at = %alarm.request.fire_at,
                "alarm fired"
            );
        }
        if !due.is_empty() {
            self.runtime.handle_trigger(Trigger::LowInstanceCount).await?;
        }
        Ok(due.len())
    }

    /// Whether the local UTC offset moved since the last call
    pub fn timezone_changed(&mut self) -> bool {
        let offset = current_offset();
        if offset == self.offset {
            return false;
        }
        info!(from = %self.offset, to = %offset, "local offset changed");
        self.offset = offset;
        true
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!(uptime_s = self.start_time.elapsed().as_secs(), "Daemon shutdown complete");
        Ok(())
    }
}

/// Whether a daemon currently holds the lock for `config`
pub fn daemon_running(config: &Config) -> bool {
    let Ok(file) = File::open(&config.lock_path) else {
        return false;
    };
    match FileExt::try_lock_shared(&file) {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            false
        }
        Err(_) => true,
    }
}

fn current_offset() -> FixedOffset {
    Local::now().offset().fix()
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Lock before touching any other state; a live daemon's pid stays intact
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&config.lock_path)?;
    FileExt::try_lock_exclusive(&lock_file).map_err(LifecycleError::LockFailed)?;

    match startup_inner(config, lock_file).await {
        Ok(state) => Ok(state),
        Err(e) => {
            if config.lock_path.exists() {
                let _ = std::fs::remove_file(&config.lock_path);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config, lock_file: File) -> Result<DaemonState, LifecycleError> {
    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let engine = config.engine()?;
    let OpenRuntime {
        runtime,
        alarms,
        refresh,
    } = open_runtime(config, &engine)?;

    // Bring alarms in line with whatever changed while we were down
    match runtime.handle_trigger(Trigger::Foreground).await {
        Ok(report) => {
            if let Some(sync) = &report.sync {
                info!(
                    retained = sync.retained,
                    deleted = sync.deleted.len(),
                    cancelled = sync.cancelled,
                    "startup synchronization"
                );
            }
        }
        Err(e) => warn!(error = %e, "startup regeneration failed"),
    }

    info!(state_dir = %config.state_dir.display(), "Daemon started");

    Ok(DaemonState {
        config: config.clone(),
        engine,
        lock_file,
        runtime,
        alarms,
        refresh,
        offset: current_offset(),
        start_time: Instant::now(),
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
