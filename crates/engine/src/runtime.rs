// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime that owns the collaborators and exposes ticker operations

use crate::cache::{CachedTicker, TickerCache};
use crate::error::EngineError;
use crate::regenerate::{RegenerationOutcome, SkipReason};
use crate::sweep::SweepReport;
use crate::synchronize::SyncReport;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tk_adapters::{AlarmScheduler, RefreshSignal, TickerStore};
use tk_core::config::to_chrono;
use tk_core::{
    AlarmId, Clock, EngineConfig, Expander, IdGen, RateLimiter, Ticker, TickerId, Window,
};

/// Runtime tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Minimum spacing between non-forced regenerations of one ticker
    pub cooldown: chrono::Duration,
    /// Future-occurrence horizon that keeps a ticker alive during synchronization
    pub sync_lookahead: chrono::Duration,
    /// Horizon of the cleanup sweep
    pub cleanup_lookahead: chrono::Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for RuntimeConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            cooldown: to_chrono(config.cooldown),
            sync_lookahead: to_chrono(config.sync_lookahead),
            cleanup_lookahead: to_chrono(config.cleanup_lookahead),
        }
    }
}

/// Runtime adapter dependencies
pub struct RuntimeDeps<A, S, R> {
    pub scheduler: A,
    pub store: S,
    pub refresh: R,
}

/// Event that asks the runtime to bring alarms up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The app returned to the foreground
    Foreground,
    /// The system time zone changed; every expansion is stale
    TimezoneChanged,
    /// Periodic background refresh
    BackgroundTick,
    /// A ticker may have fallen below its live alarm floor
    LowInstanceCount,
    /// The user asked for a refresh
    Manual,
    CleanupSweep,
}

/// Aggregate result of regenerating many tickers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerationSummary {
    pub applied: usize,
    pub skipped: usize,
    pub failed: Vec<TickerId>,
}

impl RegenerationSummary {
    fn record(&mut self, id: &TickerId, result: &Result<RegenerationOutcome, EngineError>) {
        match result {
            Ok(RegenerationOutcome::Applied { .. }) => self.applied += 1,
            Ok(RegenerationOutcome::Skipped(_)) => self.skipped += 1,
            Err(_) => self.failed.push(id.clone()),
        }
    }

    pub fn merge(&mut self, other: RegenerationSummary) {
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.failed.extend(other.failed);
    }
}

/// What a trigger ended up running
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerReport {
    pub sync: Option<SyncReport>,
    pub regeneration: Option<RegenerationSummary>,
    pub sweep: Option<SweepReport>,
}

/// Runtime that coordinates regeneration, synchronization and the cleanup sweep
pub struct Runtime<A, S, R, C: Clock, I: IdGen, Tz: TimeZone = Utc> {
    pub(crate) scheduler: A,
    pub(crate) store: S,
    pub(crate) refresh: R,
    pub(crate) clock: C,
    pub(crate) id_gen: I,
    pub(crate) expander: Expander<Tz>,
    pub(crate) limiter: RateLimiter<C>,
    pub(crate) cache: Mutex<TickerCache>,
    /// Serializes synchronization and the cleanup sweep
    pub(crate) reconcile: tokio::sync::Mutex<()>,
    pub(crate) config: RuntimeConfig,
}

impl<A, S, R, C, I, Tz> Runtime<A, S, R, C, I, Tz>
where
    A: AlarmScheduler,
    S: TickerStore,
    R: RefreshSignal,
    C: Clock,
    I: IdGen,
    Tz: TimeZone + Send + Sync + 'static,
{
    /// Create a new runtime
    pub fn new(
        deps: RuntimeDeps<A, S, R>,
        expander: Expander<Tz>,
        clock: C,
        id_gen: I,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            scheduler: deps.scheduler,
            store: deps.store,
            refresh: deps.refresh,
            limiter: RateLimiter::new(config.cooldown, clock.clone()),
            clock,
            id_gen,
            expander,
            cache: Mutex::new(TickerCache::new()),
            reconcile: tokio::sync::Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn expander(&self) -> &Expander<Tz> {
        &self.expander
    }

    pub fn limiter(&self) -> &RateLimiter<C> {
        &self.limiter
    }

    /// Cached tickers ordered by id
    pub fn tickers(&self) -> Vec<CachedTicker> {
        self.cache_lock().snapshot()
    }

    pub fn cached(&self, id: &TickerId) -> Option<CachedTicker> {
        self.cache_lock().get(id).cloned()
    }

    /// Tickers as persisted, ordered by id
    pub async fn stored_tickers(&self) -> Result<Vec<Ticker>, EngineError> {
        let mut tickers = self.store.fetch_all().await.map_err(EngineError::StoreQuery)?;
        tickers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tickers)
    }

    pub(crate) fn cache_lock(&self) -> std::sync::MutexGuard<'_, TickerCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn persist(&self, ticker: &Ticker) -> Result<(), EngineError> {
        self.store
            .insert(ticker)
            .await
            .map_err(EngineError::PersistenceFailure)?;
        self.store.save().await.map_err(EngineError::PersistenceFailure)
    }

    async fn load(&self, id: &TickerId) -> Result<Ticker, EngineError> {
        self.store
            .fetch(id)
            .await
            .map_err(EngineError::StoreQuery)?
            .ok_or_else(|| EngineError::TickerNotFound(id.clone()))
    }

    fn validate(ticker: &Ticker) -> Result<(), EngineError> {
        match &ticker.schedule {
            Some(schedule) => {
                schedule
                    .validate()
                    .map_err(|e| EngineError::InvalidConfiguration {
                        id: ticker.id.clone(),
                        reason: e.to_string(),
                    })
            }
            None => Ok(()),
        }
    }

    /// Persist a new ticker and materialize its first alarms
    pub async fn add_ticker(&self, ticker: Ticker) -> Result<RegenerationOutcome, EngineError> {
        Self::validate(&ticker)?;
        let mut ticker = ticker;
        ticker.set_schedule(ticker.schedule.clone());

        self.persist(&ticker).await?;
        self.cache_lock().update(ticker.clone(), 0);
        self.refresh.notify();
        tracing::info!(ticker = %ticker.id, label = %ticker.label, "ticker added");

        if ticker.schedule.is_none() || !ticker.is_enabled {
            return Ok(RegenerationOutcome::Skipped(SkipReason::NotSchedulable));
        }
        self.regenerate_tracked(ticker, false).await
    }

    /// Replace an existing ticker's definition and rebuild its alarms
    pub async fn update_ticker(&self, ticker: Ticker) -> Result<RegenerationOutcome, EngineError> {
        Self::validate(&ticker)?;
        let existing = self.load(&ticker.id).await?;

        let mut ticker = ticker;
        ticker.set_schedule(ticker.schedule.clone());
        ticker.generated_instance_ids = existing.generated_instance_ids;

        self.persist(&ticker).await?;
        self.limiter.clear_history(&ticker.id);
        tracing::info!(ticker = %ticker.id, "ticker updated");

        if ticker.schedule.is_none() {
            let (_, live) = self.cancel_owned(&ticker).await;
            ticker.generated_instance_ids.clear();
            self.persist(&ticker).await?;
            self.cache_lock().update(ticker, live);
            self.refresh.notify();
            return Ok(RegenerationOutcome::Skipped(SkipReason::NotSchedulable));
        }
        self.cache_lock().update(ticker.clone(), 0);
        self.refresh.notify();
        self.regenerate_tracked(ticker, true).await
    }

    /// Cancel a ticker's alarms and delete it. Returns the number of alarms cancelled.
    pub async fn remove_ticker(&self, id: &TickerId) -> Result<usize, EngineError> {
        let ticker = self.load(id).await?;
        let (cancelled, _) = self.cancel_owned(&ticker).await;

        self.store
            .delete(id)
            .await
            .map_err(EngineError::PersistenceFailure)?;
        self.store.save().await.map_err(EngineError::PersistenceFailure)?;
        self.cache_lock().remove(id);
        self.limiter.clear_history(id);
        self.refresh.notify();

        tracing::info!(ticker = %id, cancelled, "ticker removed");
        Ok(cancelled)
    }

    /// Best-effort cancel of every alarm `ticker` owns.
    ///
    /// Returns `(cancelled, remaining)`.
    async fn cancel_owned(&self, ticker: &Ticker) -> (usize, usize) {
        let owned: Vec<AlarmId> = match self.scheduler.list_instances().await {
            Ok(instances) => instances
                .into_iter()
                .filter(|i| ticker.owns(&i.id))
                .map(|i| i.id)
                .collect(),
            Err(e) => {
                tracing::warn!(ticker = %ticker.id, error = %e, "listing alarms failed, cancelling by recorded ids");
                ticker.generated_instance_ids.iter().cloned().collect()
            }
        };

        let mut remaining = 0;
        for id in &owned {
            if let Err(e) = self.scheduler.cancel(id).await {
                tracing::warn!(ticker = %ticker.id, alarm = %id, error = %e, "cancel failed");
                remaining += 1;
            }
        }
        (owned.len() - remaining, remaining)
    }

    /// Regenerate one stored ticker
    pub async fn regenerate_ticker(
        &self,
        id: &TickerId,
        force: bool,
    ) -> Result<RegenerationOutcome, EngineError> {
        let ticker = self.load(id).await?;
        self.regenerate_tracked(ticker, force).await
    }

    /// Run the orchestrator and record a failure on the ticker
    async fn regenerate_tracked(
        &self,
        ticker: Ticker,
        force: bool,
    ) -> Result<RegenerationOutcome, EngineError> {
        let result = self.regenerate(&ticker, force).await;
        if let Err(e) = &result {
            tracing::warn!(ticker = %ticker.id, error = %e, "regeneration failed");
            let mut failed = ticker;
            failed.mark_regeneration_failed();
            if let Err(e) = self.persist(&failed).await {
                tracing::error!(ticker = %failed.id, error = %e, "recording regeneration failure");
            }
            let mut cache = self.cache_lock();
            let live = cache.live_count(&failed.id);
            cache.update(failed, live);
        }
        result
    }

    /// Regenerate every enabled, scheduled ticker; per-ticker failures are logged
    pub async fn regenerate_all(&self, force: bool) -> Result<RegenerationSummary, EngineError> {
        let tickers = self.store.fetch_all().await.map_err(EngineError::StoreQuery)?;
        let mut summary = RegenerationSummary::default();

        for ticker in tickers {
            if ticker.schedule.is_none() || !ticker.is_enabled {
                continue;
            }
            let id = ticker.id.clone();
            let result = self.regenerate_tracked(ticker, force).await;
            summary.record(&id, &result);
        }

        tracing::info!(
            applied = summary.applied,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            force,
            "regenerated all tickers"
        );
        Ok(summary)
    }

    /// Regenerate tickers whose live alarm count fell below their strategy floor.
    ///
    /// The floor is capped by how many occurrences the strategy window can
    /// actually hold, so sparse schedules are not perpetually "low". Each
    /// ticker passes through the rate limiter; the staleness check is skipped.
    pub async fn replenish_low(&self) -> Result<RegenerationSummary, EngineError> {
        let instances = self
            .scheduler
            .list_instances()
            .await
            .map_err(EngineError::SchedulerQuery)?;
        let tickers = self.store.fetch_all().await.map_err(EngineError::StoreQuery)?;
        let now = self.clock.now();

        let mut live: HashMap<TickerId, usize> = HashMap::new();
        for ticker in &tickers {
            let count = instances.iter().filter(|i| ticker.owns(&i.id)).count();
            live.insert(ticker.id.clone(), count);
        }

        let mut summary = RegenerationSummary::default();
        for ticker in tickers {
            let Some(schedule) = ticker.schedule.as_ref() else {
                continue;
            };
            if !ticker.is_enabled {
                continue;
            }

            let params = ticker.strategy();
            let capacity = self
                .expander
                .expand_limited(
                    schedule,
                    Window::starting_at(now, params.window),
                    Some(params.minimum_alarm_count),
                )
                .len();
            let count = live.get(&ticker.id).copied().unwrap_or(0);
            if count >= capacity || !ticker.is_low(count) {
                continue;
            }
            if !self.limiter.try_acquire(&ticker.id, false) {
                tracing::debug!(ticker = %ticker.id, count, "low but rate limited");
                summary.skipped += 1;
                continue;
            }

            tracing::info!(ticker = %ticker.id, count, floor = capacity, "replenishing");
            let id = ticker.id.clone();
            let result = self.regenerate_tracked(ticker, true).await;
            summary.record(&id, &result);
        }
        Ok(summary)
    }

    /// Dispatch a trigger to the passes it implies
    pub async fn handle_trigger(&self, trigger: Trigger) -> Result<TriggerReport, EngineError> {
        tracing::debug!(?trigger, "handling trigger");
        let mut report = TriggerReport::default();

        match trigger {
            Trigger::Foreground | Trigger::BackgroundTick => {
                report.sync = Some(self.synchronize().await);
                let mut summary = self.regenerate_all(false).await?;
                summary.merge(self.replenish_low().await?);
                report.regeneration = Some(summary);
            }
            Trigger::TimezoneChanged => {
                self.limiter.clear_all();
                report.regeneration = Some(self.regenerate_all(true).await?);
                report.sync = Some(self.synchronize().await);
            }
            Trigger::Manual => {
                report.sync = Some(self.synchronize().await);
                report.regeneration = Some(self.regenerate_all(true).await?);
            }
            Trigger::LowInstanceCount => {
                report.regeneration = Some(self.replenish_low().await?);
            }
            Trigger::CleanupSweep => {
                report.sweep = Some(self.sweep().await);
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
