// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronization: reconcile stored tickers with the scheduler's alarms
//!
//! The scheduler's alarm list is the source of truth. Alarms with no owner,
//! or owned by a disabled ticker, are cancelled. Tickers with no kept alarm,
//! no occurrence within the lookahead and no pending regeneration are
//! deleted. The cache is rebuilt from what remains.

use crate::runtime::Runtime;
use chrono::TimeZone;
use std::collections::{BTreeSet, HashMap};
use tk_adapters::{AlarmScheduler, RefreshSignal, TickerStore};
use tk_core::{AlarmId, Clock, IdGen, Ticker, TickerId, Window};
use tracing::Instrument;

/// What a synchronization pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// A query failed and nothing was changed
    pub aborted: bool,
    pub cancelled: usize,
    pub cancel_failures: usize,
    pub deleted: Vec<TickerId>,
    /// Stale instance ids dropped from retained tickers
    pub pruned: usize,
    pub retained: usize,
    /// Store changes were saved (or there were none)
    pub persisted: bool,
}

impl SyncReport {
    fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }
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
    /// Run one synchronization pass. Failures are logged, never returned.
    pub async fn synchronize(&self) -> SyncReport {
        let _reconcile = self.reconcile.lock().await;
        let span = tracing::info_span!("synchronize");
        self.synchronize_locked().instrument(span).await
    }

    async fn synchronize_locked(&self) -> SyncReport {
        let instances = match self.scheduler.list_instances().await {
            Ok(instances) => instances,
            Err(e) => {
                tracing::warn!(error = %e, "scheduler query failed, skipping pass");
                return SyncReport::aborted();
            }
        };
        let tickers = match self.store.fetch_all().await {
            Ok(tickers) => tickers,
            Err(e) => {
                tracing::warn!(error = %e, "store query failed, skipping pass");
                return SyncReport::aborted();
            }
        };
        let now = self.clock.now();
        let mut report = SyncReport::default();

        // instance id -> index of owning ticker
        let mut owners: HashMap<&AlarmId, usize> = HashMap::new();
        let own_ids: Vec<AlarmId> = tickers
            .iter()
            .map(|t| AlarmId::new(t.id.as_str()))
            .collect();
        for (index, ticker) in tickers.iter().enumerate() {
            owners.entry(&own_ids[index]).or_insert(index);
            for id in &ticker.generated_instance_ids {
                owners.entry(id).or_insert(index);
            }
        }

        let mut kept: BTreeSet<AlarmId> = BTreeSet::new();
        let mut live: BTreeSet<AlarmId> = BTreeSet::new();
        for instance in &instances {
            let reason = match owners.get(&instance.id) {
                None => Some("orphan"),
                Some(&index) if !tickers[index].is_enabled => Some("ticker disabled"),
                Some(_) => None,
            };
            let Some(reason) = reason else {
                kept.insert(instance.id.clone());
                live.insert(instance.id.clone());
                continue;
            };
            match self.scheduler.cancel(&instance.id).await {
                Ok(()) => {
                    tracing::debug!(alarm = %instance.id, reason, "cancelled");
                    report.cancelled += 1;
                }
                Err(e) => {
                    tracing::warn!(alarm = %instance.id, reason, error = %e, "cancel failed");
                    report.cancel_failures += 1;
                    live.insert(instance.id.clone());
                }
            }
        }

        let horizon = Window::starting_at(now, self.config.sync_lookahead);
        let mut retained: Vec<(Ticker, usize)> = Vec::new();
        let mut dirty = false;

        for ticker in tickers {
            let owns_kept = kept.iter().any(|id| ticker.owns(id));
            let has_future = ticker
                .schedule
                .as_ref()
                .is_some_and(|s| self.expander.next_occurrence(s, horizon).is_some());
            let pending = ticker.needs_regeneration(now);

            if !(owns_kept || has_future || pending) {
                tracing::info!(ticker = %ticker.id, "deleting abandoned ticker");
                match self.store.delete(&ticker.id).await {
                    Ok(()) => {
                        self.limiter.clear_history(&ticker.id);
                        report.deleted.push(ticker.id);
                        dirty = true;
                        continue;
                    }
                    // still stored, so it stays cached
                    Err(e) => {
                        tracing::error!(ticker = %ticker.id, error = %e, "staging delete failed")
                    }
                }
            }

            let mut ticker = ticker;
            let before = ticker.generated_instance_ids.len();
            ticker.generated_instance_ids.retain(|id| live.contains(id));
            let pruned = before - ticker.generated_instance_ids.len();
            if pruned > 0 {
                tracing::debug!(ticker = %ticker.id, pruned, "pruned stale instance ids");
                report.pruned += pruned;
                match self.store.insert(&ticker).await {
                    Ok(()) => dirty = true,
                    Err(e) => tracing::error!(ticker = %ticker.id, error = %e, "staging prune failed"),
                }
            }

            let count = live.iter().filter(|id| ticker.owns(id)).count();
            retained.push((ticker, count));
        }

        report.retained = retained.len();
        report.persisted = true;
        if dirty {
            if let Err(e) = self.store.save().await {
                tracing::error!(error = %e, "saving synchronized tickers failed");
                report.persisted = false;
            }
        }

        self.cache_lock().rebuild(retained);
        self.refresh.notify();

        tracing::info!(
            instances = instances.len(),
            cancelled = report.cancelled,
            cancel_failures = report.cancel_failures,
            deleted = report.deleted.len(),
            pruned = report.pruned,
            retained = report.retained,
            "synchronized"
        );
        report
    }
}

#[cfg(test)]
#[path = "synchronize_tests.rs"]
mod tests;
