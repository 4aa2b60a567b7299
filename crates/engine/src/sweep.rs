// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cleanup sweep: drop scheduled tickers with nothing left to fire soon
//!
//! Runs under the same lock as synchronization. A ticker that the cache
//! shows owning live alarms is kept even with no occurrence in the sweep
//! horizon; synchronization decides its fate.

use crate::runtime::Runtime;
use chrono::TimeZone;
use tk_adapters::{AlarmScheduler, RefreshSignal, TickerStore};
use tk_core::{Clock, IdGen, TickerId, Window};
use tracing::Instrument;

/// What a sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub aborted: bool,
    pub deleted: Vec<TickerId>,
    /// Tickers with no occurrence in the horizon kept because they own live alarms
    pub protected: Vec<TickerId>,
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
    /// Delete scheduled tickers with no occurrence in the cleanup horizon
    pub async fn sweep(&self) -> SweepReport {
        let _reconcile = self.reconcile.lock().await;
        let span = tracing::info_span!("sweep");
        async {
            let tickers = match self.store.fetch_all().await {
                Ok(tickers) => tickers,
                Err(e) => {
                    tracing::warn!(error = %e, "store query failed, skipping sweep");
                    return SweepReport {
                        aborted: true,
                        ..SweepReport::default()
                    };
                }
            };

            let horizon = Window::starting_at(self.clock.now(), self.config.cleanup_lookahead);
            let mut report = SweepReport::default();

            for ticker in tickers {
                let Some(schedule) = ticker.schedule.as_ref() else {
                    continue;
                };
                if self.expander.next_occurrence(schedule, horizon).is_some() {
                    continue;
                }
                if self.cache_lock().live_count(&ticker.id) > 0 {
                    tracing::debug!(ticker = %ticker.id, "no upcoming occurrence but alarms are live");
                    report.protected.push(ticker.id);
                    continue;
                }
                match self.store.delete(&ticker.id).await {
                    Ok(()) => {
                        tracing::info!(ticker = %ticker.id, "swept");
                        self.cache_lock().remove(&ticker.id);
                        self.limiter.clear_history(&ticker.id);
                        report.deleted.push(ticker.id);
                    }
                    Err(e) => tracing::error!(ticker = %ticker.id, error = %e, "staging delete failed"),
                }
            }

            if !report.deleted.is_empty() {
                if let Err(e) = self.store.save().await {
                    tracing::error!(error = %e, "saving sweep failed");
                }
                self.refresh.notify();
            }
            report
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
