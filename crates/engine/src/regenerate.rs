// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Regeneration: bring one ticker's materialized alarms in line with its schedule
//!
//! Targets are diffed against current alarms by trigger instant. Cancels run
//! first and any failure aborts before a single create. A failed create
//! cancels every alarm created earlier in the same run, newest first.

use crate::error::EngineError;
use crate::runtime::Runtime;
use chrono::TimeZone;
use std::collections::BTreeSet;
use tk_adapters::{AlarmScheduler, RefreshSignal, TickerStore};
use tk_core::{AlarmId, AlarmInstance, AlarmRequest, Clock, IdGen, RegenerationDiff, Ticker};
use tracing::Instrument;

/// Why a regeneration did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Last regeneration is still fresh
    UpToDate,
    /// Cooldown has not elapsed
    RateLimited { retry_after: chrono::Duration },
    /// No schedule, or disabled at creation
    NotSchedulable,
}

/// Result of one regeneration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenerationOutcome {
    Skipped(SkipReason),
    Applied { cancelled: usize, created: usize },
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
    /// Regenerate one ticker's alarms.
    ///
    /// Without `force`, returns early when the ticker is fresh or the rate
    /// limiter denies. A disabled ticker's target set is empty, so forcing it
    /// cancels every alarm it owns. Bookkeeping is persisted on success; a
    /// failure to persist is logged and left for synchronization to heal.
    pub async fn regenerate(
        &self,
        ticker: &Ticker,
        force: bool,
    ) -> Result<RegenerationOutcome, EngineError> {
        let now = self.clock.now();
        if !force {
            if !ticker.needs_regeneration(now) {
                return Ok(RegenerationOutcome::Skipped(SkipReason::UpToDate));
            }
            if !self.limiter.try_acquire(&ticker.id, false) {
                let retry_after = self.limiter.time_until_next_allowed(&ticker.id);
                tracing::debug!(ticker = %ticker.id, retry_after_s = retry_after.num_seconds(), "rate limited");
                return Ok(RegenerationOutcome::Skipped(SkipReason::RateLimited {
                    retry_after,
                }));
            }
        }

        let Some(schedule) = ticker.schedule.as_ref() else {
            return Err(EngineError::InvalidConfiguration {
                id: ticker.id.clone(),
                reason: "ticker has no schedule".to_string(),
            });
        };

        let span = tracing::info_span!("regenerate", ticker = %ticker.id, force);
        async move {
            let current: Vec<AlarmInstance> = self
                .scheduler
                .list_instances()
                .await
                .map_err(EngineError::SchedulerQuery)?
                .into_iter()
                .filter(|instance| ticker.generated_instance_ids.contains(&instance.id))
                .collect();

            let target = if ticker.is_enabled {
                let params = ticker.strategy();
                self.expander
                    .expand_from(schedule, now, params.window, params.max_alarms)
            } else {
                Vec::new()
            };

            let diff = RegenerationDiff::compute(&current, &target);
            tracing::debug!(
                current = current.len(),
                target = target.len(),
                to_delete = diff.to_delete.len(),
                to_add = diff.to_add.len(),
                "computed diff"
            );

            let created = self.apply(ticker, &diff).await?;

            let deleted: BTreeSet<&AlarmId> = diff.to_delete.iter().map(|i| &i.id).collect();
            let instance_ids: BTreeSet<AlarmId> = current
                .iter()
                .map(|i| &i.id)
                .filter(|id| !deleted.contains(id))
                .cloned()
                .chain(created.iter().cloned())
                .collect();
            let live = instance_ids.len();

            let mut updated = ticker.clone();
            updated.mark_regenerated(instance_ids, now, self.expander.next_midnight(now));
            if force {
                self.limiter.record_regeneration(&ticker.id);
            }

            if let Err(e) = self.store.insert(&updated).await {
                tracing::error!(error = %e, "staging regenerated ticker failed");
            } else if let Err(e) = self.store.save().await {
                tracing::error!(error = %e, "saving regenerated ticker failed");
            }
            self.cache_lock().update(updated, live);

            let outcome = RegenerationOutcome::Applied {
                cancelled: diff.to_delete.len(),
                created: created.len(),
            };
            if !diff.is_empty() {
                self.refresh.notify();
                tracing::info!(
                    cancelled = diff.to_delete.len(),
                    created = created.len(),
                    live,
                    "regenerated"
                );
            }
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    /// Apply a diff. Returns the ids created.
    async fn apply(
        &self,
        ticker: &Ticker,
        diff: &RegenerationDiff,
    ) -> Result<Vec<AlarmId>, EngineError> {
        for instance in &diff.to_delete {
            self.scheduler
                .cancel(&instance.id)
                .await
                .map_err(|source| EngineError::CancelFailure {
                    id: instance.id.clone(),
                    source,
                })?;
        }

        let mut created: Vec<AlarmId> = Vec::with_capacity(diff.to_add.len());
        for fire_at in &diff.to_add {
            let id = self.id_gen.next();
            let request = AlarmRequest {
                ticker_id: ticker.id.clone(),
                label: ticker.label.clone(),
                fire_at: *fire_at,
            };
            if let Err(source) = self.scheduler.create(&id, &request).await {
                self.rollback(&created).await;
                return Err(EngineError::CreateFailure { id, source });
            }
            created.push(id);
        }

        Ok(created)
    }

    /// Cancel alarms created by a failed run, newest first, ignoring errors
    async fn rollback(&self, created: &[AlarmId]) {
        for id in created.iter().rev() {
            if let Err(e) = self.scheduler.cancel(id).await {
                tracing::warn!(alarm = %id, error = %e, "rollback cancel failed");
            }
        }
        if !created.is_empty() {
            tracing::info!(rolled_back = created.len(), "rolled back creates");
        }
    }
}

#[cfg(test)]
#[path = "regenerate_tests.rs"]
mod tests;
