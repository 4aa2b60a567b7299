// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::scheduler::{AlarmScheduler, SchedulerError};
use crate::store::{StoreError, TickerStore};
use async_trait::async_trait;
use tk_core::{AlarmId, AlarmInstance, AlarmRequest, Ticker, TickerId};
use tracing::Instrument;

/// Wrapper that adds tracing to any AlarmScheduler
#[derive(Clone)]
pub struct TracedAlarmScheduler<A> {
    inner: A,
}

impl<A> TracedAlarmScheduler<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: AlarmScheduler> AlarmScheduler for TracedAlarmScheduler<A> {
    async fn list_instances(&self) -> Result<Vec<AlarmInstance>, SchedulerError> {
        let span = tracing::info_span!("scheduler.list");
        async {
            let start = std::time::Instant::now();
            let result = self.inner.list_instances().await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(instances) => tracing::debug!(count = instances.len(), elapsed_ms, "listed"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "list failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create(&self, id: &AlarmId, request: &AlarmRequest) -> Result<(), SchedulerError> {
        let span = tracing::info_span!(
            "scheduler.create",
            id = %id,
            ticker = %request.ticker_id,
            fire_at = %request.fire_at
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create(id, request).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "alarm created"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn cancel(&self, id: &AlarmId) -> Result<(), SchedulerError> {
        let span = tracing::info_span!("scheduler.cancel", id = %id);
        async {
            let result = self.inner.cancel(id).await;
            match &result {
                Ok(()) => tracing::debug!("alarm cancelled"),
                Err(e) => tracing::warn!(error = %e, "cancel failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any TickerStore
#[derive(Clone)]
pub struct TracedTickerStore<S> {
    inner: S,
}

impl<S> TracedTickerStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: TickerStore> TickerStore for TracedTickerStore<S> {
    async fn fetch_all(&self) -> Result<Vec<Ticker>, StoreError> {
        let result = self.inner.fetch_all().await;
        match &result {
            Ok(tickers) => tracing::trace!(count = tickers.len(), "store.fetch_all"),
            Err(e) => tracing::error!(error = %e, "store.fetch_all failed"),
        }
        result
    }

    async fn fetch(&self, id: &TickerId) -> Result<Option<Ticker>, StoreError> {
        let result = self.inner.fetch(id).await;
        if let Err(e) = &result {
            tracing::error!(id = %id, error = %e, "store.fetch failed");
        }
        result
    }

    async fn insert(&self, ticker: &Ticker) -> Result<(), StoreError> {
        tracing::trace!(id = %ticker.id, "store.insert");
        self.inner.insert(ticker).await
    }

    async fn delete(&self, id: &TickerId) -> Result<(), StoreError> {
        tracing::trace!(id = %id, "store.delete");
        self.inner.delete(id).await
    }

    async fn save(&self) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.save");
        async {
            let start = std::time::Instant::now();
            let result = self.inner.save().await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "saved"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "save failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
