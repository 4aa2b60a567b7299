// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticker persistence adapters
//!
//! Writes are staged by `insert` and `delete` and become durable on `save`.
//! Reads observe staged writes.

mod wal;

pub use wal::WalTickerStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTickerStore, StoreCall};

use async_trait::async_trait;
use thiserror::Error;
use tk_core::{Ticker, TickerId};
use tk_storage::WalError;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Adapter for durable ticker storage
#[async_trait]
pub trait TickerStore: Clone + Send + Sync + 'static {
    /// All tickers, staged writes included
    async fn fetch_all(&self) -> Result<Vec<Ticker>, StoreError>;

    async fn fetch(&self, id: &TickerId) -> Result<Option<Ticker>, StoreError> {
        Ok(self.fetch_all().await?.into_iter().find(|t| &t.id == id))
    }

    /// Stage an insert-or-replace
    async fn insert(&self, ticker: &Ticker) -> Result<(), StoreError>;

    /// Stage a removal
    async fn delete(&self, id: &TickerId) -> Result<(), StoreError>;

    /// Make staged writes durable
    async fn save(&self) -> Result<(), StoreError>;
}
