// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticker store backed by the write-ahead log

use super::{StoreError, TickerStore};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tk_core::{Operation, Ticker, TickerId};
use tk_storage::{TickerState, Wal};

/// Log length past which `open` rewrites the log as a snapshot
const MIN_COMPACT_ENTRIES: usize = 256;

fn compaction_threshold(live: usize) -> usize {
    MIN_COMPACT_ENTRIES.max(live.saturating_mul(4))
}

struct Inner {
    wal: Wal,
    committed: TickerState,
    staged: Vec<Operation>,
}

/// Durable ticker store.
///
/// Staged operations are appended to the WAL in a single batch on `save`.
#[derive(Clone)]
pub struct WalTickerStore {
    inner: Arc<Mutex<Inner>>,
}

impl WalTickerStore {
    /// Open the store, replaying any existing log
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut wal = Wal::open(path)?;
        let committed = TickerState::replay(&Wal::replay(path)?);
        if wal.len() > compaction_threshold(committed.tickers.len()) {
            let snapshot: Vec<Operation> = committed
                .sorted()
                .into_iter()
                .map(|ticker| Operation::TickerUpsert { ticker })
                .collect();
            wal.compact(&snapshot)?;
        }
        tracing::debug!(path = %path.display(), tickers = committed.tickers.len(), "store opened");

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                wal,
                committed,
                staged: Vec::new(),
            })),
        })
    }

    /// Committed tickers read from the log without opening it for writing.
    ///
    /// Never trims or compacts, so it is safe while another process owns the log.
    pub fn load_snapshot(path: &Path) -> Result<Vec<Ticker>, StoreError> {
        Ok(TickerState::replay(&Wal::replay(path)?).sorted())
    }

    /// Number of writes not yet saved
    pub fn staged_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .staged
            .len()
    }
}

#[async_trait]
impl TickerStore for WalTickerStore {
    async fn fetch_all(&self) -> Result<Vec<Ticker>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.staged.is_empty() {
            return Ok(inner.committed.sorted());
        }
        let mut view = inner.committed.clone();
        for op in &inner.staged {
            view.apply(op);
        }
        Ok(view.sorted())
    }

    async fn insert(&self, ticker: &Ticker) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.staged.push(Operation::TickerUpsert {
            ticker: ticker.clone(),
        });
        Ok(())
    }

    async fn delete(&self, id: &TickerId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.staged.push(Operation::TickerDelete { id: id.clone() });
        Ok(())
    }

    async fn save(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.staged.is_empty() {
            return Ok(());
        }

        // Staged ops are kept on failure; replaying an upsert or delete twice is harmless
        let staged = std::mem::take(&mut inner.staged);
        if let Err(e) = inner.wal.append_all(&staged) {
            inner.staged = staged;
            return Err(e.into());
        }
        for op in &staged {
            inner.committed.apply(op);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
