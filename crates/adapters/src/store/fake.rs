// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake ticker store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{StoreError, TickerStore};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tk_core::{Operation, Ticker, TickerId};

/// Recorded store call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    FetchAll,
    Insert { id: TickerId },
    Delete { id: TickerId },
    Save,
}

#[derive(Default)]
struct FakeStoreState {
    committed: BTreeMap<TickerId, Ticker>,
    staged: Vec<Operation>,
    calls: Vec<StoreCall>,
    fail_fetch: bool,
    fail_delete: bool,
    fail_save: bool,
}

impl FakeStoreState {
    fn view(&self) -> BTreeMap<TickerId, Ticker> {
        let mut view = self.committed.clone();
        for op in &self.staged {
            apply(&mut view, op);
        }
        view
    }
}

fn apply(tickers: &mut BTreeMap<TickerId, Ticker>, op: &Operation) {
    match op {
        Operation::TickerUpsert { ticker } => {
            tickers.insert(ticker.id.clone(), ticker.clone());
        }
        Operation::TickerDelete { id } => {
            tickers.remove(id);
        }
    }
}

/// In-memory ticker store with failure injection
#[derive(Clone, Default)]
pub struct FakeTickerStore {
    inner: Arc<Mutex<FakeStoreState>>,
}

impl FakeTickerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with committed tickers
    pub fn with_tickers(tickers: impl IntoIterator<Item = Ticker>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state();
            for ticker in tickers {
                state.committed.insert(ticker.id.clone(), ticker);
            }
        }
        store
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeStoreState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Durable tickers, ordered by id
    pub fn committed(&self) -> Vec<Ticker> {
        self.state().committed.values().cloned().collect()
    }

    /// Durable ticker by id
    pub fn get(&self, id: &TickerId) -> Option<Ticker> {
        self.state().committed.get(id).cloned()
    }

    pub fn staged_count(&self) -> usize {
        self.state().staged.len()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    pub fn save_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Save))
            .count()
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.state().fail_fetch = fail;
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.state().fail_delete = fail;
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.state().fail_save = fail;
    }
}

#[async_trait]
impl TickerStore for FakeTickerStore {
    async fn fetch_all(&self) -> Result<Vec<Ticker>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::FetchAll);
        if state.fail_fetch {
            return Err(StoreError::Unavailable("fetch failed".to_string()));
        }
        Ok(state.view().into_values().collect())
    }

    async fn insert(&self, ticker: &Ticker) -> Result<(), StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::Insert {
            id: ticker.id.clone(),
        });
        state.staged.push(Operation::TickerUpsert {
            ticker: ticker.clone(),
        });
        Ok(())
    }

    async fn delete(&self, id: &TickerId) -> Result<(), StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::Delete { id: id.clone() });
        if state.fail_delete {
            return Err(StoreError::Unavailable("delete failed".to_string()));
        }
        state
            .staged
            .push(Operation::TickerDelete { id: id.clone() });
        Ok(())
    }

    async fn save(&self) -> Result<(), StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::Save);
        if state.fail_save {
            return Err(StoreError::Unavailable("save failed".to_string()));
        }
        let staged = std::mem::take(&mut state.staged);
        for op in &staged {
            apply(&mut state.committed, op);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
