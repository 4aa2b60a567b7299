// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory view of tickers and their live alarm counts

use std::collections::HashMap;
use tk_core::{Ticker, TickerId};

/// A ticker together with how many of its alarms are materialized
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTicker {
    pub ticker: Ticker,
    pub live_instances: usize,
}

/// Ticker cache, updated by synchronization and individual ticker operations
#[derive(Debug, Default)]
pub struct TickerCache {
    entries: HashMap<TickerId, CachedTicker>,
}

impl TickerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one entry
    pub fn update(&mut self, ticker: Ticker, live_instances: usize) {
        self.entries.insert(
            ticker.id.clone(),
            CachedTicker {
                ticker,
                live_instances,
            },
        );
    }

    pub fn remove(&mut self, id: &TickerId) -> Option<CachedTicker> {
        self.entries.remove(id)
    }

    /// Replace every entry. A ticker listed twice keeps its last entry.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (Ticker, usize)>) {
        self.entries.clear();
        for (ticker, live_instances) in entries {
            self.update(ticker, live_instances);
        }
    }

    pub fn get(&self, id: &TickerId) -> Option<&CachedTicker> {
        self.entries.get(id)
    }

    /// Live alarm count, zero for unknown tickers
    pub fn live_count(&self, id: &TickerId) -> usize {
        self.entries.get(id).map_or(0, |e| e.live_instances)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries ordered by ticker id
    pub fn snapshot(&self) -> Vec<CachedTicker> {
        let mut entries: Vec<CachedTicker> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.ticker.id.cmp(&b.ticker.id));
        entries
    }
}
