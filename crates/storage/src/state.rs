// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized ticker state from WAL replay

use std::collections::HashMap;
use tk_core::{Operation, Ticker, TickerId};

/// Tickers built from applying WAL operations in order
#[derive(Debug, Default, Clone)]
pub struct TickerState {
    pub tickers: HashMap<TickerId, Ticker>,
}

impl TickerState {
    /// Rebuild state from a sequence of operations
    pub fn replay<'a>(ops: impl IntoIterator<Item = &'a Operation>) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::TickerUpsert { ticker } => {
                self.tickers.insert(ticker.id.clone(), ticker.clone());
            }
            Operation::TickerDelete { id } => {
                self.tickers.remove(id);
            }
        }
    }

    pub fn get(&self, id: &TickerId) -> Option<&Ticker> {
        self.tickers.get(id)
    }

    /// All tickers ordered by id
    pub fn sorted(&self) -> Vec<Ticker> {
        let mut tickers: Vec<Ticker> = self.tickers.values().cloned().collect();
        tickers.sort_by(|a, b| a.id.cmp(&b.id));
        tickers
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
