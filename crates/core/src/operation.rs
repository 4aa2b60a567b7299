// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted ticker mutations

use crate::ticker::{Ticker, TickerId};
use serde::{Deserialize, Serialize};

/// A single durable change to the ticker store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Insert or replace a ticker
    TickerUpsert { ticker: Ticker },
    TickerDelete { id: TickerId },
}

impl Operation {
    pub fn ticker_id(&self) -> &TickerId {
        match self {
            Operation::TickerUpsert { ticker } => &ticker.id,
            Operation::TickerDelete { id } => id,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
