// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Ticker reconciliation engine

mod cache;
mod error;
mod regenerate;
mod runtime;
mod sweep;
mod synchronize;

pub use cache::{CachedTicker, TickerCache};
pub use error::{EngineError, ErrorKind};
pub use regenerate::{RegenerationOutcome, SkipReason};
pub use runtime::{
    RegenerationSummary, Runtime, RuntimeConfig, RuntimeDeps, Trigger, TriggerReport,
};
pub use sweep::SweepReport;
pub use synchronize::SyncReport;

#[cfg(test)]
mod test_support;
