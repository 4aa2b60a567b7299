// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the engine's external collaborators

pub mod refresh;
pub mod scheduler;
pub mod store;
pub mod traced;

pub use refresh::{ChannelRefreshSignal, NoOpRefreshSignal, RefreshSignal};
pub use scheduler::{AlarmScheduler, DueAlarm, FileAlarmScheduler, SchedulerError};
pub use store::{StoreError, TickerStore, WalTickerStore};
pub use traced::{TracedAlarmScheduler, TracedTickerStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use refresh::FakeRefreshSignal;
#[cfg(any(test, feature = "test-support"))]
pub use scheduler::{FakeAlarmScheduler, SchedulerCall};
#[cfg(any(test, feature = "test-support"))]
pub use store::{FakeTickerStore, StoreCall};
