// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tk-core: data model and pure algorithms for ticker reconciliation
//!
//! This crate provides:
//! - Ticker and schedule definitions
//! - Recurrence expansion over closed time windows
//! - Frequency classification and generation policy
//! - Per-ticker regeneration cooldown
//! - Value-keyed regeneration diffs
//! - Clock and id abstractions for deterministic tests

pub mod alarm;
pub mod clock;
pub mod config;
pub mod diff;
pub mod expand;
pub mod id;
pub mod limiter;
pub mod operation;
pub mod schedule;
pub mod strategy;
pub mod ticker;

pub use alarm::{AlarmId, AlarmInstance, AlarmRequest};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use diff::RegenerationDiff;
pub use expand::{Expander, Window};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use limiter::RateLimiter;
pub use operation::Operation;
pub use schedule::{DayRule, IntervalUnit, Schedule, ScheduleError};
pub use strategy::{GenerationStrategy, RegenerationStrategy};
pub use ticker::{Ticker, TickerId};
