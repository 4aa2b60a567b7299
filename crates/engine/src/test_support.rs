// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared runtime fixtures for engine tests

use crate::{Runtime, RuntimeConfig, RuntimeDeps};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use tk_adapters::{FakeAlarmScheduler, FakeRefreshSignal, FakeTickerStore};
use tk_core::{Expander, FakeClock, Schedule, SequentialIdGen, Ticker};

pub(crate) type TestRuntime = Runtime<
    FakeAlarmScheduler,
    FakeTickerStore,
    FakeRefreshSignal,
    FakeClock,
    SequentialIdGen,
>;

pub(crate) struct Harness {
    pub runtime: TestRuntime,
    pub scheduler: FakeAlarmScheduler,
    pub store: FakeTickerStore,
    pub refresh: FakeRefreshSignal,
    pub clock: FakeClock,
}

/// 2024-01-15T12:00:00Z, a Monday
pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

pub(crate) fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub(crate) fn daily(hour: u32, minute: u32) -> Schedule {
    Schedule::Daily {
        time: hm(hour, minute),
    }
}

pub(crate) fn ticker(id: &str, schedule: Option<Schedule>) -> Ticker {
    Ticker::new(id, format!("{id} label"), schedule)
}

pub(crate) fn harness(tickers: impl IntoIterator<Item = Ticker>) -> Harness {
    let scheduler = FakeAlarmScheduler::new();
    let store = FakeTickerStore::with_tickers(tickers);
    let refresh = FakeRefreshSignal::new();
    let clock = FakeClock::at(t0());

    let runtime = Runtime::new(
        RuntimeDeps {
            scheduler: scheduler.clone(),
            store: store.clone(),
            refresh: refresh.clone(),
        },
        Expander::utc(),
        clock.clone(),
        SequentialIdGen::new("alarm"),
        RuntimeConfig::default(),
    );

    Harness {
        runtime,
        scheduler,
        store,
        refresh,
        clock,
    }
}
