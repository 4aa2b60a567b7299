// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime tests

use super::*;
use crate::error::ErrorKind;
use crate::test_support::{daily, harness, hm, t0, ticker};
use chrono::Duration;
use tk_core::{DayRule, IntervalUnit, Schedule};
use yare::parameterized;

#[tokio::test]
async fn add_ticker_persists_and_materializes() {
    let h = harness([]);
    let t = ticker("wake", Some(daily(9, 0)));

    let outcome = h.runtime.add_ticker(t.clone()).await.unwrap();

    assert!(matches!(outcome, RegenerationOutcome::Applied { created: 7, .. }));
    let stored = h.store.get(&t.id).unwrap();
    assert_eq!(stored.generated_instance_ids.len(), 7);
    assert_eq!(h.scheduler.len(), 7);
    assert_eq!(h.runtime.tickers().len(), 1);
    assert!(h.refresh.count() >= 1);
}

#[parameterized(
    zero_interval = { Schedule::Every { interval: 0, unit: IntervalUnit::Minutes, time: hm(0, 0) } },
    no_days = { Schedule::Weekdays { time: hm(9, 0), days: vec![] } },
    bad_month = { Schedule::Yearly { month: 13, day: 1, time: hm(9, 0) } },
)]
#[test_macro(tokio::test)]
async fn add_ticker_rejects_malformed_schedule(schedule: Schedule) {
    let h = harness([]);

    let err = h.runtime.add_ticker(ticker("bad", Some(schedule))).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    assert!(h.store.committed().is_empty());
    assert!(h.scheduler.calls().is_empty());
}

#[tokio::test]
async fn add_manual_timer_skips_regeneration() {
    let h = harness([]);

    let outcome = h.runtime.add_ticker(ticker("timer", None)).await.unwrap();

    assert_eq!(outcome, RegenerationOutcome::Skipped(SkipReason::NotSchedulable));
    assert!(h.scheduler.calls().is_empty());
    assert_eq!(h.store.committed().len(), 1);
}

#[tokio::test]
async fn add_ticker_save_failure_is_surfaced() {
    let h = harness([]);
    h.store.set_fail_save(true);

    let err = h
        .runtime
        .add_ticker(ticker("wake", Some(daily(9, 0))))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    assert!(h.scheduler.calls().is_empty());
}

#[tokio::test]
async fn update_ticker_replaces_alarms_inside_cooldown() {
    let h = harness([]);
    let t = ticker("wake", Some(daily(9, 0)));
    h.runtime.add_ticker(t.clone()).await.unwrap();

    let mut changed = t.clone();
    changed.set_schedule(Some(daily(10, 0)));
    let outcome = h.runtime.update_ticker(changed).await.unwrap();

    assert_eq!(
        outcome,
        RegenerationOutcome::Applied {
            cancelled: 7,
            created: 7
        }
    );
    assert!(h.scheduler.fire_times().iter().all(|at| at.format("%H:%M").to_string() == "10:00"));
}

#[tokio::test]
async fn update_ticker_keeps_stored_instance_ids() {
    let h = harness([]);
    let t = ticker("wake", Some(daily(9, 0)));
    h.runtime.add_ticker(t.clone()).await.unwrap();

    // caller's copy predates regeneration and knows no instance ids
    let mut relabelled = t.clone();
    relabelled.label = "get up".to_string();
    let outcome = h.runtime.update_ticker(relabelled).await.unwrap();

    assert_eq!(
        outcome,
        RegenerationOutcome::Applied {
            cancelled: 0,
            created: 0
        }
    );
    assert_eq!(h.store.get(&t.id).unwrap().label, "get up");
    assert_eq!(h.scheduler.len(), 7);
}

#[tokio::test]
async fn disabling_a_ticker_cancels_its_alarms() {
    let h = harness([]);
    let t = ticker("wake", Some(daily(9, 0)));
    h.runtime.add_ticker(t.clone()).await.unwrap();

    h.runtime.update_ticker(t.clone().disabled()).await.unwrap();

    assert!(h.scheduler.is_empty());
    let stored = h.store.get(&t.id).unwrap();
    assert!(!stored.is_enabled);
    assert!(stored.generated_instance_ids.is_empty());
}

#[tokio::test]
async fn clearing_the_schedule_cancels_alarms() {
    let h = harness([]);
    let t = ticker("wake", Some(daily(9, 0)));
    h.runtime.add_ticker(t.clone()).await.unwrap();

    let mut manual = t.clone();
    manual.set_schedule(None);
    let outcome = h.runtime.update_ticker(manual).await.unwrap();

    assert_eq!(outcome, RegenerationOutcome::Skipped(SkipReason::NotSchedulable));
    assert!(h.scheduler.is_empty());
    assert!(h.store.get(&t.id).unwrap().generated_instance_ids.is_empty());
}

#[tokio::test]
async fn update_unknown_ticker_is_not_found() {
    let h = harness([]);

    let err = h
        .runtime
        .update_ticker(ticker("ghost", Some(daily(9, 0))))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn remove_ticker_cancels_and_deletes() {
    let h = harness([]);
    let t = ticker("wake", Some(daily(9, 0)));
    h.runtime.add_ticker(t.clone()).await.unwrap();
    let before = h.refresh.count();

    let cancelled = h.runtime.remove_ticker(&t.id).await.unwrap();

    assert_eq!(cancelled, 7);
    assert!(h.scheduler.is_empty());
    assert!(h.store.get(&t.id).is_none());
    assert!(h.runtime.cached(&t.id).is_none());
    assert_eq!(h.refresh.count(), before + 1);
    assert!(h.runtime.limiter().can_regenerate(&t.id, false));
}

#[tokio::test]
async fn remove_ticker_tolerates_cancel_failures() {
    let h = harness([]);
    let t = ticker("wake", Some(daily(9, 0)));
    h.runtime.add_ticker(t.clone()).await.unwrap();
    h.scheduler.fail_cancel("alarm-1");

    let cancelled = h.runtime.remove_ticker(&t.id).await.unwrap();

    assert_eq!(cancelled, 6);
    assert!(h.store.get(&t.id).is_none());
}

#[tokio::test]
async fn failed_regeneration_is_recorded_on_the_ticker() {
    let t = ticker("wake", Some(daily(9, 0)));
    let h = harness([t.clone()]);
    h.runtime.regenerate_ticker(&t.id, true).await.unwrap();
    assert!(h.store.get(&t.id).unwrap().last_regeneration_success);

    // a day later the window slides by one occurrence
    h.clock.advance(Duration::days(1));
    h.scheduler.fail_creates_after(0);
    let err = h.runtime.regenerate_ticker(&t.id, true).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CreateFailure);
    let stored = h.store.get(&t.id).unwrap();
    assert!(!stored.last_regeneration_success);
    assert!(stored.needs_regeneration(t0() + Duration::days(1)));
}

#[tokio::test]
async fn regenerate_all_skips_disabled_and_manual_tickers() {
    let h = harness([
        ticker("a", Some(daily(9, 0))),
        ticker("b", Some(daily(21, 30))),
        ticker("off", Some(daily(6, 0))).disabled(),
        ticker("timer", None),
    ]);

    let summary = h.runtime.regenerate_all(false).await.unwrap();

    assert_eq!(summary.applied, 2);
    assert_eq!(summary.skipped, 0);
    assert!(summary.failed.is_empty());
    assert_eq!(h.scheduler.len(), 14);
}

#[tokio::test]
async fn regenerate_all_counts_failures_and_continues() {
    let h = harness([ticker("a", Some(daily(9, 0))), ticker("b", Some(daily(10, 0)))]);
    h.scheduler.fail_create("alarm-1");

    let summary = h.runtime.regenerate_all(true).await.unwrap();

    assert_eq!(summary.failed, vec![TickerId::new("a")]);
    assert_eq!(summary.applied, 1);
}

#[tokio::test]
async fn low_ticker_is_replenished_after_cooldown() {
    let h = harness([]);
    let t = ticker("wake", Some(daily(9, 0)));
    h.runtime.add_ticker(t.clone()).await.unwrap();
    for n in 1..=5 {
        h.scheduler.remove_instance(&AlarmId::new(format!("alarm-{n}")));
    }

    // still inside the cooldown started by add_ticker
    let limited = h.runtime.replenish_low().await.unwrap();
    assert_eq!(limited.skipped, 1);
    assert_eq!(h.scheduler.len(), 2);

    h.clock.advance(Duration::minutes(10));
    let summary = h.runtime.replenish_low().await.unwrap();

    assert_eq!(summary.applied, 1);
    assert_eq!(h.scheduler.len(), 7);
}

#[tokio::test]
async fn sparse_schedule_is_not_low_when_window_is_full() {
    let monthly = Schedule::Monthly {
        rule: DayRule::Fixed { day: 20 },
        time: hm(9, 0),
    };
    let h = harness([]);
    h.runtime
        .add_ticker(ticker("rent", Some(monthly)))
        .await
        .unwrap();
    assert_eq!(h.scheduler.len(), 1);
    h.clock.advance(Duration::minutes(10));
    h.scheduler.clear_calls();

    let summary = h.runtime.replenish_low().await.unwrap();

    assert_eq!(summary, RegenerationSummary::default());
    assert_eq!(h.scheduler.calls(), vec![tk_adapters::SchedulerCall::List]);
}

#[tokio::test]
async fn foreground_trigger_synchronizes_then_regenerates() {
    let h = harness([ticker("wake", Some(daily(9, 0)))]);
    h.scheduler
        .insert_instance("stray", &TickerId::new("gone"), t0() + Duration::hours(1));

    let report = h.runtime.handle_trigger(Trigger::Foreground).await.unwrap();

    assert_eq!(report.sync.unwrap().cancelled, 1);
    assert_eq!(report.regeneration.unwrap().applied, 1);
    assert!(report.sweep.is_none());
    assert_eq!(h.scheduler.len(), 7);
}

#[tokio::test]
async fn timezone_change_forces_every_ticker() {
    let h = harness([]);
    h.runtime
        .add_ticker(ticker("wake", Some(daily(9, 0))))
        .await
        .unwrap();
    h.scheduler.clear_calls();

    let report = h
        .runtime
        .handle_trigger(Trigger::TimezoneChanged)
        .await
        .unwrap();

    let regeneration = report.regeneration.unwrap();
    assert_eq!(regeneration.applied, 1);
    assert_eq!(regeneration.skipped, 0);
    assert!(report.sync.is_some());
}

#[tokio::test]
async fn background_tick_leaves_fresh_tickers_alone() {
    let h = harness([]);
    h.runtime
        .add_ticker(ticker("wake", Some(daily(9, 0))))
        .await
        .unwrap();
    h.clock.advance(Duration::hours(1));

    let report = h
        .runtime
        .handle_trigger(Trigger::BackgroundTick)
        .await
        .unwrap();

    assert_eq!(report.regeneration.unwrap().skipped, 1);
    assert_eq!(h.scheduler.len(), 7);
}

#[tokio::test]
async fn cleanup_trigger_runs_sweep_only() {
    let h = harness([ticker("wake", Some(daily(9, 0)))]);

    let report = h
        .runtime
        .handle_trigger(Trigger::CleanupSweep)
        .await
        .unwrap();

    assert!(report.sweep.is_some());
    assert!(report.sync.is_none());
    assert!(report.regeneration.is_none());
}

#[tokio::test]
async fn store_failure_surfaces_from_regenerate_all() {
    let h = harness([ticker("wake", Some(daily(9, 0)))]);
    h.store.set_fail_fetch(true);

    let err = h.runtime.regenerate_all(false).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QueryFailure);
}

#[tokio::test]
async fn foreground_restores_alarms_lost_while_fresh() {
    let h = harness([]);
    let t = ticker("wake", Some(daily(9, 0)));
    h.runtime.add_ticker(t.clone()).await.unwrap();
    for n in 1..=7 {
        h.scheduler.remove_instance(&AlarmId::new(format!("alarm-{n}")));
    }
    h.clock.advance(Duration::minutes(10));

    let report = h.runtime.handle_trigger(Trigger::Foreground).await.unwrap();

    assert_eq!(report.sync.unwrap().pruned, 7);
    let regeneration = report.regeneration.unwrap();
    assert_eq!(regeneration.skipped, 1);
    assert_eq!(regeneration.applied, 1);
    assert_eq!(h.scheduler.len(), 7);
}
