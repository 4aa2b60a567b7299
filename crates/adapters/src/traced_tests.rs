// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::scheduler::FakeAlarmScheduler;
use crate::store::FakeTickerStore;
use chrono::{TimeZone, Utc};
use std::sync::{Arc, Mutex};

/// Shared byte sink for formatted log lines
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Drive `fut` on a fresh runtime and return everything it logged
fn captured<Fut: std::future::Future>(fut: Fut) -> (String, Fut::Output) {
    let buffer = LogBuffer::default();
    let sink = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || sink.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let output = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(fut)
    });

    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (logs, output)
}

fn request() -> AlarmRequest {
    AlarmRequest {
        ticker_id: TickerId::new("t1"),
        label: "water plants".to_string(),
        fire_at: Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap(),
    }
}

// =============================================================================
// Pass-through behavior
// =============================================================================

#[tokio::test]
async fn traced_scheduler_delegates_to_inner() {
    let fake = FakeAlarmScheduler::new();
    let traced = TracedAlarmScheduler::new(fake.clone());

    traced.create(&AlarmId::new("a1"), &request()).await.unwrap();
    assert_eq!(traced.list_instances().await.unwrap().len(), 1);
    traced.cancel(&AlarmId::new("a1")).await.unwrap();

    assert!(fake.is_empty());
    assert_eq!(fake.calls().len(), 3);
}

#[tokio::test]
async fn traced_store_delegates_to_inner() {
    let fake = FakeTickerStore::new();
    let traced = TracedTickerStore::new(fake.clone());

    traced
        .insert(&Ticker::new(TickerId::new("t1"), "t1", None))
        .await
        .unwrap();
    traced.save().await.unwrap();

    assert_eq!(fake.committed().len(), 1);
    assert!(traced.fetch(&TickerId::new("t1")).await.unwrap().is_some());
}

// =============================================================================
// Log output
// =============================================================================

#[test]
fn traced_create_logs_span_fields() {
    let (logs, result) = captured(async {
        let traced = TracedAlarmScheduler::new(FakeAlarmScheduler::new());
        traced.create(&AlarmId::new("a1"), &request()).await
    });

    assert!(result.is_ok());
    assert!(logs.contains("scheduler.create"), "logs: {logs}");
    assert!(logs.contains("id=a1"), "logs: {logs}");
    assert!(logs.contains("ticker=t1"), "logs: {logs}");
    assert!(logs.contains("alarm created"), "logs: {logs}");
    assert!(logs.contains("elapsed_ms"), "logs: {logs}");
}

#[test]
fn traced_list_failure_logs_error() {
    let (logs, result) = captured(async {
        let fake = FakeAlarmScheduler::new();
        fake.set_fail_list(true);
        TracedAlarmScheduler::new(fake).list_instances().await
    });

    assert!(result.is_err());
    assert!(logs.contains("ERROR"), "logs: {logs}");
    assert!(logs.contains("list failed"), "logs: {logs}");
}

#[test]
fn traced_cancel_failure_logs_warning() {
    let (logs, result) = captured(async {
        TracedAlarmScheduler::new(FakeAlarmScheduler::new())
            .cancel(&AlarmId::new("missing"))
            .await
    });

    assert!(result.is_err());
    assert!(logs.contains("WARN"), "logs: {logs}");
    assert!(logs.contains("cancel failed"), "logs: {logs}");
}

#[test]
fn traced_save_failure_logs_error() {
    let (logs, result) = captured(async {
        let fake = FakeTickerStore::new();
        fake.set_fail_save(true);
        TracedTickerStore::new(fake).save().await
    });

    assert!(result.is_err());
    assert!(logs.contains("store.save"), "logs: {logs}");
    assert!(logs.contains("save failed"), "logs: {logs}");
}
