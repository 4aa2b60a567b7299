// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alarm scheduler adapters
//!
//! The scheduler materializes one-shot alarms by opaque id and is the source
//! of truth for what will actually fire.

mod file;

pub use file::{DueAlarm, FileAlarmScheduler};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAlarmScheduler, SchedulerCall};

use async_trait::async_trait;
use thiserror::Error;
use tk_core::{AlarmId, AlarmInstance, AlarmRequest};

/// Errors from scheduler operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("alarm not found: {0}")]
    NotFound(AlarmId),
    #[error("alarm already exists: {0}")]
    AlreadyExists(AlarmId),
    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Adapter for the external alarm scheduler
#[async_trait]
pub trait AlarmScheduler: Clone + Send + Sync + 'static {
    /// Every currently materialized alarm
    async fn list_instances(&self) -> Result<Vec<AlarmInstance>, SchedulerError>;

    /// Materialize a one-shot alarm under `id`
    async fn create(&self, id: &AlarmId, request: &AlarmRequest) -> Result<(), SchedulerError>;

    /// Cancel a materialized alarm
    async fn cancel(&self, id: &AlarmId) -> Result<(), SchedulerError>;
}
