// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake alarm scheduler for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AlarmScheduler, SchedulerError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use tk_core::{AlarmId, AlarmInstance, AlarmRequest, TickerId};

/// Recorded scheduler call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    List,
    Create { id: AlarmId, fire_at: DateTime<Utc> },
    Cancel { id: AlarmId },
}

#[derive(Default)]
struct FakeSchedulerState {
    alarms: BTreeMap<AlarmId, AlarmRequest>,
    calls: Vec<SchedulerCall>,
    fail_list: bool,
    fail_cancel: HashSet<AlarmId>,
    fail_create: HashSet<AlarmId>,
    creates_before_failure: Option<usize>,
}

/// In-memory alarm scheduler with failure injection
#[derive(Clone, Default)]
pub struct FakeAlarmScheduler {
    inner: Arc<Mutex<FakeSchedulerState>>,
}

impl FakeAlarmScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeSchedulerState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Place an alarm directly, bypassing call recording
    pub fn insert_instance(&self, id: impl Into<AlarmId>, ticker_id: &TickerId, fire_at: DateTime<Utc>) {
        self.state().alarms.insert(
            id.into(),
            AlarmRequest {
                ticker_id: ticker_id.clone(),
                label: String::new(),
                fire_at,
            },
        );
    }

    /// Remove an alarm directly, as if it fired or the user dismissed it
    pub fn remove_instance(&self, id: &AlarmId) {
        self.state().alarms.remove(id);
    }

    /// Current alarms, ordered by id
    pub fn instances(&self) -> Vec<AlarmInstance> {
        self.state()
            .alarms
            .iter()
            .map(|(id, request)| AlarmInstance::new(id.clone(), request.fire_at))
            .collect()
    }

    /// Current trigger instants, ascending
    pub fn fire_times(&self) -> Vec<DateTime<Utc>> {
        let mut times: Vec<_> = self.state().alarms.values().map(|r| r.fire_at).collect();
        times.sort();
        times
    }

    pub fn request(&self, id: &AlarmId) -> Option<AlarmRequest> {
        self.state().alarms.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make `list_instances` fail
    pub fn set_fail_list(&self, fail: bool) {
        self.state().fail_list = fail;
    }

    /// Make cancelling `id` fail
    pub fn fail_cancel(&self, id: impl Into<AlarmId>) {
        self.state().fail_cancel.insert(id.into());
    }

    /// Make creating `id` fail
    pub fn fail_create(&self, id: impl Into<AlarmId>) {
        self.state().fail_create.insert(id.into());
    }

    /// Allow `n` more successful creates, then fail every create
    pub fn fail_creates_after(&self, n: usize) {
        self.state().creates_before_failure = Some(n);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.fail_list = false;
        state.fail_cancel.clear();
        state.fail_create.clear();
        state.creates_before_failure = None;
    }
}

#[async_trait]
impl AlarmScheduler for FakeAlarmScheduler {
    async fn list_instances(&self) -> Result<Vec<AlarmInstance>, SchedulerError> {
        let mut state = self.state();
        state.calls.push(SchedulerCall::List);
        if state.fail_list {
            return Err(SchedulerError::Unavailable("list failed".to_string()));
        }
        Ok(state
            .alarms
            .iter()
            .map(|(id, request)| AlarmInstance::new(id.clone(), request.fire_at))
            .collect())
    }

    async fn create(&self, id: &AlarmId, request: &AlarmRequest) -> Result<(), SchedulerError> {
        let mut state = self.state();
        state.calls.push(SchedulerCall::Create {
            id: id.clone(),
            fire_at: request.fire_at,
        });

        if state.fail_create.contains(id) {
            return Err(SchedulerError::Rejected(format!("create {id} failed")));
        }
        match state.creates_before_failure {
            Some(0) => return Err(SchedulerError::Rejected(format!("create {id} failed"))),
            Some(n) => state.creates_before_failure = Some(n - 1),
            None => {}
        }
        if state.alarms.contains_key(id) {
            return Err(SchedulerError::AlreadyExists(id.clone()));
        }

        state.alarms.insert(id.clone(), request.clone());
        Ok(())
    }

    async fn cancel(&self, id: &AlarmId) -> Result<(), SchedulerError> {
        let mut state = self.state();
        state.calls.push(SchedulerCall::Cancel { id: id.clone() });

        if state.fail_cancel.contains(id) {
            return Err(SchedulerError::Rejected(format!("cancel {id} failed")));
        }
        if state.alarms.remove(id).is_none() {
            return Err(SchedulerError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
