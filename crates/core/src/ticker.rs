// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticker: a persisted recurring-reminder definition

use crate::alarm::AlarmId;
use crate::schedule::Schedule;
use crate::strategy::{GenerationStrategy, RegenerationStrategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for a ticker, stable for its lifetime
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerId(pub String);

impl TickerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TickerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TickerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A recurring-reminder definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub id: TickerId,
    pub label: String,
    /// `None` for tickers without recurrence (e.g. manual timers)
    pub schedule: Option<Schedule>,
    pub is_enabled: bool,
    /// Alarm ids believed to be materialized for this ticker
    #[serde(default)]
    pub generated_instance_ids: BTreeSet<AlarmId>,
    /// Cached classification of `schedule`
    #[serde(default)]
    pub regeneration_strategy: RegenerationStrategy,
    #[serde(default)]
    pub last_regeneration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_regeneration_success: bool,
    #[serde(default)]
    pub next_scheduled_regeneration: Option<DateTime<Utc>>,
}

impl Ticker {
    pub fn new(id: impl Into<TickerId>, label: impl Into<String>, schedule: Option<Schedule>) -> Self {
        let regeneration_strategy = schedule
            .as_ref()
            .map(RegenerationStrategy::classify)
            .unwrap_or_default();
        Self {
            id: id.into(),
            label: label.into(),
            schedule,
            is_enabled: true,
            generated_instance_ids: BTreeSet::new(),
            regeneration_strategy,
            last_regeneration_date: None,
            last_regeneration_success: false,
            next_scheduled_regeneration: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }

    /// Replace the schedule wholesale and re-derive the cached strategy
    pub fn set_schedule(&mut self, schedule: Option<Schedule>) {
        self.regeneration_strategy = schedule
            .as_ref()
            .map(RegenerationStrategy::classify)
            .unwrap_or_default();
        self.schedule = schedule;
    }

    /// Generation policy for this ticker's frequency class
    pub fn strategy(&self) -> GenerationStrategy {
        self.regeneration_strategy.params()
    }

    /// Whether `alarm` belongs to this ticker, either directly (a manual timer
    /// materialized under the ticker's own id) or as a generated instance
    pub fn owns(&self, alarm: &AlarmId) -> bool {
        self.id.as_str() == alarm.as_str() || self.generated_instance_ids.contains(alarm)
    }

    /// Whether regeneration is due.
    ///
    /// Never due without a schedule or while disabled. Due if never run, if
    /// the last run failed, if the scheduled regeneration time has passed, or
    /// if the last run is older than the strategy's threshold.
    pub fn needs_regeneration(&self, now: DateTime<Utc>) -> bool {
        if self.schedule.is_none() || !self.is_enabled {
            return false;
        }
        let Some(last) = self.last_regeneration_date else {
            return true;
        };
        if !self.last_regeneration_success {
            return true;
        }
        if self.next_scheduled_regeneration.is_some_and(|next| next <= now) {
            return true;
        }
        now - last >= self.strategy().regeneration_threshold
    }

    /// Whether `live_count` materialized alarms is below the strategy floor
    pub fn is_low(&self, live_count: usize) -> bool {
        live_count < self.strategy().minimum_alarm_count
    }

    /// Record a successful regeneration
    pub fn mark_regenerated(
        &mut self,
        instance_ids: BTreeSet<AlarmId>,
        now: DateTime<Utc>,
        next: DateTime<Utc>,
    ) {
        self.generated_instance_ids = instance_ids;
        self.last_regeneration_date = Some(now);
        self.last_regeneration_success = true;
        self.next_scheduled_regeneration = Some(next);
    }

    /// Record a failed regeneration; other bookkeeping is left untouched
    pub fn mark_regeneration_failed(&mut self) {
        self.last_regeneration_success = false;
    }
}

#[cfg(test)]
#[path = "ticker_tests.rs"]
mod tests;
