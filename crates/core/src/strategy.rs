// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generation strategy: frequency class to lookahead policy
//!
//! High-frequency schedules get a short window and a hard cap so the number
//! of materialized alarms stays bounded. Low-frequency schedules get a long
//! window so that "no live alarm right now" does not mean "abandoned".

use crate::schedule::{IntervalUnit, Schedule};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sub-hour intervals shorter than this are high frequency
const HIGH_FREQUENCY_MINUTES: i64 = 45;
/// Intervals shorter than this (and at least the high bound) are medium frequency
const MEDIUM_FREQUENCY_MINUTES: i64 = 4 * 60;

/// Frequency class derived from a schedule's shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationStrategy {
    High,
    Medium,
    #[default]
    Low,
}

impl fmt::Display for RegenerationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegenerationStrategy::High => write!(f, "high"),
            RegenerationStrategy::Medium => write!(f, "medium"),
            RegenerationStrategy::Low => write!(f, "low"),
        }
    }
}

/// Lookahead and freshness policy for one frequency class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStrategy {
    /// How far ahead alarms are materialized
    pub window: Duration,
    /// Cap on materialized alarms; `None` is unbounded
    pub max_alarms: Option<usize>,
    /// Age after which the last regeneration is considered stale
    pub regeneration_threshold: Duration,
    /// Live alarm count below which regeneration is triggered early
    pub minimum_alarm_count: usize,
}

impl RegenerationStrategy {
    /// Classify a schedule by how often it fires
    pub fn classify(schedule: &Schedule) -> Self {
        match schedule {
            Schedule::Every {
                interval,
                unit: IntervalUnit::Minutes,
                ..
            } => Self::from_minutes(*interval),
            Schedule::Every {
                interval,
                unit: IntervalUnit::Hours,
                ..
            }
            | Schedule::Hourly { interval, .. } => {
                Self::from_minutes(interval.saturating_mul(60))
            }
            Schedule::OneTime { .. }
            | Schedule::Daily { .. }
            | Schedule::Every { .. }
            | Schedule::Weekdays { .. }
            | Schedule::Biweekly { .. }
            | Schedule::Monthly { .. }
            | Schedule::Yearly { .. } => RegenerationStrategy::Low,
        }
    }

    fn from_minutes(minutes: i64) -> Self {
        if minutes <= 0 {
            // Degenerate intervals never produce occurrences
            RegenerationStrategy::Low
        } else if minutes < HIGH_FREQUENCY_MINUTES {
            RegenerationStrategy::High
        } else if minutes < MEDIUM_FREQUENCY_MINUTES {
            RegenerationStrategy::Medium
        } else {
            RegenerationStrategy::Low
        }
    }

    /// The fixed policy for this class
    pub fn params(self) -> GenerationStrategy {
        match self {
            RegenerationStrategy::High => GenerationStrategy {
                window: Duration::hours(24),
                max_alarms: Some(100),
                regeneration_threshold: Duration::hours(12),
                minimum_alarm_count: 20,
            },
            RegenerationStrategy::Medium => GenerationStrategy {
                window: Duration::hours(48),
                max_alarms: None,
                regeneration_threshold: Duration::hours(24),
                minimum_alarm_count: 12,
            },
            RegenerationStrategy::Low => GenerationStrategy {
                window: Duration::days(7),
                max_alarms: None,
                regeneration_threshold: Duration::days(3),
                minimum_alarm_count: 3,
            },
        }
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
