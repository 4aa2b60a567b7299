// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurrence rules attached to tickers
//!
//! A [`Schedule`] never mutates: changing a ticker's recurrence replaces the
//! whole value.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unit for [`Schedule::Every`] intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalUnit::Minutes => write!(f, "minutes"),
            IntervalUnit::Hours => write!(f, "hours"),
            IntervalUnit::Days => write!(f, "days"),
            IntervalUnit::Weeks => write!(f, "weeks"),
        }
    }
}

/// Which day of a month a monthly schedule fires on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DayRule {
    /// A fixed day of month; months without that day are skipped
    Fixed { day: u32 },
    /// The first occurrence of a weekday in the month
    FirstWeekday { weekday: Weekday },
    /// The last occurrence of a weekday in the month
    LastWeekday { weekday: Weekday },
    FirstOfMonth,
    LastOfMonth,
}

impl DayRule {
    /// Resolve the rule to a concrete date in the given month.
    ///
    /// Returns `None` when the month has no such day (e.g. `Fixed { day: 31 }` in April).
    pub fn resolve(&self, year: i32, month: u32) -> Option<NaiveDate> {
        match *self {
            DayRule::Fixed { day } => NaiveDate::from_ymd_opt(year, month, day),
            DayRule::FirstOfMonth => NaiveDate::from_ymd_opt(year, month, 1),
            DayRule::LastOfMonth => last_day_of_month(year, month),
            DayRule::FirstWeekday { weekday } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let offset = (7 + weekday.num_days_from_monday()
                    - first.weekday().num_days_from_monday())
                    % 7;
                first.checked_add_days(Days::new(u64::from(offset)))
            }
            DayRule::LastWeekday { weekday } => {
                let last = last_day_of_month(year, month)?;
                let offset = (7 + last.weekday().num_days_from_monday()
                    - weekday.num_days_from_monday())
                    % 7;
                last.checked_sub_days(Days::new(u64::from(offset)))
            }
        }
    }
}

/// Last calendar day of a month, accounting for leap years
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// A recurrence rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Fires once at an absolute instant
    OneTime { at: DateTime<Utc> },
    /// Fires every day at a wall-clock time
    Daily { time: NaiveTime },
    /// Fires every `interval` hours at `time`'s minute past the hour
    Hourly { interval: i64, time: NaiveTime },
    /// Fires every `interval` units
    Every {
        interval: i64,
        unit: IntervalUnit,
        time: NaiveTime,
    },
    /// Fires on selected weekdays
    Weekdays { time: NaiveTime, days: Vec<Weekday> },
    /// Fires on selected weekdays of every other week
    Biweekly { time: NaiveTime, days: Vec<Weekday> },
    /// Fires once a month on the day chosen by `rule`
    Monthly { rule: DayRule, time: NaiveTime },
    /// Fires once a year; invalid dates (Feb 29 outside leap years) are skipped
    Yearly { month: u32, day: u32, time: NaiveTime },
}

/// Structural problems with a schedule value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("interval must be positive, got {0}")]
    NonPositiveInterval(i64),
    #[error("no weekdays selected")]
    EmptyDays,
    #[error("day of month out of range: {0}")]
    DayOutOfRange(u32),
    #[error("month out of range: {0}")]
    MonthOutOfRange(u32),
    #[error("{month:02}-{day:02} is not a calendar date in any year")]
    ImpossibleDate { month: u32, day: u32 },
}

impl Schedule {
    /// Check the schedule for values the expander would silently never emit
    pub fn validate(&self) -> Result<(), ScheduleError> {
        match self {
            Schedule::OneTime { .. } | Schedule::Daily { .. } => Ok(()),
            Schedule::Hourly { interval, .. } | Schedule::Every { interval, .. } => {
                if *interval <= 0 {
                    Err(ScheduleError::NonPositiveInterval(*interval))
                } else {
                    Ok(())
                }
            }
            Schedule::Weekdays { days, .. } | Schedule::Biweekly { days, .. } => {
                if days.is_empty() {
                    Err(ScheduleError::EmptyDays)
                } else {
                    Ok(())
                }
            }
            Schedule::Monthly { rule, .. } => match rule {
                DayRule::Fixed { day } if *day == 0 || *day > 31 => {
                    Err(ScheduleError::DayOutOfRange(*day))
                }
                _ => Ok(()),
            },
            Schedule::Yearly { month, day, .. } => {
                if !(1..=12).contains(month) {
                    return Err(ScheduleError::MonthOutOfRange(*month));
                }
                if *day == 0 || *day > 31 {
                    return Err(ScheduleError::DayOutOfRange(*day));
                }
                // 2000 is a leap year, so Feb 29 passes
                if NaiveDate::from_ymd_opt(2000, *month, *day).is_none() {
                    return Err(ScheduleError::ImpossibleDate {
                        month: *month,
                        day: *day,
                    });
                }
                Ok(())
            }
        }
    }

    /// Short name of the schedule shape
    pub fn kind(&self) -> &'static str {
        match self {
            Schedule::OneTime { .. } => "one_time",
            Schedule::Daily { .. } => "daily",
            Schedule::Hourly { .. } => "hourly",
            Schedule::Every { .. } => "every",
            Schedule::Weekdays { .. } => "weekdays",
            Schedule::Biweekly { .. } => "biweekly",
            Schedule::Monthly { .. } => "monthly",
            Schedule::Yearly { .. } => "yearly",
        }
    }
}

fn hm(time: &NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

fn day_list(days: &[Weekday]) -> String {
    days.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::OneTime { at } => write!(f, "once at {}", at.format("%Y-%m-%d %H:%M UTC")),
            Schedule::Daily { time } => write!(f, "daily at {}", hm(time)),
            Schedule::Hourly { interval, time } => {
                write!(f, "every {} hours at :{:02}", interval, time.minute())
            }
            Schedule::Every {
                interval,
                unit: IntervalUnit::Minutes,
                ..
            } => write!(f, "every {} minutes", interval),
            Schedule::Every {
                interval,
                unit: IntervalUnit::Hours,
                time,
            } => write!(f, "every {} hours at :{:02}", interval, time.minute()),
            Schedule::Every {
                interval,
                unit,
                time,
            } => write!(f, "every {} {} at {}", interval, unit, hm(time)),
            Schedule::Weekdays { time, days } => {
                write!(f, "weekly on {} at {}", day_list(days), hm(time))
            }
            Schedule::Biweekly { time, days } => {
                write!(f, "every other week on {} at {}", day_list(days), hm(time))
            }
            Schedule::Monthly { rule, time } => match rule {
                DayRule::Fixed { day } => write!(f, "monthly on day {} at {}", day, hm(time)),
                DayRule::FirstWeekday { weekday } => {
                    write!(f, "monthly on the first {} at {}", weekday, hm(time))
                }
                DayRule::LastWeekday { weekday } => {
                    write!(f, "monthly on the last {} at {}", weekday, hm(time))
                }
                DayRule::FirstOfMonth => write!(f, "monthly on the first day at {}", hm(time)),
                DayRule::LastOfMonth => write!(f, "monthly on the last day at {}", hm(time)),
            },
            Schedule::Yearly { month, day, time } => {
                write!(f, "yearly on {:02}-{:02} at {}", month, day, hm(time))
            }
        }
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
