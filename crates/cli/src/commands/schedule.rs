// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule flags shared by `add` and `preview`

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, NaiveTime, Utc};
use clap::Args;
use std::time::Duration;
use tk_core::{IntervalUnit, Schedule};

#[derive(Args, Debug, Default)]
pub struct ScheduleArgs {
    /// Schedule as JSON, e.g. '{"type":"daily","time":"09:00:00"}'
    #[arg(long, conflicts_with_all = ["daily", "every", "at"])]
    pub schedule: Option<String>,
    /// Fire every day at HH:MM
    #[arg(long, conflicts_with_all = ["every", "at"])]
    pub daily: Option<String>,
    /// Fire at a fixed interval, e.g. 5m, 2h, 3days, 1week
    #[arg(long, conflicts_with = "at")]
    pub every: Option<String>,
    /// Wall-clock anchor (HH:MM) for --every
    #[arg(long, requires = "every")]
    pub time: Option<String>,
    /// Fire once at an RFC 3339 instant
    #[arg(long)]
    pub at: Option<String>,
}

impl ScheduleArgs {
    /// The schedule described by the flags, if any
    pub fn parse(&self) -> anyhow::Result<Option<Schedule>> {
        if let Some(json) = &self.schedule {
            let schedule: Schedule =
                serde_json::from_str(json).context("parsing --schedule JSON")?;
            return Ok(Some(schedule));
        }
        if let Some(time) = &self.daily {
            return Ok(Some(Schedule::Daily {
                time: parse_time(time)?,
            }));
        }
        if let Some(every) = &self.every {
            let duration = humantime::parse_duration(every)
                .map_err(|e| anyhow!("invalid --every {every:?}: {e}"))?;
            let time = match &self.time {
                Some(time) => parse_time(time)?,
                None => NaiveTime::default(),
            };
            let (interval, unit) = split_interval(duration)?;
            return Ok(Some(Schedule::Every {
                interval,
                unit,
                time,
            }));
        }
        if let Some(at) = &self.at {
            let at = DateTime::parse_from_rfc3339(at)
                .with_context(|| format!("invalid --at {at:?}"))?
                .with_timezone(&Utc);
            return Ok(Some(Schedule::OneTime { at }));
        }
        Ok(None)
    }
}

/// Parse `HH:MM` or `HH:MM:SS`
pub fn parse_time(text: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .with_context(|| format!("invalid time {text:?}, expected HH:MM"))
}

/// Express a duration in the largest whole unit
pub fn split_interval(duration: Duration) -> anyhow::Result<(i64, IntervalUnit)> {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const WEEK: u64 = 7 * DAY;

    let secs = duration.as_secs();
    if secs == 0 || duration.subsec_nanos() != 0 || secs % MINUTE != 0 {
        bail!("interval must be a positive whole number of minutes");
    }
    let (count, unit) = if secs % WEEK == 0 {
        (secs / WEEK, IntervalUnit::Weeks)
    } else if secs % DAY == 0 {
        (secs / DAY, IntervalUnit::Days)
    } else if secs % HOUR == 0 {
        (secs / HOUR, IntervalUnit::Hours)
    } else {
        (secs / MINUTE, IntervalUnit::Minutes)
    };
    let count = i64::try_from(count).map_err(|_| anyhow!("interval too large"))?;
    Ok((count, unit))
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
