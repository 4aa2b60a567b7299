// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurrence expansion: (schedule, window) to sorted trigger instants
//!
//! Expansion is pure. Wall-clock schedule times are interpreted in the
//! expander's time zone; calendar-invalid or non-existent local instants are
//! skipped rather than reported.

use crate::schedule::{DayRule, IntervalUnit, Schedule};
use chrono::{
    DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc,
};

/// A closed time interval; both ends are inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of `duration` beginning at `start`
    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Self {
        let end = start.checked_add_signed(duration).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Accumulates in-window instants, stopping once the limit is reached
struct Collector {
    window: Window,
    limit: Option<usize>,
    out: Vec<DateTime<Utc>>,
}

impl Collector {
    fn new(window: Window, limit: Option<usize>) -> Self {
        Self {
            window,
            limit,
            out: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.out.len() >= limit)
    }

    /// Offer a candidate. Returns false once no more results are wanted.
    fn offer(&mut self, instant: DateTime<Utc>) -> bool {
        if self.is_full() {
            return false;
        }
        if self.window.contains(instant) {
            self.out.push(instant);
        }
        !self.is_full()
    }
}

/// Expands schedules into concrete trigger instants
#[derive(Debug, Clone)]
pub struct Expander<Tz: TimeZone = Utc> {
    tz: Tz,
}

impl Expander<Utc> {
    pub fn utc() -> Self {
        Self { tz: Utc }
    }
}

impl Default for Expander<Utc> {
    fn default() -> Self {
        Self::utc()
    }
}

impl<Tz: TimeZone> Expander<Tz> {
    /// Create an expander evaluating wall-clock times in `tz`
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// All occurrences of `schedule` inside `window`, ascending
    pub fn expand(&self, schedule: &Schedule, window: Window) -> Vec<DateTime<Utc>> {
        self.expand_limited(schedule, window, None)
    }

    /// The first `limit` occurrences of `schedule` inside `window`, ascending.
    ///
    /// Equivalent to truncating the output of [`Expander::expand`].
    pub fn expand_limited(
        &self,
        schedule: &Schedule,
        window: Window,
        limit: Option<usize>,
    ) -> Vec<DateTime<Utc>> {
        let mut collector = Collector::new(window, limit);
        if window.is_empty() || collector.is_full() {
            return collector.out;
        }

        match schedule {
            Schedule::OneTime { at } => {
                collector.offer(*at);
            }
            Schedule::Daily { time } => {
                self.each_day(&mut collector, *time, |_| true);
            }
            Schedule::Hourly { interval, time } => {
                self.hour_steps(&mut collector, *interval, *time);
            }
            Schedule::Every {
                interval,
                unit,
                time,
            } => match unit {
                IntervalUnit::Minutes => self.minute_steps(&mut collector, *interval),
                IntervalUnit::Hours => self.hour_steps(&mut collector, *interval, *time),
                IntervalUnit::Days => self.day_steps(&mut collector, *interval, *time),
                IntervalUnit::Weeks => {
                    self.day_steps(&mut collector, interval.saturating_mul(7), *time)
                }
            },
            Schedule::Weekdays { time, days } => {
                self.each_day(&mut collector, *time, |date| days.contains(&date.weekday()));
            }
            Schedule::Biweekly { time, days } => {
                let anchor = week_start(self.local_date(window.start));
                self.each_day(&mut collector, *time, |date| {
                    let week = (date - anchor).num_days().div_euclid(7);
                    week % 2 == 0 && days.contains(&date.weekday())
                });
            }
            Schedule::Monthly { rule, time } => {
                self.each_month(&mut collector, rule, *time);
            }
            Schedule::Yearly { month, day, time } => {
                let first = self.local_date(window.start).year();
                let last = self.local_date(window.end).year();
                for year in first..=last {
                    let Some(date) = NaiveDate::from_ymd_opt(year, *month, *day) else {
                        continue;
                    };
                    if let Some(instant) = self.resolve(date, *time) {
                        if !collector.offer(instant) {
                            break;
                        }
                    }
                }
            }
        }

        collector.out
    }

    /// Occurrences in `[start, start + duration]`, truncated to `max_alarms`
    pub fn expand_from(
        &self,
        schedule: &Schedule,
        start: DateTime<Utc>,
        duration: Duration,
        max_alarms: Option<usize>,
    ) -> Vec<DateTime<Utc>> {
        self.expand_limited(schedule, Window::starting_at(start, duration), max_alarms)
    }

    /// The earliest occurrence inside `window`, if any
    pub fn next_occurrence(&self, schedule: &Schedule, window: Window) -> Option<DateTime<Utc>> {
        self.expand_limited(schedule, window, Some(1)).into_iter().next()
    }

    /// The next local midnight strictly after `now`
    pub fn next_midnight(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = self.local_date(now);
        loop {
            let Some(next) = date.succ_opt() else {
                return now + Duration::days(1);
            };
            date = next;
            if let Some(midnight) = self.resolve(date, NaiveTime::default()) {
                if midnight > now {
                    return midnight;
                }
            }
        }
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Local wall-clock date and time to an absolute instant.
    ///
    /// Non-existent local times resolve to `None`; ambiguous ones to the earlier instant.
    fn resolve(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn each_day(
        &self,
        collector: &mut Collector,
        time: NaiveTime,
        include: impl Fn(NaiveDate) -> bool,
    ) {
        let last = self.local_date(collector.window.end);
        let mut date = self.local_date(collector.window.start);
        while date <= last {
            if include(date) {
                if let Some(instant) = self.resolve(date, time) {
                    if !collector.offer(instant) {
                        return;
                    }
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => return,
            }
        }
    }

    fn each_month(&self, collector: &mut Collector, rule: &DayRule, time: NaiveTime) {
        let first = self.local_date(collector.window.start);
        let last = self.local_date(collector.window.end);
        let (mut year, mut month) = (first.year(), first.month());
        while (year, month) <= (last.year(), last.month()) {
            if let Some(instant) = rule
                .resolve(year, month)
                .and_then(|date| self.resolve(date, time))
            {
                if !collector.offer(instant) {
                    return;
                }
            }
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
    }

    /// Sub-hour steps anchored to the window start (truncated to the minute);
    /// the first occurrence is one interval after the anchor.
    fn minute_steps(&self, collector: &mut Collector, interval: i64) {
        if interval <= 0 {
            return;
        }
        let start = collector.window.start;
        let anchor = start - Duration::seconds(i64::from(start.second()))
            - Duration::nanoseconds(i64::from(start.nanosecond()));
        self.step(collector, anchor, Duration::minutes(interval), true);
    }

    /// Hour steps aligned to `time`'s minute past the hour (in local time)
    fn hour_steps(&self, collector: &mut Collector, interval: i64, time: NaiveTime) {
        if interval <= 0 {
            return;
        }
        let start = collector.window.start;
        let local = start.with_timezone(&self.tz).naive_local();
        let Some(aligned_local) = local.date().and_hms_opt(local.hour(), time.minute(), 0) else {
            return;
        };
        let mut first = start + (aligned_local - local);
        if first < start {
            first += Duration::hours(1);
        }
        self.step(collector, first, Duration::hours(interval), false);
    }

    fn step(
        &self,
        collector: &mut Collector,
        origin: DateTime<Utc>,
        step: Duration,
        skip_origin: bool,
    ) {
        let mut current = if skip_origin {
            match origin.checked_add_signed(step) {
                Some(next) => next,
                None => return,
            }
        } else {
            origin
        };
        while current <= collector.window.end {
            if !collector.offer(current) {
                return;
            }
            match current.checked_add_signed(step) {
                Some(next) => current = next,
                None => return,
            }
        }
    }

    /// Calendar-day steps at a wall-clock time, starting at the first
    /// instance on or after the window start
    fn day_steps(&self, collector: &mut Collector, interval_days: i64, time: NaiveTime) {
        let Ok(step) = u64::try_from(interval_days) else {
            return;
        };
        if step == 0 {
            return;
        }
        let start = collector.window.start;
        let last = self.local_date(collector.window.end);
        let mut date = self.local_date(start);
        if self.resolve(date, time).map_or(true, |instant| instant < start) {
            match date.succ_opt() {
                Some(next) => date = next,
                None => return,
            }
        }
        while date <= last {
            if let Some(instant) = self.resolve(date, time) {
                if !collector.offer(instant) {
                    return;
                }
            }
            match date.checked_add_days(Days::new(step)) {
                Some(next) => date = next,
                None => return,
            }
        }
    }
}

/// Monday of the week containing `date`
fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;
