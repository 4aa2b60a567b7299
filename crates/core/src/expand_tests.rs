// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{FixedOffset, Weekday};
use proptest::prelude::*;

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn expand(schedule: &Schedule, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    Expander::utc().expand(schedule, Window::new(start, end))
}

// =============================================================================
// Per-variant rules
// =============================================================================

#[test]
fn daily_emits_one_instance_per_day_in_window() {
    let start = utc(2024, 1, 15, 12, 0);
    let out = expand(
        &Schedule::Daily { time: hm(9, 0) },
        start,
        start + Duration::hours(72),
    );
    assert_eq!(
        out,
        vec![
            utc(2024, 1, 16, 9, 0),
            utc(2024, 1, 17, 9, 0),
            utc(2024, 1, 18, 9, 0),
        ]
    );
}

#[test]
fn one_time_inside_window_is_emitted() {
    let at = utc(2024, 5, 1, 8, 0);
    let schedule = Schedule::OneTime { at };
    assert_eq!(expand(&schedule, at, at), vec![at]);
    assert_eq!(
        expand(&schedule, at - Duration::hours(1), at + Duration::hours(1)),
        vec![at]
    );
}

#[test]
fn one_time_outside_window_is_dropped() {
    let at = utc(2024, 5, 1, 8, 0);
    let schedule = Schedule::OneTime { at };
    assert!(expand(&schedule, at + Duration::seconds(1), at + Duration::days(1)).is_empty());
    assert!(expand(&schedule, at - Duration::days(1), at - Duration::seconds(1)).is_empty());
}

#[test]
fn every_five_minutes_for_an_hour_yields_twelve() {
    let t0 = utc(2024, 1, 15, 12, 0);
    let schedule = Schedule::Every {
        interval: 5,
        unit: IntervalUnit::Minutes,
        time: hm(0, 0),
    };
    let out = expand(&schedule, t0, t0 + Duration::hours(1));
    assert_eq!(out.len(), 12);
    assert_eq!(out.first(), Some(&(t0 + Duration::minutes(5))));
    assert_eq!(out.last(), Some(&(t0 + Duration::hours(1))));
}

#[test]
fn minute_steps_anchor_to_the_whole_minute() {
    let t0 = utc(2024, 1, 15, 12, 0) + Duration::seconds(42);
    let schedule = Schedule::Every {
        interval: 10,
        unit: IntervalUnit::Minutes,
        time: hm(0, 0),
    };
    let out = expand(&schedule, t0, t0 + Duration::minutes(30));
    assert_eq!(
        out,
        vec![
            utc(2024, 1, 15, 12, 10),
            utc(2024, 1, 15, 12, 20),
            utc(2024, 1, 15, 12, 30),
        ]
    );
}

#[test]
fn hourly_aligns_to_minute_of_hour() {
    let schedule = Schedule::Hourly {
        interval: 2,
        time: hm(0, 30),
    };
    let out = expand(&schedule, utc(2024, 1, 15, 10, 10), utc(2024, 1, 15, 16, 0));
    assert_eq!(
        out,
        vec![
            utc(2024, 1, 15, 10, 30),
            utc(2024, 1, 15, 12, 30),
            utc(2024, 1, 15, 14, 30),
        ]
    );
}

#[test]
fn every_hours_matches_hourly() {
    let start = utc(2024, 1, 15, 10, 10);
    let end = utc(2024, 1, 16, 10, 10);
    let hourly = expand(
        &Schedule::Hourly {
            interval: 3,
            time: hm(7, 45),
        },
        start,
        end,
    );
    let every = expand(
        &Schedule::Every {
            interval: 3,
            unit: IntervalUnit::Hours,
            time: hm(7, 45),
        },
        start,
        end,
    );
    assert_eq!(hourly, every);
    assert_eq!(hourly.first(), Some(&utc(2024, 1, 15, 10, 45)));
}

#[test]
fn every_days_starts_at_first_instance_after_window_start() {
    let schedule = Schedule::Every {
        interval: 2,
        unit: IntervalUnit::Days,
        time: hm(8, 0),
    };
    let out = expand(&schedule, utc(2024, 1, 15, 9, 0), utc(2024, 1, 21, 0, 0));
    assert_eq!(
        out,
        vec![
            utc(2024, 1, 16, 8, 0),
            utc(2024, 1, 18, 8, 0),
            utc(2024, 1, 20, 8, 0),
        ]
    );
}

#[test]
fn every_weeks_steps_seven_days() {
    let schedule = Schedule::Every {
        interval: 1,
        unit: IntervalUnit::Weeks,
        time: hm(8, 0),
    };
    let out = expand(&schedule, utc(2024, 1, 15, 0, 0), utc(2024, 2, 5, 0, 0));
    assert_eq!(
        out,
        vec![
            utc(2024, 1, 15, 8, 0),
            utc(2024, 1, 22, 8, 0),
            utc(2024, 1, 29, 8, 0),
        ]
    );
}

#[test]
fn weekdays_filters_by_day() {
    // 2024-01-15 is a Monday
    let schedule = Schedule::Weekdays {
        time: hm(9, 0),
        days: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
    };
    let out = expand(&schedule, utc(2024, 1, 15, 0, 0), utc(2024, 1, 22, 0, 0));
    assert_eq!(
        out,
        vec![
            utc(2024, 1, 15, 9, 0),
            utc(2024, 1, 17, 9, 0),
            utc(2024, 1, 19, 9, 0),
        ]
    );
}

#[test]
fn biweekly_uses_even_weeks_from_window_start() {
    // Window starts Wednesday 2024-01-03; its week (from Monday 2024-01-01) is week 0
    let schedule = Schedule::Biweekly {
        time: hm(9, 0),
        days: vec![Weekday::Mon],
    };
    let out = expand(&schedule, utc(2024, 1, 3, 0, 0), utc(2024, 1, 31, 0, 0));
    assert_eq!(out, vec![utc(2024, 1, 15, 9, 0), utc(2024, 1, 29, 9, 0)]);
}

#[test]
fn monthly_fixed_31_skips_short_months() {
    let schedule = Schedule::Monthly {
        rule: DayRule::Fixed { day: 31 },
        time: hm(9, 0),
    };
    let out = expand(&schedule, utc(2024, 2, 1, 0, 0), utc(2024, 4, 30, 23, 59));
    assert_eq!(out, vec![utc(2024, 3, 31, 9, 0)]);
    assert!(out.iter().all(|t| t.month() == 3));
}

#[test]
fn monthly_first_weekday() {
    let schedule = Schedule::Monthly {
        rule: DayRule::FirstWeekday {
            weekday: Weekday::Mon,
        },
        time: hm(9, 0),
    };
    let out = expand(&schedule, utc(2024, 1, 1, 0, 0), utc(2024, 3, 31, 23, 59));
    assert_eq!(
        out,
        vec![
            utc(2024, 1, 1, 9, 0),
            utc(2024, 2, 5, 9, 0),
            utc(2024, 3, 4, 9, 0),
        ]
    );
}

#[test]
fn monthly_last_of_month_handles_leap_february() {
    let schedule = Schedule::Monthly {
        rule: DayRule::LastOfMonth,
        time: hm(18, 0),
    };
    let out = expand(&schedule, utc(2024, 1, 1, 0, 0), utc(2024, 3, 31, 23, 59));
    assert_eq!(
        out,
        vec![
            utc(2024, 1, 31, 18, 0),
            utc(2024, 2, 29, 18, 0),
            utc(2024, 3, 31, 18, 0),
        ]
    );
}

#[test]
fn yearly_feb_29_only_in_leap_years() {
    let schedule = Schedule::Yearly {
        month: 2,
        day: 29,
        time: hm(9, 0),
    };
    let out = expand(&schedule, utc(2024, 1, 1, 0, 0), utc(2025, 12, 31, 23, 59));
    assert_eq!(out, vec![utc(2024, 2, 29, 9, 0)]);
    assert!(out.iter().all(|t| t.year() != 2025));
}

#[test]
fn yearly_spans_multiple_years() {
    let schedule = Schedule::Yearly {
        month: 12,
        day: 25,
        time: hm(7, 0),
    };
    let out = expand(&schedule, utc(2024, 1, 1, 0, 0), utc(2026, 12, 31, 0, 0));
    assert_eq!(
        out,
        vec![
            utc(2024, 12, 25, 7, 0),
            utc(2025, 12, 25, 7, 0),
            utc(2026, 12, 25, 7, 0),
        ]
    );
}

// =============================================================================
// Degenerate inputs
// =============================================================================

#[test]
fn non_positive_intervals_yield_nothing() {
    let start = utc(2024, 1, 1, 0, 0);
    let end = start + Duration::days(3);
    let schedules = [
        Schedule::Every {
            interval: 0,
            unit: IntervalUnit::Minutes,
            time: hm(0, 0),
        },
        Schedule::Every {
            interval: -5,
            unit: IntervalUnit::Days,
            time: hm(0, 0),
        },
        Schedule::Every {
            interval: 0,
            unit: IntervalUnit::Weeks,
            time: hm(0, 0),
        },
        Schedule::Hourly {
            interval: 0,
            time: hm(0, 0),
        },
    ];
    for schedule in &schedules {
        assert!(expand(schedule, start, end).is_empty(), "{schedule:?}");
    }
}

#[test]
fn reversed_window_yields_nothing() {
    let schedule = Schedule::Daily { time: hm(9, 0) };
    assert!(expand(&schedule, utc(2024, 1, 10, 0, 0), utc(2024, 1, 1, 0, 0)).is_empty());
}

#[test]
fn empty_weekday_set_yields_nothing() {
    let schedule = Schedule::Weekdays {
        time: hm(9, 0),
        days: vec![],
    };
    assert!(expand(&schedule, utc(2024, 1, 1, 0, 0), utc(2024, 2, 1, 0, 0)).is_empty());
}

// =============================================================================
// Secondary entry points
// =============================================================================

#[test]
fn expand_from_truncates_to_max_alarms() {
    let start = utc(2024, 1, 15, 12, 0);
    let schedule = Schedule::Every {
        interval: 5,
        unit: IntervalUnit::Minutes,
        time: hm(0, 0),
    };
    let expander = Expander::utc();
    let full = expander.expand_from(&schedule, start, Duration::hours(24), None);
    let capped = expander.expand_from(&schedule, start, Duration::hours(24), Some(100));

    assert_eq!(full.len(), 288);
    assert_eq!(capped.len(), 100);
    assert_eq!(capped[..], full[..100]);
    assert_eq!(capped.last(), Some(&(start + Duration::minutes(500))));
}

#[test]
fn next_occurrence_returns_earliest() {
    let schedule = Schedule::Daily { time: hm(9, 0) };
    let window = Window::starting_at(utc(2024, 1, 15, 12, 0), Duration::days(365));
    assert_eq!(
        Expander::utc().next_occurrence(&schedule, window),
        Some(utc(2024, 1, 16, 9, 0))
    );
}

#[test]
fn next_occurrence_is_cheap_over_long_horizons() {
    let schedule = Schedule::Every {
        interval: 1,
        unit: IntervalUnit::Minutes,
        time: hm(0, 0),
    };
    let start = utc(2024, 1, 15, 12, 0);
    let window = Window::starting_at(start, Duration::days(365 * 50));
    assert_eq!(
        Expander::utc().next_occurrence(&schedule, window),
        Some(start + Duration::minutes(1))
    );
}

#[test]
fn limit_of_zero_yields_nothing() {
    let schedule = Schedule::Daily { time: hm(9, 0) };
    let window = Window::starting_at(utc(2024, 1, 15, 0, 0), Duration::days(3));
    assert!(Expander::utc()
        .expand_limited(&schedule, window, Some(0))
        .is_empty());
}

// =============================================================================
// Time zones
// =============================================================================

#[test]
fn wall_clock_times_use_expander_zone() {
    let tz = FixedOffset::east_opt(3600).unwrap();
    let schedule = Schedule::Daily { time: hm(9, 0) };
    let out = Expander::new(tz).expand(
        &schedule,
        Window::new(utc(2024, 1, 15, 0, 0), utc(2024, 1, 16, 0, 0)),
    );
    assert_eq!(out, vec![utc(2024, 1, 15, 8, 0)]);
}

#[test]
fn hour_alignment_uses_local_minutes() {
    let tz = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
    let schedule = Schedule::Hourly {
        interval: 1,
        time: hm(0, 0),
    };
    let out = Expander::new(tz).expand(
        &schedule,
        Window::new(utc(2024, 1, 15, 0, 0), utc(2024, 1, 15, 2, 0)),
    );
    assert_eq!(out, vec![utc(2024, 1, 15, 0, 30), utc(2024, 1, 15, 1, 30)]);
}

// =============================================================================
// Properties
// =============================================================================

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn base() -> DateTime<Utc> {
    utc(2023, 12, 20, 0, 0)
}

fn arb_time() -> impl Strategy<Value = NaiveTime> {
    (0..24u32, 0..60u32).prop_map(|(h, m)| hm(h, m))
}

fn arb_weekday() -> impl Strategy<Value = Weekday> {
    (0..7usize).prop_map(|i| WEEKDAYS[i])
}

fn arb_days() -> impl Strategy<Value = Vec<Weekday>> {
    proptest::collection::vec(arb_weekday(), 0..4)
}

fn arb_unit() -> impl Strategy<Value = IntervalUnit> {
    prop_oneof![
        Just(IntervalUnit::Minutes),
        Just(IntervalUnit::Hours),
        Just(IntervalUnit::Days),
        Just(IntervalUnit::Weeks),
    ]
}

fn arb_rule() -> impl Strategy<Value = DayRule> {
    prop_oneof![
        (1..=31u32).prop_map(|day| DayRule::Fixed { day }),
        arb_weekday().prop_map(|weekday| DayRule::FirstWeekday { weekday }),
        arb_weekday().prop_map(|weekday| DayRule::LastWeekday { weekday }),
        Just(DayRule::FirstOfMonth),
        Just(DayRule::LastOfMonth),
    ]
}

fn arb_schedule() -> impl Strategy<Value = Schedule> {
    prop_oneof![
        (0..90 * 86_400i64).prop_map(|s| Schedule::OneTime {
            at: base() + Duration::seconds(s)
        }),
        arb_time().prop_map(|time| Schedule::Daily { time }),
        (-1..12i64, arb_time()).prop_map(|(interval, time)| Schedule::Hourly { interval, time }),
        (-1..200i64, arb_unit(), arb_time()).prop_map(|(interval, unit, time)| {
            Schedule::Every {
                interval,
                unit,
                time,
            }
        }),
        (arb_time(), arb_days()).prop_map(|(time, days)| Schedule::Weekdays { time, days }),
        (arb_time(), arb_days()).prop_map(|(time, days)| Schedule::Biweekly { time, days }),
        (arb_rule(), arb_time()).prop_map(|(rule, time)| Schedule::Monthly { rule, time }),
        (1..=12u32, 1..=31u32, arb_time())
            .prop_map(|(month, day, time)| Schedule::Yearly { month, day, time }),
    ]
}

fn arb_window() -> impl Strategy<Value = Window> {
    (0..60 * 86_400i64, 0..10 * 86_400i64).prop_map(|(offset, len)| {
        Window::starting_at(base() + Duration::seconds(offset), Duration::seconds(len))
    })
}

proptest! {
    #[test]
    fn output_is_sorted_and_within_window(schedule in arb_schedule(), window in arb_window()) {
        let out = Expander::utc().expand(&schedule, window);
        prop_assert!(out.windows(2).all(|pair| pair[0] <= pair[1]));
        prop_assert!(out.iter().all(|t| window.contains(*t)));
    }

    #[test]
    fn offset_zones_keep_output_sorted_and_within_window(
        schedule in arb_schedule(),
        window in arb_window(),
        offset_minutes in -12 * 60..14 * 60i32,
    ) {
        let tz = FixedOffset::east_opt(offset_minutes * 60).unwrap();
        let out = Expander::new(tz).expand(&schedule, window);
        prop_assert!(out.windows(2).all(|pair| pair[0] <= pair[1]));
        prop_assert!(out.iter().all(|t| window.contains(*t)));
    }

    #[test]
    fn limited_output_is_a_prefix(schedule in arb_schedule(), window in arb_window(), limit in 0..20usize) {
        let expander = Expander::utc();
        let full = expander.expand(&schedule, window);
        let limited = expander.expand_limited(&schedule, window, Some(limit));
        prop_assert_eq!(&limited[..], &full[..full.len().min(limit)]);
    }
}

#[test]
fn next_midnight_is_start_of_following_local_day() {
    let expander = Expander::utc();
    assert_eq!(
        expander.next_midnight(utc(2024, 1, 15, 12, 0)),
        utc(2024, 1, 16, 0, 0)
    );
    assert_eq!(
        expander.next_midnight(utc(2024, 2, 28, 23, 59)),
        utc(2024, 2, 29, 0, 0)
    );

    let tz = FixedOffset::east_opt(2 * 3600).unwrap();
    assert_eq!(
        Expander::new(tz).next_midnight(utc(2024, 1, 15, 12, 0)),
        utc(2024, 1, 15, 22, 0)
    );
}
