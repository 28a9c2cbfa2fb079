use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveTime, Weekday};

use super::{Cents, Month};

/// Parse configured day names into weekdays. Case-insensitive; both full
/// names and three-letter abbreviations work. Unrecognized names are dropped.
pub fn resolve_weekdays(day_names: &[String]) -> HashSet<Weekday> {
    day_names
        .iter()
        .filter_map(|name| name.trim().parse::<Weekday>().ok())
        .collect()
}

/// Number of scheduled lesson days falling inside the month.
pub fn count_lesson_days(month: Month, weekdays: &HashSet<Weekday>) -> u32 {
    if weekdays.is_empty() {
        return 0;
    }
    let last = month.last_day();
    month
        .first_day()
        .iter_days()
        .take_while(|day| *day <= last)
        .filter(|day| weekdays.contains(&day.weekday()))
        .count() as u32
}

/// Price of a single lesson given the month's lesson count.
/// Kept fractional so rounding happens once, at the final earned amount.
pub fn per_lesson_rate(price_cents: Cents, lesson_days: u32) -> f64 {
    if lesson_days == 0 {
        return 0.0;
    }
    price_cents as f64 / lesson_days as f64
}

/// Teacher earnings from one group: attended lessons times the per-lesson
/// rate, scaled by the teacher's percentage, rounded to whole cents.
pub fn group_earned(attended_count: u32, per_lesson_rate: f64, percentage: u8) -> Cents {
    (attended_count as f64 * per_lesson_rate * percentage as f64 / 100.0).round() as Cents
}

/// Whether two weekly slots collide: a shared weekday with start times
/// less than two hours apart.
pub fn slots_clash(
    days_a: &[String],
    start_a: NaiveTime,
    days_b: &[String],
    start_b: NaiveTime,
) -> bool {
    let weekdays_a = resolve_weekdays(days_a);
    let weekdays_b = resolve_weekdays(days_b);
    if weekdays_a.is_disjoint(&weekdays_b) {
        return false;
    }
    let gap = if start_a > start_b {
        start_a - start_b
    } else {
        start_b - start_a
    };
    gap < Duration::hours(2)
}
