//! Week boundaries and week numbers for an arbitrary first day of the week.
//!
//! Week 1 of a year is the first week (starting on `wkst`) that has at least
//! four of its days in that year, so it always contains January 4th. With
//! `wkst = MO` this is exactly ISO 8601 week numbering.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Number of days from `start` forward to `weekday` (0..=6).
pub fn days_since(weekday: Weekday, start: Weekday) -> u64 {
    u64::from((7 + weekday.num_days_from_monday() - start.num_days_from_monday()) % 7)
}

/// The first day of the week containing `date`.
pub fn first_of_week(wkst: Weekday, date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(days_since(date.weekday(), wkst)))
}

/// The last day of the week containing `date`.
pub fn last_of_week(wkst: Weekday, date: NaiveDate) -> Option<NaiveDate> {
    first_of_week(wkst, date)?.checked_add_days(Days::new(6))
}

/// The first day of week 1 of `year`.
pub fn week_start_of_year(wkst: Weekday, year: i32) -> Option<NaiveDate> {
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4)?;
    first_of_week(wkst, jan4)
}

/// 53 for "long" years, 52 otherwise.
pub fn weeks_in_year(wkst: Weekday, year: i32) -> Option<u32> {
    let this = week_start_of_year(wkst, year)?;
    let next = week_start_of_year(wkst, year + 1)?;
    let days = next.signed_duration_since(this).num_days();
    u32::try_from(days / 7).ok()
}

/// The first day of week number `week` of `year`.
///
/// Negative numbers count back from the last week (`-1` is the last week).
/// Returns `None` when the week does not exist in that year.
pub fn start_of_week_number(wkst: Weekday, year: i32, week: i32) -> Option<NaiveDate> {
    let total = i32::try_from(weeks_in_year(wkst, year)?).ok()?;
    let week = if week < 0 { total + week + 1 } else { week };
    if !(1..=total).contains(&week) {
        return None;
    }
    let offset = u64::try_from(week - 1).ok()? * 7;
    week_start_of_year(wkst, year)?.checked_add_days(Days::new(offset))
}
