//! RFC 5545 compliance test vectors, derived from the Section 3.8.5.3
//! examples.
//!
//! All examples run with a zero UTC offset, so `...Z` UNTIL values read as
//! wall-clock time.

use chrono::{NaiveDate, NaiveDateTime};
use recurrence_engine::{parse_rule, FixedOffsetMinutes};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .expect("valid test date")
}

/// The first `n` occurrences of `rule` from `start`.
fn first(rule: &str, start: NaiveDateTime, n: usize) -> Vec<NaiveDateTime> {
    parse_rule(rule)
        .expect("rule should parse")
        .occurrences(start, &FixedOffsetMinutes::UTC)
        .take(n)
        .collect()
}

/// The `(year, month, day)` of each date.
fn ymd(dates: &[NaiveDateTime]) -> Vec<(i32, u32, u32)> {
    use chrono::Datelike;
    dates.iter().map(|d| (d.year(), d.month(), d.day())).collect()
}

// ===========================================================================
// Weekly
// ===========================================================================

#[test]
fn every_other_week_tue_thu() {
    let dates = first("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH", at(2026, 1, 6, 10, 0), 8);
    assert_eq!(
        ymd(&dates),
        vec![
            (2026, 1, 6),
            (2026, 1, 8),
            (2026, 1, 20),
            (2026, 1, 22),
            (2026, 2, 3),
            (2026, 2, 5),
            (2026, 2, 17),
            (2026, 2, 19),
        ]
    );
}

#[test]
fn week_start_changes_biweekly_grouping() {
    let monday = first(
        "FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=MO",
        at(1997, 8, 5, 9, 0),
        10,
    );
    assert_eq!(
        ymd(&monday),
        vec![(1997, 8, 5), (1997, 8, 10), (1997, 8, 19), (1997, 8, 24)]
    );

    let sunday = first(
        "FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU",
        at(1997, 8, 5, 9, 0),
        10,
    );
    assert_eq!(
        ymd(&sunday),
        vec![(1997, 8, 5), (1997, 8, 17), (1997, 8, 19), (1997, 8, 31)]
    );
}

// ===========================================================================
// Monthly
// ===========================================================================

#[test]
fn third_tuesday_monthly() {
    let dates = first("FREQ=MONTHLY;BYDAY=TU;BYSETPOS=3", at(2026, 2, 17, 14, 0), 3);
    assert_eq!(
        dates,
        vec![at(2026, 2, 17, 14, 0), at(2026, 3, 17, 14, 0), at(2026, 4, 21, 14, 0)]
    );
}

#[test]
fn first_and_last_day_of_month() {
    let dates = first("FREQ=MONTHLY;COUNT=10;BYMONTHDAY=1,-1", at(1997, 9, 30, 9, 0), 20);
    assert_eq!(
        ymd(&dates),
        vec![
            (1997, 9, 30),
            (1997, 10, 1),
            (1997, 10, 31),
            (1997, 11, 1),
            (1997, 11, 30),
            (1997, 12, 1),
            (1997, 12, 31),
            (1998, 1, 1),
            (1998, 1, 31),
            (1998, 2, 1),
        ]
    );
}

#[test]
fn last_friday_of_month() {
    let dates = first("FREQ=MONTHLY;BYDAY=-1FR", at(2015, 1, 1, 0, 0), 3);
    assert_eq!(ymd(&dates), vec![(2015, 1, 30), (2015, 2, 27), (2015, 3, 27)]);
}

#[test]
fn friday_the_thirteenth() {
    let dates = first("FREQ=MONTHLY;BYDAY=FR;BYMONTHDAY=13", at(1997, 9, 2, 9, 0), 5);
    assert_eq!(
        ymd(&dates),
        vec![
            (1998, 2, 13),
            (1998, 3, 13),
            (1998, 11, 13),
            (1999, 8, 13),
            (2000, 10, 13),
        ]
    );
}

#[test]
fn first_saturday_after_first_sunday() {
    let dates = first(
        "FREQ=MONTHLY;BYDAY=SA;BYMONTHDAY=7,8,9,10,11,12,13",
        at(1997, 9, 13, 9, 0),
        5,
    );
    assert_eq!(
        ymd(&dates),
        vec![
            (1997, 9, 13),
            (1997, 10, 11),
            (1997, 11, 8),
            (1997, 12, 13),
            (1998, 1, 10),
        ]
    );
}

#[test]
fn third_of_tue_wed_thu() {
    let dates = first("FREQ=MONTHLY;COUNT=3;BYDAY=TU,WE,TH;BYSETPOS=3", at(1997, 9, 4, 9, 0), 10);
    assert_eq!(ymd(&dates), vec![(1997, 9, 4), (1997, 10, 7), (1997, 11, 6)]);
}

#[test]
fn second_to_last_weekday() {
    let dates = first(
        "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-2",
        at(1997, 9, 29, 9, 0),
        7,
    );
    assert_eq!(
        ymd(&dates),
        vec![
            (1997, 9, 29),
            (1997, 10, 30),
            (1997, 11, 27),
            (1997, 12, 30),
            (1998, 1, 29),
            (1998, 2, 26),
            (1998, 3, 30),
        ]
    );
}

// ===========================================================================
// Yearly
// ===========================================================================

#[test]
fn yearly_in_june_and_july() {
    let dates = first("FREQ=YEARLY;COUNT=4;BYMONTH=6,7", at(1997, 6, 10, 9, 0), 10);
    assert_eq!(
        ymd(&dates),
        vec![(1997, 6, 10), (1997, 7, 10), (1998, 6, 10), (1998, 7, 10)]
    );
}

#[test]
fn every_third_year_on_year_days() {
    let dates = first(
        "FREQ=YEARLY;INTERVAL=3;COUNT=4;BYYEARDAY=1,100,200",
        at(1997, 1, 1, 9, 0),
        10,
    );
    assert_eq!(
        ymd(&dates),
        vec![(1997, 1, 1), (1997, 4, 10), (1997, 7, 19), (2000, 1, 1)]
    );
}

#[test]
fn twentieth_monday_of_the_year() {
    let dates = first("FREQ=YEARLY;BYDAY=20MO", at(1997, 5, 19, 9, 0), 3);
    assert_eq!(ymd(&dates), vec![(1997, 5, 19), (1998, 5, 18), (1999, 5, 17)]);
}

#[test]
fn monday_of_week_twenty() {
    let dates = first("FREQ=YEARLY;BYWEEKNO=20;BYDAY=MO", at(1997, 5, 12, 9, 0), 3);
    assert_eq!(ymd(&dates), vec![(1997, 5, 12), (1998, 5, 11), (1999, 5, 17)]);
}

#[test]
fn every_thursday_in_march() {
    let dates = first("FREQ=YEARLY;BYMONTH=3;BYDAY=TH", at(1997, 3, 13, 9, 0), 7);
    assert_eq!(
        ymd(&dates),
        vec![
            (1997, 3, 13),
            (1997, 3, 20),
            (1997, 3, 27),
            (1998, 3, 5),
            (1998, 3, 12),
            (1998, 3, 19),
            (1998, 3, 26),
        ]
    );
}

#[test]
fn us_election_day() {
    let dates = first(
        "FREQ=YEARLY;INTERVAL=4;BYMONTH=11;BYDAY=TU;BYMONTHDAY=2,3,4,5,6,7,8",
        at(1996, 11, 5, 9, 0),
        3,
    );
    assert_eq!(ymd(&dates), vec![(1996, 11, 5), (2000, 11, 7), (2004, 11, 2)]);
}

// ===========================================================================
// Sub-daily
// ===========================================================================

#[test]
fn every_three_hours_until() {
    let dates = first("FREQ=HOURLY;INTERVAL=3;UNTIL=19970902T170000Z", at(1997, 9, 2, 9, 0), 10);
    assert_eq!(
        dates,
        vec![at(1997, 9, 2, 9, 0), at(1997, 9, 2, 12, 0), at(1997, 9, 2, 15, 0)]
    );
}

#[test]
fn every_twenty_minutes_during_office_hours() {
    let rule = "FREQ=DAILY;BYHOUR=9,10,11,12,13,14,15,16;BYMINUTE=0,20,40";
    let dates = first(rule, at(1997, 9, 2, 9, 0), 25);
    assert_eq!(
        &dates[..4],
        &[
            at(1997, 9, 2, 9, 0),
            at(1997, 9, 2, 9, 20),
            at(1997, 9, 2, 9, 40),
            at(1997, 9, 2, 10, 0),
        ]
    );
    assert_eq!(dates[23], at(1997, 9, 2, 16, 40));
    assert_eq!(dates[24], at(1997, 9, 3, 9, 0));
}
