//! RRULE string → [`Rule`].
//!
//! The grammar is a `;`-separated list of `KEY=VALUE` parts with
//! comma-separated multi-values. Keys and values are case-sensitive.
//!
//! Validation is purely syntactic and fails closed: a single malformed item
//! anywhere rejects the whole rule, never a partially populated one. Unknown
//! keys are skipped so newer rule parts do not break older readers.

use std::str::FromStr;

use chrono::Weekday;

use crate::codec::DateTuple;
use crate::error::{RecurrenceError, Result};
use crate::rule::{weekday_from_code, Frequency, Rule, WeekdayNum};

/// Parse and validate a rule string.
///
/// # Errors
/// Returns the first problem found: a missing or unknown `FREQ`, a malformed
/// number, an unknown weekday, an empty `BYDAY`, or an undecodable `UNTIL`.
pub fn parse_rule(source: &str) -> Result<Rule> {
    let mut freq = None;
    // Placeholder frequency; replaced once FREQ is known.
    let mut rule = Rule::new(Frequency::Daily);

    for part in source.split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key {
            "FREQ" => freq = Some(value.parse::<Frequency>()?),
            "INTERVAL" => rule.interval = parse_interval(value)?,
            "COUNT" => rule.count = Some(parse_unsigned("COUNT", value)?),
            "UNTIL" => rule.until = Some(DateTuple::parse(value)?),
            "BYDAY" => rule.by_day = parse_by_day(value)?,
            "BYMONTHDAY" => rule.by_month_day = parse_int_list("BYMONTHDAY", value)?,
            "BYMONTH" => rule.by_month = parse_int_list("BYMONTH", value)?,
            "BYYEARDAY" => rule.by_year_day = parse_int_list("BYYEARDAY", value)?,
            "BYWEEKNO" => rule.by_week_no = parse_int_list("BYWEEKNO", value)?,
            "BYHOUR" => rule.by_hour = parse_int_list("BYHOUR", value)?,
            "BYMINUTE" => rule.by_minute = parse_int_list("BYMINUTE", value)?,
            "BYSECOND" => rule.by_second = parse_int_list("BYSECOND", value)?,
            "BYSETPOS" => rule.by_set_pos = parse_int_list("BYSETPOS", value)?,
            "WKST" => {
                rule.wkst = weekday_from_code(value)
                    .ok_or_else(|| RecurrenceError::InvalidWeekday(value.to_string()))?
            }
            _ => {}
        }
    }

    rule.freq = freq.ok_or(RecurrenceError::MissingFrequency)?;
    Ok(rule)
}

impl FromStr for Rule {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self> {
        parse_rule(s)
    }
}

/// Whether `source` parses as a valid rule.
pub fn is_valid_rule(source: &str) -> bool {
    parse_rule(source).is_ok()
}

/// The weekdays named by a rule's `BYDAY` part, in source order and without
/// ordinals.
///
/// Returns an empty list when the rule is invalid or has no `BYDAY`.
pub fn days_from_byday(source: &str) -> Vec<Weekday> {
    parse_rule(source)
        .map(|rule| rule.by_day.iter().map(|d| d.weekday).collect())
        .unwrap_or_default()
}

fn parse_unsigned(part: &'static str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| RecurrenceError::InvalidNumber {
        part,
        value: value.to_string(),
    })
}

fn parse_interval(value: &str) -> Result<u32> {
    match parse_unsigned("INTERVAL", value)? {
        0 => Err(RecurrenceError::InvalidInterval(value.to_string())),
        n => Ok(n),
    }
}

fn parse_int_list(part: &'static str, value: &str) -> Result<Vec<i32>> {
    value
        .split(',')
        .map(|item| {
            item.parse::<i32>().map_err(|_| RecurrenceError::InvalidNumber {
                part,
                value: item.to_string(),
            })
        })
        .collect()
}

fn parse_by_day(value: &str) -> Result<Vec<WeekdayNum>> {
    if value.is_empty() {
        return Err(RecurrenceError::EmptyByDay);
    }
    value.split(',').map(WeekdayNum::from_str).collect()
}
