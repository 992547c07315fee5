//! The structured recurrence rule produced by the parser.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::codec::DateTuple;
use crate::error::RecurrenceError;

/// How often a rule's period repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// The wire literal, e.g. `"MONTHLY"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Secondly => "SECONDLY",
            Frequency::Minutely => "MINUTELY",
            Frequency::Hourly => "HOURLY",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SECONDLY" => Ok(Frequency::Secondly),
            "MINUTELY" => Ok(Frequency::Minutely),
            "HOURLY" => Ok(Frequency::Hourly),
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(RecurrenceError::InvalidFrequency(other.to_string())),
        }
    }
}

/// Parse a two-letter weekday code (`SU`, `MO`, ... `SA`).
pub fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code {
        "SU" => Some(Weekday::Sun),
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        _ => None,
    }
}

/// The two-letter code for a weekday.
pub fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "SU",
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
    }
}

/// One BYDAY item: a weekday, optionally qualified by its position within
/// the month or year (`1TU` is the first Tuesday, `-1FR` the last Friday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekdayNum {
    pub ordinal: Option<i32>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Every `weekday` in the period.
    pub fn every(weekday: Weekday) -> Self {
        WeekdayNum {
            ordinal: None,
            weekday,
        }
    }

    /// The `ordinal`-th `weekday` in the period, negative counting from the end.
    pub fn nth(ordinal: i32, weekday: Weekday) -> Self {
        WeekdayNum {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{}", n)?;
        }
        f.write_str(weekday_code(self.weekday))
    }
}

impl TryFrom<String> for WeekdayNum {
    type Error = RecurrenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekdayNum> for String {
    fn from(value: WeekdayNum) -> Self {
        value.to_string()
    }
}

impl FromStr for WeekdayNum {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RecurrenceError::InvalidWeekday(s.to_string());
        if s.len() < 2 || !s.is_char_boundary(s.len() - 2) {
            return Err(invalid());
        }
        let (prefix, code) = s.split_at(s.len() - 2);
        let weekday = weekday_from_code(code).ok_or_else(invalid)?;
        if prefix.is_empty() {
            return Ok(WeekdayNum::every(weekday));
        }
        match prefix.parse::<i32>() {
            Ok(0) | Err(_) => Err(invalid()),
            Ok(n) => Ok(WeekdayNum::nth(n, weekday)),
        }
    }
}

/// A validated recurrence rule.
///
/// Values are only produced by [`crate::parser::parse_rule`]; every field has
/// already been checked syntactically. Numeric BY*-parts keep their source
/// order; semantic range checks (e.g. `BYMONTH=13`) are not performed and
/// simply produce no candidates during generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub(crate) freq: Frequency,
    pub(crate) interval: u32,
    pub(crate) count: Option<u32>,
    pub(crate) until: Option<DateTuple>,
    pub(crate) by_day: Vec<WeekdayNum>,
    pub(crate) by_month_day: Vec<i32>,
    pub(crate) by_month: Vec<i32>,
    pub(crate) by_year_day: Vec<i32>,
    pub(crate) by_week_no: Vec<i32>,
    pub(crate) by_hour: Vec<i32>,
    pub(crate) by_minute: Vec<i32>,
    pub(crate) by_second: Vec<i32>,
    pub(crate) by_set_pos: Vec<i32>,
    pub(crate) wkst: Weekday,
}

impl Rule {
    pub(crate) fn new(freq: Frequency) -> Self {
        Rule {
            freq,
            interval: 1,
            count: None,
            until: None,
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
            by_year_day: Vec::new(),
            by_week_no: Vec::new(),
            by_hour: Vec::new(),
            by_minute: Vec::new(),
            by_second: Vec::new(),
            by_set_pos: Vec::new(),
            wkst: Weekday::Mon,
        }
    }

    pub fn freq(&self) -> Frequency {
        self.freq
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn count(&self) -> Option<u32> {
        self.count
    }

    /// The `UNTIL` bound as written; resolve it with an offset source via
    /// [`DateTuple::to_local`].
    pub fn until(&self) -> Option<&DateTuple> {
        self.until.as_ref()
    }

    pub fn by_day(&self) -> &[WeekdayNum] {
        &self.by_day
    }

    pub fn by_month_day(&self) -> &[i32] {
        &self.by_month_day
    }

    pub fn by_month(&self) -> &[i32] {
        &self.by_month
    }

    pub fn by_year_day(&self) -> &[i32] {
        &self.by_year_day
    }

    pub fn by_week_no(&self) -> &[i32] {
        &self.by_week_no
    }

    pub fn by_hour(&self) -> &[i32] {
        &self.by_hour
    }

    pub fn by_minute(&self) -> &[i32] {
        &self.by_minute
    }

    pub fn by_second(&self) -> &[i32] {
        &self.by_second
    }

    pub fn by_set_pos(&self) -> &[i32] {
        &self.by_set_pos
    }

    /// First day of the week, `MO` unless `WKST` says otherwise.
    pub fn wkst(&self) -> Weekday {
        self.wkst
    }
}
