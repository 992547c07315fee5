//! ASCII date/time tokens: `yyyyMMdd`, `yyyyMMddTHHmmss` and `yyyyMMddTHHmmssZ`.
//!
//! [`DateTuple`] is the decoded, field-level form shared by `UNTIL`
//! resolution, exception matching and serialization. Keeping the discrete
//! fields (rather than an instant) lets exception matching tell a date-only
//! token apart from one pinned to midnight.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{RecurrenceError, Result};
use crate::offset::OffsetSource;

/// A decoded ASCII date/time token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateTuple {
    date: NaiveDate,
    time: Option<NaiveTime>,
    utc: bool,
}

impl DateTuple {
    /// Decode a token into its fields, rejecting impossible calendar dates
    /// and times.
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = || RecurrenceError::InvalidDate(token.to_string());
        let bytes = token.as_bytes();

        let (time_part, utc) = match bytes.len() {
            8 => (None, false),
            15 => (Some(&bytes[9..15]), false),
            16 if bytes[15] == b'Z' => (Some(&bytes[9..15]), true),
            _ => return Err(invalid()),
        };
        if time_part.is_some() && bytes[8] != b'T' {
            return Err(invalid());
        }

        let year = digits(&bytes[0..4]).ok_or_else(invalid)?;
        let month = digits(&bytes[4..6]).ok_or_else(invalid)?;
        let day = digits(&bytes[6..8]).ok_or_else(invalid)?;
        let date = NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(invalid)?;

        let time = match time_part {
            None => None,
            Some(t) => {
                let hour = digits(&t[0..2]).ok_or_else(invalid)?;
                let minute = digits(&t[2..4]).ok_or_else(invalid)?;
                let second = digits(&t[4..6]).ok_or_else(invalid)?;
                Some(NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?)
            }
        };

        Ok(DateTuple { date, time, utc })
    }

    /// A floating wall-clock value with a time part.
    ///
    /// Fails with [`RecurrenceError::DateOutOfRange`] when the year has no
    /// four-digit form.
    pub fn from_local(local: NaiveDateTime) -> Result<Self> {
        Ok(DateTuple {
            date: token_date(local)?,
            time: Some(local.time()),
            utc: false,
        })
    }

    /// An absolute UTC instant; same year limits as [`DateTuple::from_local`].
    pub fn from_utc(utc: NaiveDateTime) -> Result<Self> {
        Ok(DateTuple {
            date: token_date(utc)?,
            time: Some(utc.time()),
            utc: true,
        })
    }

    /// A date-only value.
    pub fn from_date(date: NaiveDate) -> Result<Self> {
        Ok(DateTuple {
            date: token_date(date.and_time(NaiveTime::MIN))?,
            time: None,
            utc: false,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    pub fn has_time(&self) -> bool {
        self.time.is_some()
    }

    pub fn is_utc(&self) -> bool {
        self.utc
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn hour(&self) -> u32 {
        self.time.map_or(0, |t| t.hour())
    }

    pub fn minute(&self) -> u32 {
        self.time.map_or(0, |t| t.minute())
    }

    pub fn second(&self) -> u32 {
        self.time.map_or(0, |t| t.second())
    }

    /// The fields as written, time defaulting to midnight, ignoring `Z`.
    pub fn naive(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    /// Wall-clock value: `Z` tokens are shifted by the offset in effect at
    /// that instant, other tokens are taken as written.
    pub fn to_local<O: OffsetSource + ?Sized>(&self, offsets: &O) -> Result<NaiveDateTime> {
        if !self.utc {
            return Ok(self.naive());
        }
        offsets
            .utc_to_local(self.naive())
            .ok_or(RecurrenceError::DateOutOfRange(self.naive()))
    }

    /// Absolute value: floating tokens are converted through the offsets.
    pub fn to_utc<O: OffsetSource + ?Sized>(&self, offsets: &O) -> Result<NaiveDateTime> {
        if self.utc {
            return Ok(self.naive());
        }
        offsets
            .local_to_utc(self.naive())
            .ok_or(RecurrenceError::DateOutOfRange(self.naive()))
    }

    /// The same instant as a `Z` token. A date-only value is pinned to
    /// midnight first.
    ///
    /// Fails when the shift to UTC crosses into a year without a token form.
    pub fn to_absolute<O: OffsetSource + ?Sized>(&self, offsets: &O) -> Result<DateTuple> {
        DateTuple::from_utc(self.to_utc(offsets)?)
    }

    /// Whether an occurrence at wall-clock `candidate` is the one this token
    /// names.
    ///
    /// A date-only token names every occurrence on that date; a timed token
    /// names exactly one wall-clock instant.
    pub fn matches<O: OffsetSource + ?Sized>(&self, candidate: NaiveDateTime, offsets: &O) -> bool {
        if self.has_time() {
            self.to_local(offsets) == Ok(candidate)
        } else {
            self.date == candidate.date()
        }
    }
}

impl fmt::Display for DateTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y%m%d"))?;
        if let Some(time) = self.time {
            write!(f, "T{}", time.format("%H%M%S"))?;
            if self.utc {
                f.write_str("Z")?;
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for DateTuple {
    type Error = RecurrenceError;

    fn try_from(value: String) -> Result<Self> {
        DateTuple::parse(&value)
    }
}

impl From<DateTuple> for String {
    fn from(value: DateTuple) -> Self {
        value.to_string()
    }
}

impl FromStr for DateTuple {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self> {
        DateTuple::parse(s)
    }
}

/// The date of `dt` if its year fits the four digits of a token.
fn token_date(dt: NaiveDateTime) -> Result<NaiveDate> {
    if (0..=9999).contains(&dt.year()) {
        Ok(dt.date())
    } else {
        Err(RecurrenceError::DateOutOfRange(dt))
    }
}

/// Parse a fixed-width run of ASCII digits.
fn digits(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}

/// Decode a token to wall-clock time.
///
/// `Z` tokens are absolute and converted with `offsets`; the others are
/// floating and taken as written, with a missing time meaning midnight.
pub fn decode<O: OffsetSource + ?Sized>(token: &str, offsets: &O) -> Result<NaiveDateTime> {
    DateTuple::parse(token)?.to_local(offsets)
}

/// Encode wall-clock time as an absolute `yyyyMMddTHHmmssZ` token.
///
/// Fails with [`RecurrenceError::DateOutOfRange`] when the UTC instant falls
/// outside years 0000..=9999, so every token produced here decodes again.
pub fn encode<O: OffsetSource + ?Sized>(local: NaiveDateTime, offsets: &O) -> Result<String> {
    let utc = offsets
        .local_to_utc(local)
        .ok_or(RecurrenceError::DateOutOfRange(local))?;
    Ok(DateTuple::from_utc(utc)?.to_string())
}

/// Encode wall-clock time as a floating `yyyyMMddTHHmmss` token.
pub fn encode_local(local: NaiveDateTime) -> Result<String> {
    Ok(DateTuple::from_local(local)?.to_string())
}
