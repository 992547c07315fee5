//! Error types for recurrence-engine operations.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors produced while parsing rules, decoding date tokens or reading
/// JSON requests.
///
/// The occurrence generator never surfaces these to its infallible entry
/// points; an invalid rule simply expands to no dates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    /// The rule has no `FREQ` part.
    #[error("recurrence rule has no FREQ part")]
    MissingFrequency,

    /// `FREQ` is not one of the seven frequency literals.
    #[error("unknown frequency: {0:?}")]
    InvalidFrequency(String),

    /// A numeric rule part contained a token that is not an integer.
    #[error("invalid number {value:?} in {part}")]
    InvalidNumber { part: &'static str, value: String },

    /// `INTERVAL` was present but zero.
    #[error("INTERVAL must be at least 1, got {0:?}")]
    InvalidInterval(String),

    /// A BYDAY item or WKST value is not a recognised weekday.
    #[error("invalid weekday: {0:?}")]
    InvalidWeekday(String),

    /// `BYDAY=` with no items.
    #[error("BYDAY has no weekdays")]
    EmptyByDay,

    /// An ASCII date/time token that does not decode.
    #[error("invalid date token: {0:?}")]
    InvalidDate(String),

    /// A date-time that has no `yyyyMMdd` token: its year (after any UTC
    /// shift) falls outside 0000..=9999.
    #[error("date-time {0} is outside the token range 0000-9999")]
    DateOutOfRange(NaiveDateTime),

    /// A JSON request or settings document that does not deserialize.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for RecurrenceError {
    fn from(err: serde_json::Error) -> Self {
        RecurrenceError::Json(err.to_string())
    }
}

/// Convenience alias used throughout recurrence-engine.
pub type Result<T> = std::result::Result<T, RecurrenceError>;
