//! # recurrence-engine
//!
//! RRULE parsing and windowed occurrence generation for calendar widgets.
//!
//! A calendar view asks one question over and over: which occurrences of this
//! appointment fall inside the range I am about to draw? The engine answers it
//! from a rule string, the seed occurrence and the window, without keeping any
//! state between calls. All values are wall-clock `NaiveDateTime`s; the only
//! absolute instants are `...Z` date tokens, resolved through an
//! [`OffsetSource`].
//!
//! ## Modules
//!
//! - [`parser`]: rule string → validated [`Rule`]
//! - [`codec`]: compact ASCII date tokens (`yyyyMMdd[THHmmss[Z]]`)
//! - [`expander`]: rule + seed + window → concrete dates
//! - [`serializer`]: editable settings → canonical rule string
//! - [`weekdate`]: week boundaries and week numbers for any WKST
//! - [`offset`]: UTC offset sources
//! - [`error`]: Error types

pub mod codec;
pub mod error;
pub mod expander;
pub mod offset;
pub mod parser;
pub mod rule;
pub mod serializer;
pub mod weekdate;

pub use codec::{decode, encode, encode_local, DateTuple};
pub use error::RecurrenceError;
pub use expander::{
    generate_dates, generate_dates_with, try_generate_dates, Exceptions, GenerationRequest,
    Occurrences,
};
pub use offset::{FixedOffsetMinutes, OffsetSource};
pub use parser::{days_from_byday, is_valid_rule, parse_rule};
pub use rule::{Frequency, Rule, WeekdayNum};
pub use serializer::{serialize_rule, RecurrenceSettings};
