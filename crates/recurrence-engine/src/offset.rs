//! Time-zone offset sources used to resolve `Z`-suffixed date tokens.
//!
//! The engine works entirely in wall-clock (`NaiveDateTime`) values. The only
//! place an absolute instant appears is a `...Z` token in `UNTIL` or in an
//! exception list; converting it to wall-clock time needs to know the UTC
//! offset in effect at that instant, which is what an [`OffsetSource`] answers.
//!
//! Offsets are expressed in minutes **east** of UTC, so `local = utc + offset`.

use chrono::{FixedOffset, NaiveDateTime, Offset, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

/// Answers "what is the UTC offset at this instant?".
///
/// Implementations must be pure queries; the generator may call them any
/// number of times and from several threads.
pub trait OffsetSource {
    /// Minutes east of UTC in effect at the given UTC instant.
    fn utc_offset_minutes(&self, utc: NaiveDateTime) -> i32;

    /// Convert a UTC instant to wall-clock time, or `None` when the shift
    /// leaves chrono's range.
    fn utc_to_local(&self, utc: NaiveDateTime) -> Option<NaiveDateTime> {
        utc.checked_add_signed(offset_delta(self.utc_offset_minutes(utc)))
    }

    /// Convert wall-clock time to a UTC instant.
    ///
    /// The offset is first evaluated treating `local` as if it were UTC, then
    /// once more at the resulting guess. That settles every instant except
    /// wall-clock times that do not exist (DST gaps), which resolve to the
    /// offset in effect after the transition. `None` when either step leaves
    /// chrono's range.
    fn local_to_utc(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        let guess = local.checked_sub_signed(offset_delta(self.utc_offset_minutes(local)))?;
        local.checked_sub_signed(offset_delta(self.utc_offset_minutes(guess)))
    }
}

fn offset_delta(minutes: i32) -> TimeDelta {
    TimeDelta::minutes(i64::from(minutes))
}

/// A constant offset in minutes east of UTC.
///
/// This is what a host passes as the "appointment time-zone offset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FixedOffsetMinutes(pub i32);

impl FixedOffsetMinutes {
    /// UTC itself.
    pub const UTC: FixedOffsetMinutes = FixedOffsetMinutes(0);
}

impl OffsetSource for FixedOffsetMinutes {
    fn utc_offset_minutes(&self, _utc: NaiveDateTime) -> i32 {
        self.0
    }
}

impl OffsetSource for FixedOffset {
    fn utc_offset_minutes(&self, _utc: NaiveDateTime) -> i32 {
        self.local_minus_utc() / 60
    }
}

impl OffsetSource for chrono_tz::Tz {
    fn utc_offset_minutes(&self, utc: NaiveDateTime) -> i32 {
        self.offset_from_utc_datetime(&utc).fix().local_minus_utc() / 60
    }
}

impl<F> OffsetSource for F
where
    F: Fn(NaiveDateTime) -> i32,
{
    fn utc_offset_minutes(&self, utc: NaiveDateTime) -> i32 {
        self(utc)
    }
}
