//! Occurrence generation: rule + seed + window → concrete wall-clock dates.
//!
//! Generation runs per period. Starting from the seed, a period anchor is
//! computed as `seed + interval * attempt` (never by accumulating onto the
//! previous anchor, so that 31st-of-the-month seeds come back after a short
//! month). Each period is expanded by the BY*-parts that apply to the rule's
//! frequency, sorted, optionally thinned by BYSETPOS, and then fed through the
//! seed, COUNT and UNTIL filters. The windowed entry points add the
//! `[min, max]` filter and exception matching on top.
//!
//! Nothing here keeps state between calls; [`Occurrences`] carries its own
//! cursor and is dropped with the call.

use std::collections::VecDeque;

use chrono::{
    Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday,
};
use serde::{Deserialize, Serialize};

use crate::codec::DateTuple;
use crate::error::Result;
use crate::offset::{FixedOffsetMinutes, OffsetSource};
use crate::parser::parse_rule;
use crate::rule::{Frequency, Rule, WeekdayNum};
use crate::weekdate::{first_of_week, last_of_week, start_of_week_number};

/// Exception dates for a request: one comma-separated string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Exceptions {
    List(Vec<String>),
    Text(String),
}

impl Exceptions {
    /// The individual ASCII tokens, with surrounding whitespace and empty
    /// items removed.
    pub fn tokens(&self) -> Vec<&str> {
        let raw: Vec<&str> = match self {
            Exceptions::List(items) => items.iter().map(String::as_str).collect(),
            Exceptions::Text(text) => text.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl From<&str> for Exceptions {
    fn from(text: &str) -> Self {
        Exceptions::Text(text.to_string())
    }
}

impl From<Vec<String>> for Exceptions {
    fn from(items: Vec<String>) -> Self {
        Exceptions::List(items)
    }
}

/// One call's worth of input to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Rule string, e.g. `FREQ=WEEKLY;BYDAY=MO,WE`.
    pub rule: String,
    /// Seed occurrence. Supplies the time of day and the day/weekday anchor.
    pub start: NaiveDateTime,
    /// End of the seed occurrence. Its distance from `start` lets an
    /// occurrence that starts before `min` still count as visible.
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    /// Inclusive lower bound of the window.
    pub min: NaiveDateTime,
    /// Inclusive upper bound of the window.
    pub max: NaiveDateTime,
    #[serde(default)]
    pub exception: Option<Exceptions>,
    /// Minutes east of UTC used to resolve `Z` tokens.
    #[serde(default)]
    pub appointment_timezone_offset: i32,
}

impl GenerationRequest {
    /// A request with no end, no exceptions and a UTC offset of zero.
    pub fn new(
        rule: impl Into<String>,
        start: NaiveDateTime,
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> Self {
        GenerationRequest {
            rule: rule.into(),
            start,
            end: None,
            min,
            max,
            exception: None,
            appointment_timezone_offset: 0,
        }
    }

    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_exception(mut self, exception: impl Into<Exceptions>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    pub fn with_timezone_offset(mut self, minutes: i32) -> Self {
        self.appointment_timezone_offset = minutes;
        self
    }

    /// Read a request from its JSON (camelCase) form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn duration(&self) -> TimeDelta {
        self.end
            .map(|end| end - self.start)
            .filter(|d| *d > TimeDelta::zero())
            .unwrap_or_else(TimeDelta::zero)
    }
}

/// Expand a request into its visible occurrences.
///
/// An invalid rule yields an empty list; the reason is logged at `warn`.
/// `Z` tokens are resolved with the request's fixed time-zone offset.
pub fn generate_dates(request: &GenerationRequest) -> Vec<NaiveDateTime> {
    let offsets = FixedOffsetMinutes(request.appointment_timezone_offset);
    generate_dates_with(request, &offsets)
}

/// Like [`generate_dates`], but resolves `Z` tokens with `offsets`.
pub fn generate_dates_with<O: OffsetSource + ?Sized>(
    request: &GenerationRequest,
    offsets: &O,
) -> Vec<NaiveDateTime> {
    match try_generate_dates(request, offsets) {
        Ok(dates) => dates,
        Err(err) => {
            tracing::warn!(rule = %request.rule, error = %err, "broken recurrence rule");
            Vec::new()
        }
    }
}

/// Expand a request, reporting an invalid rule as an error instead of an
/// empty list.
///
/// Output is strictly ascending, contains no duplicates, and every date `d`
/// satisfies `min - (end - start) <= d <= max`.
///
/// # Errors
/// Returns the parse error when `request.rule` is not a valid rule.
pub fn try_generate_dates<O: OffsetSource + ?Sized>(
    request: &GenerationRequest,
    offsets: &O,
) -> Result<Vec<NaiveDateTime>> {
    let rule = parse_rule(&request.rule)?;
    if request.min > request.max {
        return Ok(Vec::new());
    }

    let exceptions: Vec<DateTuple> = request
        .exception
        .iter()
        .flat_map(Exceptions::tokens)
        .filter_map(|token| match DateTuple::parse(token) {
            Ok(tuple) => Some(tuple),
            Err(err) => {
                tracing::warn!(token, error = %err, "skipping recurrence exception");
                None
            }
        })
        .collect();

    let window_start = request
        .min
        .checked_sub_signed(request.duration())
        .unwrap_or(request.min);

    let mut occurrences = rule
        .occurrences(request.start, offsets)
        .with_horizon(request.max);
    occurrences.skip_to(window_start);

    let dates: Vec<NaiveDateTime> = occurrences
        .by_ref()
        .skip_while(|dt| *dt < window_start)
        .take_while(|dt| *dt <= request.max)
        .filter(|dt| !exceptions.iter().any(|ex| ex.matches(*dt, offsets)))
        .collect();

    tracing::debug!(
        rule = %request.rule,
        min = %request.min,
        max = %request.max,
        count = ?rule.count(),
        consumed = occurrences.consumed(),
        found = dates.len(),
        "expanded recurrence"
    );
    Ok(dates)
}

impl Rule {
    /// All occurrences of this rule from `seed`, honoring COUNT and UNTIL.
    ///
    /// The iterator is lazy. Without COUNT, UNTIL or a horizon it only ends
    /// when the calendar runs out, so bound it with
    /// [`Occurrences::with_horizon`] or `take`.
    pub fn occurrences<O: OffsetSource + ?Sized>(
        &self,
        seed: NaiveDateTime,
        offsets: &O,
    ) -> Occurrences<'_> {
        Occurrences {
            rule: self,
            seed,
            until: self
                .until
                .map(|u| u.to_local(offsets).unwrap_or_else(|_| u.naive())),
            horizon: None,
            attempt: 0,
            emitted: 0,
            pending: VecDeque::new(),
            done: false,
        }
    }
}

/// Lazy, ascending sequence of a rule's occurrences.
#[derive(Debug, Clone)]
pub struct Occurrences<'r> {
    rule: &'r Rule,
    seed: NaiveDateTime,
    until: Option<NaiveDateTime>,
    horizon: Option<NaiveDateTime>,
    /// Interval multiple of the next period to expand.
    attempt: u64,
    emitted: u32,
    /// The current period's remaining candidates, ascending.
    pending: VecDeque<NaiveDateTime>,
    done: bool,
}

impl<'r> Occurrences<'r> {
    /// Stop stepping once a period begins after `horizon`.
    pub fn with_horizon(mut self, horizon: NaiveDateTime) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Occurrences produced so far. With a COUNT this includes the ones
    /// [`Occurrences::skip_to`] jumped over.
    pub fn consumed(&self) -> u32 {
        self.emitted
    }

    /// Jump ahead so the next period expanded is the last one that could
    /// still produce a date at or after `target`.
    ///
    /// With a COUNT every earlier occurrence must be counted, so the jump is
    /// only taken on a fresh iterator whose periods each yield exactly their
    /// anchor; the skipped periods are then counted arithmetically. Other
    /// counted rules are left where they are.
    pub fn skip_to(&mut self, target: NaiveDateTime) {
        if target <= self.seed {
            return;
        }
        let counted = self.rule.count.is_some();
        if counted && !(self.attempt == 0 && self.pending.is_empty() && self.one_per_period()) {
            return;
        }
        let interval = i64::from(self.rule.interval);
        let units = match self.rule.freq {
            Frequency::Yearly => i64::from(target.year() - self.seed.year()),
            Frequency::Monthly => {
                let months = |dt: NaiveDateTime| i64::from(dt.year()) * 12 + i64::from(dt.month());
                months(target) - months(self.seed)
            }
            Frequency::Weekly => (target - self.seed).num_weeks(),
            Frequency::Daily => (target - self.seed).num_days(),
            Frequency::Hourly => (target - self.seed).num_hours(),
            Frequency::Minutely => (target - self.seed).num_minutes(),
            Frequency::Secondly => (target - self.seed).num_seconds(),
        };
        let attempt = u64::try_from(units / interval - 1).unwrap_or(0);
        if attempt > self.attempt {
            if counted {
                self.emitted = u32::try_from(attempt).unwrap_or(u32::MAX);
            }
            self.attempt = attempt;
            self.pending.clear();
        }
    }

    /// Whether every period yields its anchor and nothing else: no BY*-part
    /// shapes the period, and a MONTHLY/YEARLY seed day never gets clamped.
    fn one_per_period(&self) -> bool {
        let r = self.rule;
        let bare = r.by_month.is_empty()
            && r.by_week_no.is_empty()
            && r.by_year_day.is_empty()
            && r.by_month_day.is_empty()
            && r.by_day.is_empty()
            && r.by_hour.is_empty()
            && r.by_minute.is_empty()
            && r.by_second.is_empty()
            && r.by_set_pos.is_empty();
        let unclamped = match r.freq {
            Frequency::Monthly | Frequency::Yearly => self.seed.day() <= 28,
            _ => true,
        };
        bare && unclamped
    }

    /// The anchor for the given interval multiple, or `None` past the end
    /// of the representable calendar.
    fn anchor(&self, attempt: u64) -> Option<NaiveDateTime> {
        let steps = u64::from(self.rule.interval).checked_mul(attempt)?;
        let seed = self.seed;
        match self.rule.freq {
            Frequency::Yearly => {
                seed.checked_add_months(Months::new(u32::try_from(steps.checked_mul(12)?).ok()?))
            }
            Frequency::Monthly => seed.checked_add_months(Months::new(u32::try_from(steps).ok()?)),
            fixed => {
                let unit = match fixed {
                    Frequency::Weekly => 7 * 86_400,
                    Frequency::Daily => 86_400,
                    Frequency::Hourly => 3_600,
                    Frequency::Minutely => 60,
                    _ => 1,
                };
                let seconds = i64::try_from(steps).ok()?.checked_mul(unit)?;
                seed.checked_add_signed(TimeDelta::try_seconds(seconds)?)
            }
        }
    }

    /// Whether adding months/years clamped the seed's day of month (e.g.
    /// Jan 31 + 1 month = Feb 28) in a rule where that day is the only thing
    /// choosing the date. Such periods have no occurrence.
    fn is_clamped(&self, anchor: NaiveDateTime) -> bool {
        if anchor.day() == self.seed.day() {
            return false;
        }
        let r = self.rule;
        match r.freq {
            Frequency::Yearly => {
                r.by_month.is_empty()
                    && r.by_week_no.is_empty()
                    && r.by_year_day.is_empty()
                    && r.by_month_day.is_empty()
                    && r.by_day.is_empty()
            }
            Frequency::Monthly => r.by_day.is_empty() && r.by_month_day.is_empty(),
            _ => false,
        }
    }

    /// Expand the next period into `pending`.
    fn fill(&mut self) {
        let Some(anchor) = self.anchor(self.attempt) else {
            self.done = true;
            return;
        };
        self.attempt += 1;

        let Some(period_start) = period_start(self.rule, anchor) else {
            self.done = true;
            return;
        };
        let beyond = |limit: Option<NaiveDateTime>| limit.is_some_and(|l| period_start > l);
        if beyond(self.horizon) || beyond(self.until) {
            self.done = true;
            return;
        }
        if self.is_clamped(anchor) {
            return;
        }

        let expander = Expander {
            rule: self.rule,
            seed: self.seed,
            cur: anchor,
        };
        let seed = self.seed;
        self.pending
            .extend(expander.expand().into_iter().filter(|dt| *dt >= seed));
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        loop {
            if self.rule.count.is_some_and(|count| self.emitted >= count) {
                return None;
            }
            if let Some(dt) = self.pending.pop_front() {
                if self.until.is_some_and(|until| dt > until) {
                    self.pending.clear();
                    self.done = true;
                    return None;
                }
                self.emitted += 1;
                return Some(dt);
            }
            if self.done {
                return None;
            }
            self.fill();
        }
    }
}

impl std::iter::FusedIterator for Occurrences<'_> {}

/// A lower bound for every candidate the period around `anchor` can produce.
fn period_start(rule: &Rule, anchor: NaiveDateTime) -> Option<NaiveDateTime> {
    let date = anchor.date();
    let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);
    match rule.freq {
        Frequency::Secondly => Some(anchor),
        Frequency::Minutely => date.and_hms_opt(anchor.hour(), anchor.minute(), 0),
        Frequency::Hourly => date.and_hms_opt(anchor.hour(), 0, 0),
        Frequency::Daily => Some(midnight(date)),
        Frequency::Weekly => first_of_week(rule.wkst, date).map(midnight),
        Frequency::Monthly => date.with_day(1).map(midnight),
        // Week 1 can begin up to three days before January 1st.
        Frequency::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1)
            .and_then(|d| d.checked_sub_days(chrono::Days::new(7)))
            .map(midnight),
    }
}

/// Expands a single period into its sorted candidate set.
#[derive(Debug, Clone, Copy)]
struct Expander<'a> {
    rule: &'a Rule,
    seed: NaiveDateTime,
    /// The period anchor.
    cur: NaiveDateTime,
}

impl Expander<'_> {
    fn expand(&self) -> Vec<NaiveDateTime> {
        let mut set = match self.rule.freq {
            Frequency::Yearly => self.yearly(),
            Frequency::Monthly => self.monthly(),
            Frequency::Weekly => self.weekly(),
            Frequency::Daily => self.daily(),
            Frequency::Hourly => self.hourly(),
            Frequency::Minutely => self.minutely(),
            Frequency::Secondly => self.secondly(),
        };
        set.sort_unstable();
        set.dedup();
        self.limit_by_set_pos(set)
    }

    fn yearly(&self) -> Vec<NaiveDateTime> {
        let r = self.rule;
        let mut set = vec![self.cur];
        if !r.by_day.is_empty() {
            if !r.by_week_no.is_empty() {
                set = self.expand_by_week_no(set);
                set = self.expand_by_day_weekly(set);
                set = self.limit_by_month(set);
            } else if !r.by_month.is_empty() {
                set = self.expand_by_month(set, false);
                set = self.expand_by_day_monthly(set);
            } else {
                set = self.expand_by_day_yearly(set);
            }
            set = self.limit_by_year_day(set);
            set = self.limit_by_month_day(set);
        } else if !r.by_week_no.is_empty() {
            set = self.expand_by_week_no(set);
            // Every day of each selected week, like BYDAY listing all seven.
            set = expand(set, |dt| {
                (0..7).filter_map(move |n| dt.checked_add_signed(TimeDelta::days(n)))
            });
            set = self.limit_by_month(set);
            set = self.limit_by_year_day(set);
            set = self.limit_by_month_day(set);
        } else if !r.by_year_day.is_empty() {
            set = self.expand_by_year_day(set);
            set = self.limit_by_month(set);
            set = self.limit_by_month_day(set);
        } else if !r.by_month_day.is_empty() {
            set = if r.by_month.is_empty() {
                expand(set, |dt| {
                    (1..=12).filter_map(move |m| with_date(dt, NaiveDate::from_ymd_opt(dt.year(), m, 1)))
                })
            } else {
                self.expand_by_month(set, false)
            };
            set = self.expand_by_month_day(set);
        } else if !r.by_month.is_empty() {
            set = self.expand_by_month(set, true);
        }
        self.expand_time(set)
    }

    fn monthly(&self) -> Vec<NaiveDateTime> {
        let r = self.rule;
        if !self.satisfies_by_month(self.cur) {
            return Vec::new();
        }
        let mut set = vec![self.cur];
        if !r.by_day.is_empty() {
            set = self.expand_by_day_monthly(set);
            set = self.limit_by_month_day(set);
        } else if !r.by_month_day.is_empty() {
            set = self.expand_by_month_day(set);
        }
        set = self.limit_by_year_day(set);
        self.expand_time(set)
    }

    fn weekly(&self) -> Vec<NaiveDateTime> {
        let mut set = vec![self.cur];
        if !self.rule.by_day.is_empty() {
            set = self.expand_by_day_weekly(set);
        }
        set = self.limit_by_month(set);
        self.expand_time(set)
    }

    fn daily(&self) -> Vec<NaiveDateTime> {
        if !self.satisfies_date(self.cur) {
            return Vec::new();
        }
        self.expand_time(vec![self.cur])
    }

    fn hourly(&self) -> Vec<NaiveDateTime> {
        if !self.satisfies_date(self.cur) || !self.satisfies_by_hour(self.cur) {
            return Vec::new();
        }
        let set = self.expand_by_minute(vec![self.cur]);
        self.expand_by_second(set)
    }

    fn minutely(&self) -> Vec<NaiveDateTime> {
        if !self.satisfies_date(self.cur)
            || !self.satisfies_by_hour(self.cur)
            || !self.satisfies_by_minute(self.cur)
        {
            return Vec::new();
        }
        self.expand_by_second(vec![self.cur])
    }

    fn secondly(&self) -> Vec<NaiveDateTime> {
        let dt = self.cur;
        if self.satisfies_date(dt)
            && self.satisfies_by_hour(dt)
            && self.satisfies_by_minute(dt)
            && self.satisfies_by_second(dt)
        {
            vec![dt]
        } else {
            Vec::new()
        }
    }

    /// The date-level filters used by DAILY and finer frequencies.
    fn satisfies_date(&self, dt: NaiveDateTime) -> bool {
        self.satisfies_by_month(dt)
            && self.satisfies_by_year_day(dt)
            && self.satisfies_by_month_day(dt)
            && self.satisfies_by_day(dt)
    }

    fn satisfies_by_month(&self, dt: NaiveDateTime) -> bool {
        let months = &self.rule.by_month;
        months.is_empty() || months.iter().any(|&m| i64::from(m) == i64::from(dt.month()))
    }

    fn satisfies_by_year_day(&self, dt: NaiveDateTime) -> bool {
        let days = &self.rule.by_year_day;
        let len = days_in_year(dt.year());
        days.is_empty() || days.iter().any(|&n| resolve_index(n, len) == Some(dt.ordinal()))
    }

    fn satisfies_by_month_day(&self, dt: NaiveDateTime) -> bool {
        let days = &self.rule.by_month_day;
        let len = days_in_month(dt.date());
        days.is_empty() || days.iter().any(|&n| resolve_index(n, len) == Some(dt.day()))
    }

    /// Plain weekday match; ordinals only carry meaning when expanding
    /// months and years.
    fn satisfies_by_day(&self, dt: NaiveDateTime) -> bool {
        let days = &self.rule.by_day;
        days.is_empty() || days.iter().any(|d| d.weekday == dt.weekday())
    }

    fn satisfies_by_hour(&self, dt: NaiveDateTime) -> bool {
        contains_unsigned(&self.rule.by_hour, dt.hour())
    }

    fn satisfies_by_minute(&self, dt: NaiveDateTime) -> bool {
        contains_unsigned(&self.rule.by_minute, dt.minute())
    }

    fn satisfies_by_second(&self, dt: NaiveDateTime) -> bool {
        contains_unsigned(&self.rule.by_second, dt.second())
    }

    fn limit_by_month(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        set.into_iter().filter(|dt| self.satisfies_by_month(*dt)).collect()
    }

    fn limit_by_year_day(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        set.into_iter().filter(|dt| self.satisfies_by_year_day(*dt)).collect()
    }

    fn limit_by_month_day(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        set.into_iter().filter(|dt| self.satisfies_by_month_day(*dt)).collect()
    }

    /// Keep the positions BYSETPOS names in the sorted set.
    fn limit_by_set_pos(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        let positions = &self.rule.by_set_pos;
        if positions.is_empty() {
            return set;
        }
        let Ok(len) = u32::try_from(set.len()) else {
            return Vec::new();
        };
        let mut picked: Vec<usize> = positions
            .iter()
            .filter_map(|&p| resolve_index(p, len))
            .map(|p| p as usize - 1)
            .collect();
        picked.sort_unstable();
        picked.dedup();
        picked.into_iter().map(|i| set[i]).collect()
    }

    /// Move each date to every BYMONTH month of its year.
    ///
    /// With `keep_day` the seed's day of month is used and months lacking
    /// it are dropped; otherwise the 1st is used so a later BYDAY or
    /// BYMONTHDAY expansion can pick the day.
    fn expand_by_month(&self, set: Vec<NaiveDateTime>, keep_day: bool) -> Vec<NaiveDateTime> {
        let day = if keep_day { self.seed.day() } else { 1 };
        expand(set, |dt| {
            self.rule.by_month.iter().filter_map(move |&m| {
                let m = u32::try_from(m).ok()?;
                with_date(dt, NaiveDate::from_ymd_opt(dt.year(), m, day))
            })
        })
    }

    /// Move each date to the first day of every BYWEEKNO week of its year.
    fn expand_by_week_no(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        let wkst = self.rule.wkst;
        expand(set, |dt| {
            self.rule
                .by_week_no
                .iter()
                .filter_map(move |&w| with_date(dt, start_of_week_number(wkst, dt.year(), w)))
        })
    }

    fn expand_by_year_day(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        expand(set, |dt| {
            let year = dt.year();
            let len = days_in_year(year);
            self.rule.by_year_day.iter().filter_map(move |&n| {
                let ordinal = resolve_index(n, len)?;
                with_date(dt, NaiveDate::from_yo_opt(year, ordinal))
            })
        })
    }

    fn expand_by_month_day(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        expand(set, |dt| {
            let len = days_in_month(dt.date());
            self.rule.by_month_day.iter().filter_map(move |&n| {
                let day = resolve_index(n, len)?;
                with_date(dt, dt.date().with_day(day))
            })
        })
    }

    fn expand_by_day_yearly(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        expand(set, |dt| {
            let first = NaiveDate::from_ymd_opt(dt.year(), 1, 1);
            let last = NaiveDate::from_ymd_opt(dt.year(), 12, 31);
            self.by_day_between(dt, first, last, true)
        })
    }

    fn expand_by_day_monthly(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        expand(set, |dt| {
            let first = dt.date().with_day(1);
            let last = dt.date().with_day(days_in_month(dt.date()));
            self.by_day_between(dt, first, last, true)
        })
    }

    fn expand_by_day_weekly(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        let wkst = self.rule.wkst;
        expand(set, |dt| {
            let first = first_of_week(wkst, dt.date());
            let last = last_of_week(wkst, dt.date());
            self.by_day_between(dt, first, last, false)
        })
    }

    /// The BYDAY dates within `[first, last]`, keeping `dt`'s time.
    fn by_day_between(
        &self,
        dt: NaiveDateTime,
        first: Option<NaiveDate>,
        last: Option<NaiveDate>,
        ordinals: bool,
    ) -> Vec<NaiveDateTime> {
        let (Some(first), Some(last)) = (first, last) else {
            return Vec::new();
        };
        let time = dt.time();
        self.rule
            .by_day
            .iter()
            .flat_map(|day| match day {
                WeekdayNum {
                    ordinal: Some(n),
                    weekday,
                } if ordinals => nth_weekday(first, last, *weekday, *n)
                    .into_iter()
                    .collect::<Vec<_>>(),
                WeekdayNum { weekday, .. } => weekdays_between(first, last, *weekday),
            })
            .map(|d| d.and_time(time))
            .collect()
    }

    /// Apply BYHOUR, BYMINUTE and BYSECOND as a cross product.
    fn expand_time(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        let set = self.expand_by_hour(set);
        let set = self.expand_by_minute(set);
        self.expand_by_second(set)
    }

    fn expand_by_hour(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        expand_field(set, &self.rule.by_hour, |dt, h| dt.with_hour(h))
    }

    fn expand_by_minute(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        expand_field(set, &self.rule.by_minute, |dt, m| dt.with_minute(m))
    }

    fn expand_by_second(&self, set: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        expand_field(set, &self.rule.by_second, |dt, s| dt.with_second(s))
    }
}

/// Replace every element of `set` with the elements `f` yields for it.
fn expand<F, I>(set: Vec<NaiveDateTime>, f: F) -> Vec<NaiveDateTime>
where
    F: Fn(NaiveDateTime) -> I,
    I: IntoIterator<Item = NaiveDateTime>,
{
    set.into_iter().flat_map(f).collect()
}

/// Expand by one time-of-day field; an empty list leaves `set` unchanged.
fn expand_field<F>(set: Vec<NaiveDateTime>, values: &[i32], with: F) -> Vec<NaiveDateTime>
where
    F: Fn(NaiveDateTime, u32) -> Option<NaiveDateTime>,
{
    if values.is_empty() {
        return set;
    }
    expand(set, |dt| {
        values
            .iter()
            .filter_map(|&v| u32::try_from(v).ok())
            .filter_map(|v| with(dt, v))
            .collect::<Vec<_>>()
    })
}

fn with_date(dt: NaiveDateTime, date: Option<NaiveDate>) -> Option<NaiveDateTime> {
    date.map(|d| d.and_time(dt.time()))
}

fn contains_unsigned(values: &[i32], value: u32) -> bool {
    values.is_empty() || values.iter().any(|&v| i64::from(v) == i64::from(value))
}

/// Map a 1-based index that may count from the end (`-1` is the last) onto
/// `1..=len`.
fn resolve_index(n: i32, len: u32) -> Option<u32> {
    let len = i64::from(len);
    let n = i64::from(n);
    let resolved = if n < 0 { len + n + 1 } else { n };
    (1..=len)
        .contains(&resolved)
        .then(|| u32::try_from(resolved).ok())
        .flatten()
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map_or(31, |d| d.day())
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Every `weekday` in `[first, last]`.
fn weekdays_between(first: NaiveDate, last: NaiveDate, weekday: Weekday) -> Vec<NaiveDate> {
    let offset = crate::weekdate::days_since(weekday, first.weekday());
    let Some(start) = first.checked_add_days(chrono::Days::new(offset)) else {
        return Vec::new();
    };
    start
        .iter_weeks()
        .take_while(|d| *d <= last)
        .collect()
}

/// The `n`-th `weekday` in `[first, last]`, negative counting back from
/// `last`.
fn nth_weekday(first: NaiveDate, last: NaiveDate, weekday: Weekday, n: i32) -> Option<NaiveDate> {
    let all = weekdays_between(first, last, weekday);
    let len = u32::try_from(all.len()).ok()?;
    let index = resolve_index(n, len)?;
    all.get(index as usize - 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_index_handles_both_ends() {
        assert_eq!(resolve_index(1, 31), Some(1));
        assert_eq!(resolve_index(-1, 31), Some(31));
        assert_eq!(resolve_index(-31, 30), None);
        assert_eq!(resolve_index(0, 30), None);
        assert_eq!(resolve_index(32, 31), None);
    }

    #[test]
    fn month_and_year_lengths() {
        let feb = NaiveDate::from_ymd_opt(2016, 2, 10).unwrap();
        assert_eq!(days_in_month(feb), 29);
        let dec = NaiveDate::from_ymd_opt(2015, 12, 1).unwrap();
        assert_eq!(days_in_month(dec), 31);
        assert_eq!(days_in_year(2016), 366);
        assert_eq!(days_in_year(2100), 365);
    }

    #[test]
    fn nth_weekday_of_month() {
        let first = NaiveDate::from_ymd_opt(2015, 3, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2015, 3, 31).unwrap();
        // March 2015 has five Tuesdays: 3, 10, 17, 24, 31.
        assert_eq!(
            nth_weekday(first, last, Weekday::Tue, -1),
            NaiveDate::from_ymd_opt(2015, 3, 31)
        );
        assert_eq!(
            nth_weekday(first, last, Weekday::Tue, 2),
            NaiveDate::from_ymd_opt(2015, 3, 10)
        );
        assert_eq!(nth_weekday(first, last, Weekday::Tue, 6), None);
    }
}
