//! Editable recurrence settings → rule string.
//!
//! [`RecurrenceSettings`] is the loosely-filled object a recurrence editor
//! works with: every part is optional, including the frequency. Serializing
//! produces the canonical minimal form, which parses back to an equivalent
//! [`Rule`].

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::codec::DateTuple;
use crate::error::Result;
use crate::offset::OffsetSource;
use crate::rule::{weekday_code, Frequency, Rule, WeekdayNum};

/// Recurrence settings as edited by a host UI.
///
/// The JSON form uses the lowercase rule-part names (`freq`, `byday`,
/// `bymonthday`, ...), weekday codes for `wkst`, `1TU`-style strings for
/// `byday` and an ASCII date token for `until`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq: Option<Frequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTuple>,
    #[serde(rename = "bymonth", skip_serializing_if = "Vec::is_empty")]
    pub by_month: Vec<i32>,
    #[serde(rename = "byweekno", skip_serializing_if = "Vec::is_empty")]
    pub by_week_no: Vec<i32>,
    #[serde(rename = "byyearday", skip_serializing_if = "Vec::is_empty")]
    pub by_year_day: Vec<i32>,
    #[serde(rename = "bymonthday", skip_serializing_if = "Vec::is_empty")]
    pub by_month_day: Vec<i32>,
    #[serde(rename = "byday", skip_serializing_if = "Vec::is_empty")]
    pub by_day: Vec<WeekdayNum>,
    #[serde(rename = "byhour", skip_serializing_if = "Vec::is_empty")]
    pub by_hour: Vec<i32>,
    #[serde(rename = "byminute", skip_serializing_if = "Vec::is_empty")]
    pub by_minute: Vec<i32>,
    #[serde(rename = "bysecond", skip_serializing_if = "Vec::is_empty")]
    pub by_second: Vec<i32>,
    #[serde(rename = "bysetpos", skip_serializing_if = "Vec::is_empty")]
    pub by_set_pos: Vec<i32>,
    #[serde(with = "weekday_code_opt", skip_serializing_if = "Option::is_none")]
    pub wkst: Option<Weekday>,
}

impl RecurrenceSettings {
    /// Read settings from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write settings as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<&Rule> for RecurrenceSettings {
    fn from(rule: &Rule) -> Self {
        RecurrenceSettings {
            freq: Some(rule.freq),
            interval: Some(rule.interval),
            count: rule.count,
            until: rule.until,
            by_month: rule.by_month.clone(),
            by_week_no: rule.by_week_no.clone(),
            by_year_day: rule.by_year_day.clone(),
            by_month_day: rule.by_month_day.clone(),
            by_day: rule.by_day.clone(),
            by_hour: rule.by_hour.clone(),
            by_minute: rule.by_minute.clone(),
            by_second: rule.by_second.clone(),
            by_set_pos: rule.by_set_pos.clone(),
            wkst: (rule.wkst != Weekday::Mon).then_some(rule.wkst),
        }
    }
}

/// Build a rule string from settings.
///
/// Returns `Ok(None)` when no frequency is set. `INTERVAL` is left out when
/// it is 1 (or less), empty lists are left out, and `UNTIL` is always written
/// as an absolute `...Z` token, converting floating values through `offsets`.
/// A floating `UNTIL` whose UTC instant leaves years 0000..=9999 fails with
/// [`DateOutOfRange`](crate::RecurrenceError::DateOutOfRange).
pub fn serialize_rule<O: OffsetSource + ?Sized>(
    settings: &RecurrenceSettings,
    offsets: &O,
) -> Result<Option<String>> {
    let Some(freq) = settings.freq else {
        return Ok(None);
    };
    let mut parts = vec![format!("FREQ={freq}")];

    if let Some(interval) = settings.interval.filter(|&i| i > 1) {
        parts.push(format!("INTERVAL={interval}"));
    }
    if let Some(count) = settings.count {
        parts.push(format!("COUNT={count}"));
    }
    if let Some(until) = settings.until {
        let absolute = until.to_absolute(offsets)?;
        parts.push(format!("UNTIL={absolute}"));
    }

    push_list(&mut parts, "BYMONTH", &settings.by_month);
    push_list(&mut parts, "BYWEEKNO", &settings.by_week_no);
    push_list(&mut parts, "BYYEARDAY", &settings.by_year_day);
    push_list(&mut parts, "BYMONTHDAY", &settings.by_month_day);
    push_list(&mut parts, "BYDAY", &settings.by_day);
    push_list(&mut parts, "BYHOUR", &settings.by_hour);
    push_list(&mut parts, "BYMINUTE", &settings.by_minute);
    push_list(&mut parts, "BYSECOND", &settings.by_second);
    push_list(&mut parts, "BYSETPOS", &settings.by_set_pos);

    if let Some(wkst) = settings.wkst {
        parts.push(format!("WKST={}", weekday_code(wkst)));
    }
    Ok(Some(parts.join(";")))
}

fn push_list<T: ToString>(parts: &mut Vec<String>, key: &str, values: &[T]) {
    if values.is_empty() {
        return;
    }
    let joined: Vec<String> = values.iter().map(T::to_string).collect();
    parts.push(format!("{key}={}", joined.join(",")));
}

/// `Option<Weekday>` as a two-letter weekday code.
mod weekday_code_opt {
    use chrono::Weekday;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::rule::{weekday_code, weekday_from_code};

    pub fn serialize<S: Serializer>(
        value: &Option<Weekday>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(day) => serializer.serialize_some(weekday_code(*day)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<Weekday>, D::Error> {
        let code: Option<String> = Option::deserialize(deserializer)?;
        code.map(|c| {
            weekday_from_code(&c).ok_or_else(|| D::Error::custom(format!("invalid weekday: {c:?}")))
        })
        .transpose()
    }
}
