//! WASM bindings for recurrence-engine.
//!
//! Exposes rule validation, occurrence generation, rule serialization and the
//! ASCII date codec to browser calendar widgets via `wasm-bindgen`. All
//! complex types are passed as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p recurrence-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/recurrence-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/recurrence_engine_wasm.wasm
//! ```

use chrono::NaiveDateTime;
use recurrence_engine::rule::weekday_code;
use recurrence_engine::{FixedOffsetMinutes, GenerationRequest, RecurrenceSettings};
use serde::Serialize;
use wasm_bindgen::prelude::*;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

/// Result of `parseRule`: the rule's settings, or why it is invalid.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParseResultDto {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<RecurrenceSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers: JSON-in/JSON-out bodies, testable off the wasm target
// ---------------------------------------------------------------------------

fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse `YYYY-MM-DDTHH:MM:SS` as sent by the widget.
fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

fn generate_dates_json(request_json: &str) -> Result<String, String> {
    let request = GenerationRequest::from_json(request_json)
        .map_err(|e| format!("Invalid request JSON: {}", e))?;
    let dates: Vec<String> = recurrence_engine::generate_dates(&request)
        .into_iter()
        .map(format_datetime)
        .collect();
    serde_json::to_string(&dates).map_err(|e| format!("Serialization error: {}", e))
}

fn parse_rule_json(rule: &str) -> Result<String, String> {
    let dto = match recurrence_engine::parse_rule(rule) {
        Ok(parsed) => ParseResultDto {
            is_valid: true,
            rule: Some(RecurrenceSettings::from(&parsed)),
            error: None,
        },
        Err(e) => ParseResultDto {
            is_valid: false,
            rule: None,
            error: Some(e.to_string()),
        },
    };
    serde_json::to_string(&dto).map_err(|e| format!("Serialization error: {}", e))
}

fn serialize_rule_json(settings_json: &str, offset_minutes: i32) -> Result<Option<String>, String> {
    let settings = RecurrenceSettings::from_json(settings_json)
        .map_err(|e| format!("Invalid settings JSON: {}", e))?;
    recurrence_engine::serialize_rule(&settings, &FixedOffsetMinutes(offset_minutes))
        .map_err(|e| e.to_string())
}

fn decode_token(token: &str, offset_minutes: i32) -> Result<String, String> {
    recurrence_engine::decode(token, &FixedOffsetMinutes(offset_minutes))
        .map(format_datetime)
        .map_err(|e| e.to_string())
}

fn encode_datetime(datetime: &str, offset_minutes: i32) -> Result<String, String> {
    let dt = parse_datetime(datetime)?;
    recurrence_engine::encode(dt, &FixedOffsetMinutes(offset_minutes)).map_err(|e| e.to_string())
}

fn days_from_byday_json(rule: &str) -> Result<String, String> {
    let codes: Vec<&str> = recurrence_engine::days_from_byday(rule)
        .into_iter()
        .map(weekday_code)
        .collect();
    serde_json::to_string(&codes).map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Expand a generation request into the occurrences visible in its window.
///
/// `request_json` is a `GenerationRequest` object:
/// `{rule, start, end?, min, max, exception?, appointmentTimezoneOffset?}`
/// with `YYYY-MM-DDTHH:MM:SS` date-times. Returns a JSON array of date-time
/// strings. An invalid rule yields `[]`; only malformed JSON is an error.
#[wasm_bindgen(js_name = "generateDates")]
pub fn generate_dates(request_json: &str) -> Result<String, JsValue> {
    generate_dates_json(request_json).map_err(|e| JsValue::from_str(&e))
}

/// Parse a rule string.
///
/// Returns `{"isValid":true,"rule":{...settings}}` or
/// `{"isValid":false,"error":"..."}`.
#[wasm_bindgen(js_name = "parseRule")]
pub fn parse_rule(rule: &str) -> Result<String, JsValue> {
    parse_rule_json(rule).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen(js_name = "isValidRule")]
pub fn is_valid_rule(rule: &str) -> bool {
    recurrence_engine::is_valid_rule(rule)
}

/// Build a rule string from settings JSON; `undefined` when `freq` is unset.
#[wasm_bindgen(js_name = "serializeRule")]
pub fn serialize_rule(settings_json: &str, offset_minutes: i32) -> Result<Option<String>, JsValue> {
    serialize_rule_json(settings_json, offset_minutes).map_err(|e| JsValue::from_str(&e))
}

/// Decode an ASCII date token to a `YYYY-MM-DDTHH:MM:SS` wall-clock string.
#[wasm_bindgen(js_name = "getDateByAsciiString")]
pub fn get_date_by_ascii_string(token: &str, offset_minutes: i32) -> Result<String, JsValue> {
    decode_token(token, offset_minutes).map_err(|e| JsValue::from_str(&e))
}

/// Encode a `YYYY-MM-DDTHH:MM:SS` wall-clock string as a `...Z` token.
#[wasm_bindgen(js_name = "getAsciiStringByDate")]
pub fn get_ascii_string_by_date(datetime: &str, offset_minutes: i32) -> Result<String, JsValue> {
    encode_datetime(datetime, offset_minutes).map_err(|e| JsValue::from_str(&e))
}

/// The weekday codes named by a rule's BYDAY part, as a JSON array.
#[wasm_bindgen(js_name = "daysFromByDayRule")]
pub fn days_from_byday_rule(rule: &str) -> Result<String, JsValue> {
    days_from_byday_json(rule).map_err(|e| JsValue::from_str(&e))
}
