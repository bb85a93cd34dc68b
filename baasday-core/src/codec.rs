//! Conversion between [`Value`]s and the service's JSON wire format.
//!
//! JSON has no date type, so timestamps travel as a tagged object:
//!
//! ```json
//! {"$type": "datetime", "$value": "2012-03-04T05:06:07.000Z"}
//! ```
//!
//! Encoding never fails. Decoding fails only on invalid JSON or a non-object
//! top level; a datetime object whose text cannot be parsed decodes to
//! [`Value::Null`] so one bad field does not discard a whole document.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number as JsonNumber, Value as JsonValue};
use tracing::warn;

use crate::{
    error::{BaasdayError, BaasdayResult},
    value::{Number, Value, ValueMap},
};

/// Key holding the extended type tag.
pub const TYPE_KEY: &str = "$type";
/// Key holding the extended type payload.
pub const VALUE_KEY: &str = "$value";
/// Type tag of wire timestamps.
pub const DATETIME_TYPE: &str = "datetime";

/// Formats a timestamp as RFC 3339 text in UTC with millisecond resolution.
///
/// Years outside `0000..=9999` are written with an explicit sign
/// (`+10000-01-01T00:00:00.000Z`), which [`parse_timestamp`] reads back.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses wire timestamp text, normalizing to UTC.
///
/// Accepts a full RFC 3339 date-time, a date-time without offset (read as
/// UTC), or a bare date (midnight UTC). A `Z`-suffixed date-time may carry a
/// signed year of any width.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    let utc_text = text.strip_suffix('Z').unwrap_or(text);
    if let Ok(naive) = NaiveDateTime::parse_from_str(utc_text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Encodes a single value into its JSON wire form.
pub fn encode_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(value) => JsonValue::Bool(*value),
        Value::Number(Number::Int(value)) => JsonValue::Number((*value).into()),
        // NaN and the infinities have no JSON spelling.
        Value::Number(Number::Float(value)) => JsonNumber::from_f64(*value)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::String(value) => JsonValue::String(value.clone()),
        Value::Timestamp(timestamp) => {
            let mut tagged = Map::new();
            tagged.insert(TYPE_KEY.to_string(), JsonValue::String(DATETIME_TYPE.to_string()));
            tagged.insert(VALUE_KEY.to_string(), JsonValue::String(format_timestamp(timestamp)));
            JsonValue::Object(tagged)
        }
        Value::List(values) => JsonValue::Array(values.iter().map(encode_value).collect()),
        Value::Map(map) => encode_map(map),
    }
}

/// Encodes a field map into a JSON object.
pub fn encode_map(map: &ValueMap) -> JsonValue {
    JsonValue::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

/// Encodes a field map into wire JSON text.
pub fn encode(map: &ValueMap) -> String {
    encode_map(map).to_string()
}

/// Decodes a single JSON value, restoring tagged timestamps.
pub fn decode_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(value) => Value::Bool(value),
        JsonValue::Number(number) => Value::Number(decode_number(&number)),
        JsonValue::String(value) => Value::String(value),
        JsonValue::Array(values) => Value::List(values.into_iter().map(decode_value).collect()),
        JsonValue::Object(object) => {
            if is_datetime(&object) {
                decode_datetime(&object)
            } else {
                Value::Map(decode_object(object))
            }
        }
    }
}

/// Decodes wire JSON text into a field map.
///
/// # Errors
///
/// Returns [`BaasdayError::MalformedResponse`] if the text is not valid JSON or
/// its top level is not an object.
pub fn decode(text: &str) -> BaasdayResult<ValueMap> {
    match decode_value(serde_json::from_str(text)?) {
        Value::Map(map) => Ok(map),
        other => Err(BaasdayError::MalformedResponse(format!(
            "expected a JSON object at the top level, found {}",
            other.type_name()
        ))),
    }
}

fn decode_object(object: Map<String, JsonValue>) -> ValueMap {
    object
        .into_iter()
        .map(|(key, value)| (key, decode_value(value)))
        .collect()
}

fn decode_number(number: &JsonNumber) -> Number {
    match number.as_i64() {
        Some(value) => Number::Int(value),
        None => Number::Float(number.as_f64().unwrap_or(f64::NAN)),
    }
}

fn is_datetime(object: &Map<String, JsonValue>) -> bool {
    object.get(TYPE_KEY).and_then(JsonValue::as_str) == Some(DATETIME_TYPE)
        && object.contains_key(VALUE_KEY)
}

fn decode_datetime(object: &Map<String, JsonValue>) -> Value {
    let Some(text) = object.get(VALUE_KEY).and_then(JsonValue::as_str) else {
        warn!("datetime value is not a string; decoding as null");
        return Value::Null;
    };

    match parse_timestamp(text) {
        Some(timestamp) => Value::Timestamp(timestamp),
        None => {
            warn!(value = text, "unparseable datetime value; decoding as null");
            Value::Null
        }
    }
}
