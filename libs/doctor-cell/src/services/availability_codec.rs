//! Storage encoding of weekly availability.
//!
//! The backend keeps availability as a JSON string on the doctor row:
//! `{"Monday": ["09:00-12:00", "14:00-17:00"], ...}`. Rows written by older
//! editors may carry `{start, end}` objects instead of strings, so decoding
//! accepts both.

use chrono::Weekday;
use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{weekday_name, TimeRange, WeeklyAvailability};

pub fn encode_weekly(availability: &WeeklyAvailability) -> String {
    let mut days = Map::new();
    for (day, ranges) in availability.iter() {
        let encoded = ranges
            .iter()
            .map(|range| Value::String(format!("{}-{}", range.start, range.end)))
            .collect();
        days.insert(weekday_name(day).to_string(), Value::Array(encoded));
    }
    Value::Object(days).to_string()
}

pub fn decode_weekly(raw: &str) -> WeeklyAvailability {
    if raw.trim().is_empty() {
        return WeeklyAvailability::new();
    }

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Stored availability is not valid JSON, treating as empty: {}", e);
            return WeeklyAvailability::new();
        }
    };

    let Value::Object(days) = parsed else {
        warn!("Stored availability is not an object, treating as empty");
        return WeeklyAvailability::new();
    };

    let mut availability = WeeklyAvailability::new();
    for (name, entries) in days {
        let Ok(day) = name.parse::<Weekday>() else {
            warn!("Ignoring availability for unknown day '{}'", name);
            continue;
        };

        let ranges = match entries {
            Value::Array(items) => items.iter().filter_map(decode_range).collect(),
            _ => Vec::new(),
        };
        availability.set_ranges(day, ranges);
    }

    availability
}

/// Splits `"HH:MM-HH:MM"` on the first `-`; a missing half becomes "".
pub fn split_range(encoded: &str) -> TimeRange {
    match encoded.split_once('-') {
        Some((start, end)) => TimeRange::new(start.trim(), end.trim()),
        None => TimeRange::new(encoded.trim(), ""),
    }
}

fn decode_range(entry: &Value) -> Option<TimeRange> {
    match entry {
        Value::String(encoded) => Some(split_range(encoded)),
        Value::Object(fields) => {
            let start = fields.get("start").and_then(Value::as_str).unwrap_or_default();
            let end = fields.get("end").and_then(Value::as_str).unwrap_or_default();
            Some(TimeRange::new(start, end))
        }
        _ => None,
    }
}
