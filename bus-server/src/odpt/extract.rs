//! Ordered-fallback field extraction.
//!
//! The upstream schema varies by feed generation: the same concept
//! (occupancy, destination sign, observation time) appears under several
//! possible field names. Each concept gets one fallback list, kept as data,
//! plus a last-resort scan over key names.

use chrono::DateTime;
use serde_json::{Map, Value};

/// Preferred field names for a vehicle's occupancy text.
pub const OCCUPANCY_FIELDS: &[&str] = &[
    "odpt:occupancy",
    "odpt:occupancyStatus",
    "odpt:ext:occupancy",
    "odpt:ext:occupancyStatus",
];

/// Key-name fragments that mark an occupancy-ish field.
pub const OCCUPANCY_KEY_HINTS: &[&str] = &["occupancy", "crowd", "congestion"];

/// Preferred field names for a vehicle's destination sign.
pub const DESTINATION_FIELDS: &[&str] = &[
    "odpt:destinationSign",
    "odpt:destination",
    "odpt:destinationSignText",
];

pub const DESTINATION_KEY_HINTS: &[&str] = &["destination"];

/// Preferred field names for a record's observation timestamp.
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "dc:date",
    "dcterms:created",
    "dcterms:modified",
    "odpt:date",
    "odpt:time",
];

/// Preferred field names for a vehicle's predicted arrival at its current
/// destination sign.
pub const PREDICTED_ARRIVAL_FIELDS: &[&str] = &[
    "odpt:predictedArrivalTime",
    "odpt:predictedDepartureTime",
    "odpt:arrivalTime",
    "odpt:departureTime",
];

/// Preferred field names for status/remark text on a timetable record.
pub const STATUS_FIELDS: &[&str] = &[
    "odpt:note",
    "odpt:remark",
    "odpt:status",
    "odpt:busrouteStatus",
    "odpt:trainInformationStatus",
    "odpt:operationStatus",
];

pub const STATUS_KEY_HINTS: &[&str] = &["status", "note", "remark"];

/// Render a scalar JSON value as trimmed non-empty text.
fn scalar_text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First named field that holds usable scalar text.
fn first_field(map: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|f| map.get(*f).and_then(scalar_text))
}

/// First field whose (lowercased) key contains one of the hint fragments.
fn scan_keys(map: &Map<String, Value>, hints: &[&str]) -> Option<String> {
    map.iter().find_map(|(key, value)| {
        let lower = key.to_lowercase();
        if hints.iter().any(|h| lower.contains(h)) {
            scalar_text(value)
        } else {
            None
        }
    })
}

/// Extract text by the named-field list, then by key scan.
pub fn text_field(map: &Map<String, Value>, fields: &[&str], hints: &[&str]) -> Option<String> {
    first_field(map, fields).or_else(|| scan_keys(map, hints))
}

/// Extract an epoch (ms) from the first named field holding a parseable
/// RFC 3339 timestamp.
pub fn epoch_field(map: &Map<String, Value>, fields: &[&str]) -> Option<i64> {
    fields.iter().find_map(|f| {
        let text = map.get(*f).and_then(scalar_text)?;
        DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|dt| dt.timestamp_millis())
    })
}

/// Coerce a JSON value to a number (numbers and numeric strings).
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn named_fields_take_precedence_in_order() {
        let m = map(json!({
            "odpt:occupancyStatus": "満員",
            "odpt:occupancy": "少なめ"
        }));
        assert_eq!(
            text_field(&m, OCCUPANCY_FIELDS, OCCUPANCY_KEY_HINTS).as_deref(),
            Some("少なめ")
        );
    }

    #[test]
    fn key_scan_catches_variant_names() {
        let m = map(json!({ "odpt:ext:crowdingLevel": "high" }));
        assert_eq!(
            text_field(&m, OCCUPANCY_FIELDS, OCCUPANCY_KEY_HINTS).as_deref(),
            Some("high")
        );
        // numbers and booleans count as scalar text
        let m = map(json!({ "vendor:occupancyPercent": 42 }));
        assert_eq!(
            text_field(&m, OCCUPANCY_FIELDS, OCCUPANCY_KEY_HINTS).as_deref(),
            Some("42")
        );
    }

    #[test]
    fn empty_and_structured_values_are_skipped() {
        let m = map(json!({
            "odpt:occupancy": "  ",
            "odpt:occupancyStatus": { "nested": true }
        }));
        assert_eq!(text_field(&m, OCCUPANCY_FIELDS, OCCUPANCY_KEY_HINTS), None);
    }

    #[test]
    fn timestamp_parses_rfc3339() {
        let m = map(json!({ "dc:date": "2024-06-10T12:00:00+09:00" }));
        let epoch = epoch_field(&m, TIMESTAMP_FIELDS).unwrap();
        // 2024-06-10T03:00:00Z
        assert_eq!(epoch, 1_717_988_400_000);

        let m = map(json!({ "dc:date": "not a date", "odpt:date": "2024-06-10T12:00:00+09:00" }));
        assert!(epoch_field(&m, TIMESTAMP_FIELDS).is_some());

        let m = map(json!({ "unrelated": 1 }));
        assert_eq!(epoch_field(&m, TIMESTAMP_FIELDS), None);
    }

    #[test]
    fn status_prefers_note_then_scans() {
        let m = map(json!({ "odpt:note": "終車" }));
        assert_eq!(
            text_field(&m, STATUS_FIELDS, STATUS_KEY_HINTS).as_deref(),
            Some("終車")
        );
        let m = map(json!({ "odpt:operationNote": "運休" }));
        assert_eq!(
            text_field(&m, STATUS_FIELDS, STATUS_KEY_HINTS).as_deref(),
            Some("運休")
        );
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(numeric_value(&json!(120)), Some(120.0));
        assert_eq!(numeric_value(&json!("90")), Some(90.0));
        assert_eq!(numeric_value(&json!("x")), None);
        assert_eq!(numeric_value(&json!(null)), None);
    }
}
