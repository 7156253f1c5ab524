//! Identifier and date helpers
//!
//! Pure predicates and conversions used when normalizing filters and cursors.
//! None of these fail: unrecognized input is reported as "not an id" /
//! "not a date" and left for the caller to pass through.

use bson::oid::ObjectId;
use bson::Bson;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static OBJECT_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[0-9a-fA-F]{24}$").expect("object id regex is valid"));

/// Check whether a string has the 24 hex digit identifier format
pub fn is_valid_id_str(s: &str) -> bool {
    OBJECT_ID_REGEX.is_match(s)
}

/// Check whether a value is an identifier or an identifier-formatted string
pub fn is_valid_id(value: &Bson) -> bool {
    match value {
        Bson::ObjectId(_) => true,
        Bson::String(s) => is_valid_id_str(s),
        _ => false,
    }
}

/// Convert an identifier-formatted string into an `ObjectId`
pub fn to_object_id(s: &str) -> Option<ObjectId> {
    if !is_valid_id_str(s) {
        return None;
    }
    ObjectId::parse_str(s).ok()
}

/// Compare two values as identifiers (hex string and `ObjectId` compare equal)
pub fn are_equal_ids(a: &Bson, b: &Bson) -> bool {
    match (id_hex(a), id_hex(b)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(&b),
        _ => false,
    }
}

/// Deduplicate identifiers by their hex form, keeping first-seen order
pub fn dedupe_ids(ids: &[Bson]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter_map(id_hex)
        .map(|hex| hex.to_ascii_lowercase())
        .filter(|hex| seen.insert(hex.clone()))
        .collect()
}

fn id_hex(value: &Bson) -> Option<String> {
    match value {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) if is_valid_id_str(s) => Some(s.clone()),
        _ => None,
    }
}

/// Parse a date-like string
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.fff]` timestamps
/// (read as UTC) and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(s: &str) -> Option<bson::DateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(bson::DateTime::from_millis(dt.timestamp_millis()));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(bson::DateTime::from_millis(
                naive.and_utc().timestamp_millis(),
            ));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| bson::DateTime::from_millis(naive.and_utc().timestamp_millis()))
}

/// Check whether a value is a date or a date-like string
///
/// Numbers are never treated as dates: a numeric sort key must stay numeric.
pub fn is_valid_date(value: &Bson) -> bool {
    match value {
        Bson::DateTime(_) => true,
        Bson::String(s) => parse_date(s).is_some(),
        _ => false,
    }
}

/// Render a BSON date as an RFC 3339 string with millisecond precision
pub fn format_date(date: bson::DateTime) -> String {
    DateTime::<Utc>::from_timestamp_millis(date.timestamp_millis())
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_else(|| date.timestamp_millis().to_string())
}
