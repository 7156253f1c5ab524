//! Common types used throughout aggpage
//!
//! This module contains shared type definitions, type aliases,
//! and small value types used across multiple modules.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// BSON document (re-exported from bson)
pub type Document = bson::Document;

/// BSON value (re-exported from bson)
pub type Value = bson::Bson;

/// An ordered aggregation pipeline
pub type Pipeline = Vec<Document>;

/// Field name of the primary key in every document
pub const ID_FIELD: &str = "_id";

// ============================================================================
// Sort Order
// ============================================================================

/// Direction of the pager sort, serialized as `1` / `-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum SortOrder {
    /// Least to greatest (`1`)
    Ascending,
    /// Greatest to least (`-1`)
    #[default]
    Descending,
}

impl SortOrder {
    /// Numeric form used in `$sort` stages
    pub fn as_i32(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }

    /// Parse `1` / `-1`, anything else is rejected
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(SortOrder::Ascending),
            -1 => Some(SortOrder::Descending),
            _ => None,
        }
    }

    pub fn is_ascending(self) -> bool {
        matches!(self, SortOrder::Ascending)
    }
}

impl From<SortOrder> for i32 {
    fn from(order: SortOrder) -> Self {
        order.as_i32()
    }
}

impl TryFrom<i32> for SortOrder {
    type Error = String;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        SortOrder::from_i32(value).ok_or_else(|| format!("sort order must be 1 or -1, got {value}"))
    }
}

impl From<SortOrder> for Value {
    fn from(order: SortOrder) -> Self {
        Value::Int32(order.as_i32())
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

// ============================================================================
// Limit
// ============================================================================

/// Requested page size as supplied by the caller
///
/// Query strings and loosely typed clients send the limit as text, so both
/// numbers and numeric strings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitValue {
    Number(i64),
    Text(String),
}

impl LimitValue {
    /// Positive limit, or `None` when the value is zero, negative or not numeric
    ///
    /// Text is read up to the first non-digit, so `"12.5"` and `"12abc"`
    /// both mean 12.
    pub fn positive(&self) -> Option<u32> {
        let parsed = match self {
            LimitValue::Number(n) => *n,
            LimitValue::Text(s) => leading_integer(s)?,
        };
        if parsed > 0 {
            Some(u32::try_from(parsed).unwrap_or(u32::MAX))
        } else {
            None
        }
    }
}

static LEADING_INTEGER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("leading integer regex is valid"));

fn leading_integer(text: &str) -> Option<i64> {
    let digits = LEADING_INTEGER_REGEX.captures(text)?.get(1)?.as_str();
    match digits.parse::<i64>() {
        Ok(n) => Some(n),
        // too many digits for i64; keep the sign
        Err(_) if digits.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

/// Whatever a request file puts under `limit`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Deserialize an optional limit without ever failing
///
/// Floats are truncated, strings are kept for [`LimitValue::positive`] and
/// anything else (booleans, maps, null) counts as no limit.
pub fn deserialize_limit<'de, D>(deserializer: D) -> std::result::Result<Option<LimitValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let limit = match RawLimit::deserialize(deserializer)? {
        RawLimit::Integer(n) => Some(LimitValue::Number(n)),
        RawLimit::Float(n) if n.is_finite() => Some(LimitValue::Number(n.trunc() as i64)),
        RawLimit::Text(s) => Some(LimitValue::Text(s)),
        RawLimit::Float(_) | RawLimit::Other(_) => None,
    };
    Ok(limit)
}

impl From<i64> for LimitValue {
    fn from(n: i64) -> Self {
        LimitValue::Number(n)
    }
}

impl From<i32> for LimitValue {
    fn from(n: i32) -> Self {
        LimitValue::Number(i64::from(n))
    }
}

impl From<&str> for LimitValue {
    fn from(s: &str) -> Self {
        LimitValue::Text(s.to_string())
    }
}
