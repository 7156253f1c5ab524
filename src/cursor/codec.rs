//! Cursor decoding
//!
//! Turns an incoming token into the predicate that selects the next page.

use super::types::CursorToken;
use crate::values::{parse_date, to_object_id};
use bson::{doc, Bson, Document};

/// Extract the raw value stored for `field` in a token
///
/// Text that does not parse as a JSON object is taken to be the value
/// itself. A parsed token without the field yields `None`.
pub fn decode_value(token: &CursorToken, field: &str) -> Option<Bson> {
    match token.parse() {
        Some(document) => document.get(field).cloned(),
        None => match token {
            CursorToken::Text(text) if !text.trim().is_empty() => Some(Bson::String(text.clone())),
            _ => None,
        },
    }
}

/// Convert a cursor value into the store's native representation
///
/// Identifier-formatted strings become `ObjectId`s, date-like strings become
/// BSON dates; everything else is returned unchanged.
pub fn classify_value(value: Bson) -> Bson {
    match value {
        Bson::String(s) => {
            if let Some(oid) = to_object_id(&s) {
                Bson::ObjectId(oid)
            } else if let Some(date) = parse_date(&s) {
                Bson::DateTime(date)
            } else {
                Bson::String(s)
            }
        }
        other => other,
    }
}

/// Predicate selecting rows after the cursor: `{field: {"$lt": value}}`
pub fn next_page_predicate(token: &CursorToken, field: &str) -> Option<Document> {
    let value = classify_value(decode_value(token, field)?);
    let mut predicate = Document::new();
    predicate.insert(field, doc! { "$lt": value });
    Some(predicate)
}
