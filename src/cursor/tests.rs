//! Tests for cursor module

use super::*;
use bson::oid::ObjectId;
use bson::{doc, Bson};
use pretty_assertions::assert_eq;

const HEX: &str = "507f1f77bcf86cd799439011";

// ============================================================================
// Encoding Tests
// ============================================================================

#[test]
fn test_cursor_from_row() {
    let row = doc! { "_id": 7, "createdAt": 42, "name": "a" };

    let cursor = Cursor::from_row(&row, "createdAt", "createdAt", false);
    assert_eq!(cursor.as_document(), &doc! { "createdAt": 42 });

    let cursor = Cursor::from_row(&row, "createdAt", "createdAt", true);
    assert_eq!(cursor.as_document(), &doc! { "createdAt": 42, "_id": 7 });
}

#[test]
fn test_cursor_from_row_uses_stash_field() {
    let row = doc! { "_id": 1, "_createdAt_99": 10, "createdAt": 500 };
    let cursor = Cursor::from_row(&row, "_createdAt_99", "createdAt", false);
    assert_eq!(cursor.as_document(), &doc! { "createdAt": 10 });
}

#[test]
fn test_cursor_from_row_nested_field() {
    let row = doc! { "_id": 1, "meta": { "n": 4, "tags": [{ "at": 9 }] } };

    let cursor = Cursor::from_row(&row, "meta.n", "meta.n", false);
    assert_eq!(cursor.as_document(), &doc! { "meta.n": 4 });

    let cursor = Cursor::from_row(&row, "meta.tags.0.at", "meta.tags.0.at", false);
    assert_eq!(cursor.get("meta.tags.0.at"), Some(&Bson::Int32(9)));

    let cursor = Cursor::from_row(&row, "meta.missing", "meta.missing", false);
    assert_eq!(cursor.get("meta.missing"), Some(&Bson::Null));
}

#[test]
fn test_cursor_from_row_missing_value_is_null() {
    let row = doc! { "_id": 1 };
    let cursor = Cursor::from_row(&row, "score", "score", false);
    assert_eq!(cursor.get("score"), Some(&Bson::Null));
}

#[test]
fn test_cursor_encode_native_values() {
    let date = bson::DateTime::from_millis(1_672_531_200_000);
    let cursor = Cursor::new(doc! {
        "createdAt": date,
        "_id": ObjectId::parse_str(HEX).unwrap(),
    });

    let encoded = cursor.encode();
    let json: serde_json::Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(json["createdAt"], "2023-01-01T00:00:00.000Z");
    assert_eq!(json["_id"], HEX);
}

// ============================================================================
// Decoding Tests
// ============================================================================

#[test]
fn test_decode_document_token() {
    let token = CursorToken::from(doc! { "score": 12 });
    assert_eq!(decode_value(&token, "score"), Some(Bson::Int32(12)));
    assert_eq!(decode_value(&token, "other"), None);
}

#[test]
fn test_decode_json_text_token() {
    let token = CursorToken::from(r#"{"name": "m"}"#);
    assert_eq!(decode_value(&token, "name"), Some(Bson::String("m".into())));
}

#[test]
fn test_decode_unparsable_text_is_raw_value() {
    let token = CursorToken::from("2023-05-01");
    assert_eq!(
        decode_value(&token, "createdAt"),
        Some(Bson::String("2023-05-01".into()))
    );
}

#[test]
fn test_decode_empty_text_is_nothing() {
    let token = CursorToken::from("  ");
    assert_eq!(decode_value(&token, "createdAt"), None);
    assert!(next_page_predicate(&token, "createdAt").is_none());
}

#[test]
fn test_classify_value() {
    assert_eq!(
        classify_value(Bson::String(HEX.into())),
        Bson::ObjectId(ObjectId::parse_str(HEX).unwrap())
    );
    assert_eq!(
        classify_value(Bson::String("2023-01-01T00:00:00Z".into())),
        Bson::DateTime(bson::DateTime::from_millis(1_672_531_200_000))
    );
    assert_eq!(
        classify_value(Bson::String("zebra".into())),
        Bson::String("zebra".into())
    );
    assert_eq!(classify_value(Bson::Int64(99)), Bson::Int64(99));
}

#[test]
fn test_next_page_predicate() {
    let token = CursorToken::from(doc! { "score": 12 });
    assert_eq!(
        next_page_predicate(&token, "score"),
        Some(doc! { "score": { "$lt": 12 } })
    );
}

// ============================================================================
// Round Trip Tests
// ============================================================================

#[test]
fn test_round_trip_object_id() {
    let last_id = ObjectId::parse_str(HEX).unwrap();
    let row = doc! { "_id": last_id };
    let cursor = Cursor::from_row(&row, "_id", "_id", false);

    // Through the text channel
    let token = CursorToken::from(cursor.encode());
    assert_eq!(
        next_page_predicate(&token, "_id"),
        Some(doc! { "_id": { "$lt": last_id } })
    );

    // And natively
    assert_eq!(
        next_page_predicate(&cursor.to_token(), "_id"),
        Some(doc! { "_id": { "$lt": last_id } })
    );
}

#[test]
fn test_round_trip_date() {
    let date = bson::DateTime::from_millis(1_700_000_000_123);
    let row = doc! { "_id": 1, "createdAt": date };
    let cursor = Cursor::from_row(&row, "createdAt", "createdAt", false);

    let token = CursorToken::from(cursor.encode());
    assert_eq!(
        next_page_predicate(&token, "createdAt"),
        Some(doc! { "createdAt": { "$lt": date } })
    );
}

#[test]
fn test_token_serde_untagged() {
    let token: CursorToken = serde_json::from_str(r#"{"score": 3}"#).unwrap();
    assert!(matches!(token, CursorToken::Document(_)));

    let token: CursorToken = serde_json::from_str(r#""{\"score\": 3}""#).unwrap();
    assert!(matches!(token, CursorToken::Text(_)));
    let value = decode_value(&token, "score").unwrap();
    assert!(matches!(value, Bson::Int32(3) | Bson::Int64(3)));
}
