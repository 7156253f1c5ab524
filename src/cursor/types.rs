//! Cursor types
//!
//! [`Cursor`] is what a page hands back; [`CursorToken`] is what a request
//! carries in, which may have gone through a query string on the way.

use crate::types::ID_FIELD;
use crate::values::format_date;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Position of the last row of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Document);

impl Cursor {
    /// Wrap an already built cursor document
    pub fn new(document: Document) -> Self {
        Self(document)
    }

    /// Build the cursor for `row`
    ///
    /// `value_field` is where the sort value lives on the row (a stash field
    /// after root replacement), `pager_field` is the key the cursor is stored
    /// under. Both may be dotted paths into nested documents. A row without
    /// the value yields `null`, which selects nothing on the next page.
    pub fn from_row(row: &Document, value_field: &str, pager_field: &str, with_id: bool) -> Self {
        let mut document = Document::new();
        document.insert(
            pager_field,
            lookup(row, value_field).cloned().unwrap_or(Bson::Null),
        );
        if with_id {
            document.insert(ID_FIELD, row.get(ID_FIELD).cloned().unwrap_or(Bson::Null));
        }
        Self(document)
    }

    /// Get the value stored for a field
    pub fn get(&self, field: &str) -> Option<&Bson> {
        self.0.get(field)
    }

    /// Borrow the cursor document
    pub fn as_document(&self) -> &Document {
        &self.0
    }

    /// Take the cursor document
    pub fn into_document(self) -> Document {
        self.0
    }

    /// Native token for the next request
    pub fn to_token(&self) -> CursorToken {
        CursorToken::Document(self.0.clone())
    }

    /// JSON wire form
    ///
    /// Identifiers are written as hex strings and dates as RFC 3339 strings,
    /// which the decoder turns back into native values.
    pub fn encode(&self) -> String {
        let map: serde_json::Map<String, JsonValue> = self
            .0
            .iter()
            .map(|(key, value)| (key.clone(), wire_value(value)))
            .collect();
        JsonValue::Object(map).to_string()
    }
}

/// Resolve a dotted path, stepping into documents and array indexes
fn lookup<'a>(row: &'a Document, path: &str) -> Option<&'a Bson> {
    if let Some(value) = row.get(path) {
        return Some(value);
    }
    let mut parts = path.split('.');
    let mut current = row.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            Bson::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

impl From<Cursor> for CursorToken {
    fn from(cursor: Cursor) -> Self {
        CursorToken::Document(cursor.into_document())
    }
}

fn wire_value(value: &Bson) -> JsonValue {
    match value {
        Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
        Bson::DateTime(date) => JsonValue::String(format_date(*date)),
        Bson::String(s) => JsonValue::String(s.clone()),
        Bson::Int32(n) => JsonValue::from(*n),
        Bson::Int64(n) => JsonValue::from(*n),
        Bson::Double(n) => JsonValue::from(*n),
        Bson::Boolean(b) => JsonValue::Bool(*b),
        Bson::Null => JsonValue::Null,
        other => serde_json::to_value(other).unwrap_or(JsonValue::Null),
    }
}

/// Cursor as received from a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CursorToken {
    /// Already structured cursor
    Document(Document),
    /// Cursor that went through a text channel (usually JSON)
    Text(String),
}

impl CursorToken {
    /// Parse a text token into a document
    ///
    /// Returns `None` when the token is text that is not a JSON object.
    pub fn parse(&self) -> Option<Document> {
        match self {
            CursorToken::Document(document) => Some(document.clone()),
            CursorToken::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                serde_json::from_str::<Document>(text).ok()
            }
        }
    }
}

impl From<Document> for CursorToken {
    fn from(document: Document) -> Self {
        CursorToken::Document(document)
    }
}

impl From<&str> for CursorToken {
    fn from(text: &str) -> Self {
        CursorToken::Text(text.to_string())
    }
}

impl From<String> for CursorToken {
    fn from(text: String) -> Self {
        CursorToken::Text(text)
    }
}
