//! Filter normalization
//!
//! Keys following the `...Id` naming convention hold references to other
//! documents. Callers usually send them as hex strings (query strings, JSON
//! bodies), while the store compares them as `ObjectId`s, so they are cast
//! before the filter reaches `$match`.

use crate::values::to_object_id;
use bson::{Bson, Document};

/// Suffix marking a filter key as an identifier reference
pub const ID_KEY_SUFFIX: &str = "Id";

/// Return a copy of `filter` with identifier-like values cast to `ObjectId`
///
/// The caller's filter is left untouched.
pub fn cast_ids(filter: &Document) -> Document {
    let mut cast = filter.clone();
    cast_ids_in_place(&mut cast);
    cast
}

/// Cast identifier-like values of `filter` in place
///
/// For every key ending in `Id`: a scalar hex string becomes an `ObjectId`,
/// an array is converted element-wise. Values that do not look like
/// identifiers, and keys that do not follow the convention, are untouched.
pub fn cast_ids_in_place(filter: &mut Document) {
    for (key, value) in filter.iter_mut() {
        if !key.ends_with(ID_KEY_SUFFIX) {
            continue;
        }
        cast_value(value);
    }
}

fn cast_value(value: &mut Bson) {
    match value {
        Bson::String(s) => {
            if let Some(oid) = to_object_id(s) {
                *value = Bson::ObjectId(oid);
            }
        }
        Bson::Array(items) => {
            for item in items.iter_mut() {
                if let Bson::String(s) = item {
                    if let Some(oid) = to_object_id(s) {
                        *item = Bson::ObjectId(oid);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Merge `fragment` into `filter`, replacing predicates on the same keys
pub fn merge_predicate(filter: &mut Document, fragment: Document) {
    for (key, value) in fragment {
        filter.insert(key, value);
    }
}
