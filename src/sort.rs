//! Sort resolution
//!
//! Decides the pager direction and builds the `$sort` document.

use crate::types::{SortOrder, ID_FIELD};
use bson::Document;

/// Resolve the final sort direction
///
/// An explicit order of exactly `1` or `-1` wins. Otherwise an ascending flag
/// of `true` gives ascending order, and everything else falls back to
/// descending.
pub fn resolve_sort_order(explicit: Option<i32>, ascending: Option<bool>) -> SortOrder {
    if let Some(order) = explicit.and_then(SortOrder::from_i32) {
        return order;
    }

    if ascending == Some(true) {
        SortOrder::Ascending
    } else {
        SortOrder::Descending
    }
}

/// Build the sort specification for the pager field
///
/// With `secondary_on_id` set, `_id` breaks ties in the same direction.
pub fn sort_document(field: &str, order: SortOrder, secondary_on_id: bool) -> Document {
    let mut sort = Document::new();
    sort.insert(field, order);
    if secondary_on_id && field != ID_FIELD {
        sort.insert(ID_FIELD, order);
    }
    sort
}
