//! Cursor module
//!
//! Keyset cursors for forward pagination.
//!
//! # Overview
//!
//! A cursor records the sort-key value of the last row of a page (and its
//! `_id` when ties are broken on `_id`). The next request turns it back into
//! a `{field: {"$lt": value}}` predicate, so pages advance toward smaller sort
//! keys. Only this "less than" direction is supported.
//!
//! The cursor travels either as a native document or as a JSON string; see
//! [`CursorToken`].

mod codec;
mod types;

pub use codec::{classify_value, decode_value, next_page_predicate};
pub use types::{Cursor, CursorToken};

#[cfg(test)]
mod tests;
