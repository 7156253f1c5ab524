//! Store module
//!
//! The document store as seen by the pager.
//!
//! # Overview
//!
//! The store module provides:
//! - `Collection` - the two read primitives the pager needs, plus the name
//!   joins refer to
//! - `MemoryStore` / `MemoryCollection` - an in-process store with an
//!   aggregation interpreter for the stage vocabulary this crate emits

mod memory;

pub use memory::{compare_values, MemoryCollection, MemoryStore};

use crate::error::Result;
use async_trait::async_trait;
use bson::Document;

/// A collection handle backed by some document store
#[async_trait]
pub trait Collection: Send + Sync {
    /// Collection name, as used by `$lookup`
    fn name(&self) -> &str;

    /// Count documents matching `filter`
    async fn count_documents(&self, filter: &Document) -> Result<u64>;

    /// Run an aggregation pipeline
    async fn aggregate(&self, pipeline: &[Document]) -> Result<Vec<Document>>;
}
