// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # aggpage
//!
//! Keyset pagination over document-database aggregation pipelines.
//!
//! A declarative [`PageRequest`] (sort field, limit, cursor, optional
//! grouping and joins) is translated into a single aggregation pipeline,
//! run through a pluggable [`QueryRunner`], and reshaped into a
//! [`PageResult`] carrying the cursor for the next page.
//!
//! ## Features
//!
//! - **Keyset cursors**: `{field: {"$lt": last}}` predicates instead of offsets
//! - **Overshoot detection**: fetches `limit + 1` rows to know if more exist
//! - **Grouping**: `$group` with first/last row selection, sums and counts
//! - **Joins**: `$lookup` populators, optionally replacing the root document
//! - **Memory store**: an in-process `Collection` for tests and the CLI
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aggpage::{MemoryStore, PageRequest, Pager, Result};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = MemoryStore::new();
//!     store.insert_many("orders", vec![doc! { "total": 12 }, doc! { "total": 30 }]).await;
//!     let orders = store.collection("orders");
//!
//!     let request = PageRequest::new("total").with_limit(1);
//!     let page = Pager::new().page(&orders, &request).await?;
//!
//!     if let Some(next) = page.next_request(&request) {
//!         let second = Pager::new().page(&orders, &next).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Pager                                │
//! │   page(collection, request) → PageResult { items, from, ... }   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Filter  │  Cursor   │    Stages     │ Executor  │   Store     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Id cast  │ Encode    │ $group        │ Runner    │ Collection  │
//! │ Merge    │ Decode    │ $lookup       │ Logging   │ Memory      │
//! │          │ Classify  │ $replaceRoot  │           │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Identifier and date helpers
pub mod values;

/// Filter normalization
pub mod filter;

/// Sort resolution
pub mod sort;

/// Keyset cursors
pub mod cursor;

/// `$group` and `$lookup` stage generation
pub mod stages;

/// Pipeline assembly
pub mod pipeline;

/// Query runners
pub mod executor;

/// Page requests and results
pub mod pager;

/// Collections and the in-memory store
pub mod store;

/// Pager configuration
pub mod config;

/// Request and document file loading
pub mod loader;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::PagerConfig;
pub use cursor::{Cursor, CursorToken};
pub use executor::{DirectRunner, LoggingRunner, Query, QueryOutput, QueryRequest, QueryRunner};
pub use loader::{load_documents, load_request, load_request_from_str};
pub use pager::{
    page_aggregation, GroupSpec, PageRequest, PageResult, Pager, PagerSpec, PopulateMode,
    PopulatorSpec, RetainedTarget,
};
pub use pipeline::{PipelineBuilder, PipelinePlan};
pub use store::{Collection, MemoryCollection, MemoryStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
