//! Planned queries for one page

use crate::executor::Query;
use crate::types::{Pipeline, SortOrder};
use bson::Document;
use serde::Serialize;

/// Everything needed to run one page and shape its result
///
/// Built once per request and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelinePlan {
    /// Normalized filter, including the cursor predicate
    pub filter: Document,

    /// Filter for the total count; `None` when paging from a cursor
    pub count_filter: Option<Document>,

    /// Full aggregation pipeline
    pub stages: Pipeline,

    /// Resolved `$sort` document
    pub sort: Document,

    pub sort_order: SortOrder,

    /// Page size (the pipeline fetches one more row)
    pub limit: u32,

    /// Field the page is sorted on
    pub pager_field: String,

    /// Field holding the sort value on output rows
    pub cursor_field: String,

    /// Whether cursors carry `_id`
    pub secondary_sort_on_id: bool,
}

impl PipelinePlan {
    /// Count query, if this page needs one
    pub fn count_query(&self) -> Option<Query> {
        self.count_filter
            .clone()
            .map(|filter| Query::Count { filter })
    }

    /// The aggregation query
    pub fn aggregate_query(&self) -> Query {
        Query::Aggregate {
            pipeline: self.stages.clone(),
        }
    }

    /// Number of rows the pipeline asks for
    pub fn fetch_limit(&self) -> i64 {
        i64::from(self.limit) + 1
    }

    /// Whether root replacement moved the sort value to a stash field
    pub fn uses_stash(&self) -> bool {
        self.cursor_field != self.pager_field
    }
}
