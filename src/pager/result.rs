//! Page results

use super::types::PageRequest;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::pipeline::PipelinePlan;
use crate::types::SortOrder;
use bson::Document;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    /// Rows of this page, at most `limit`
    pub items: Vec<Document>,

    /// Cursor for the next page; `None` on the last page
    pub from: Option<Cursor>,

    /// Rows matching the filter, counted on the first page only
    ///
    /// The count runs independently of the page read, so the two may see
    /// different snapshots. A failed count leaves this at zero.
    pub total: u64,

    /// Number of items returned
    pub size: usize,

    /// Effective page size
    pub limit: u32,

    /// Whether another page exists
    pub can_load_more: bool,

    pub sort_order: SortOrder,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PageResult {
    /// Shape raw pipeline rows into a page
    ///
    /// The pipeline fetches `limit + 1` rows; the extra row only signals
    /// that more exist and is dropped here. The cursor is taken from the
    /// last row kept.
    pub fn from_rows(
        mut rows: Vec<Document>,
        plan: &PipelinePlan,
        total: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        let limit = usize::try_from(plan.limit).unwrap_or(usize::MAX);
        let can_load_more = rows.len() > limit;
        rows.truncate(limit);

        let from = if can_load_more {
            rows.last().map(|row| {
                Cursor::from_row(
                    row,
                    &plan.cursor_field,
                    &plan.pager_field,
                    plan.secondary_sort_on_id,
                )
            })
        } else {
            None
        };

        Self {
            size: rows.len(),
            items: rows,
            from,
            total,
            limit: plan.limit,
            can_load_more,
            sort_order: plan.sort_order,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Whether the page has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wall time spent producing the page
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Request for the page after this one
    pub fn next_request(&self, request: &PageRequest) -> Option<PageRequest> {
        let cursor = self.from.as_ref()?;
        Some(request.clone().with_cursor(cursor.to_token()))
    }

    /// Deserialize the items into a caller type
    pub fn deserialize_items<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.items
            .iter()
            .map(|item| {
                bson::deserialize_from_document(item.clone())
                    .map_err(|e| Error::decode(format!("Failed to deserialize page item: {e}")))
            })
            .collect()
    }
}
