//! Pager module
//!
//! Runs a page request end to end.
//!
//! # Overview
//!
//! The pager module provides:
//! - `PageRequest` and its parts (`PagerSpec`, `GroupSpec`, `PopulatorSpec`)
//! - `Pager` - plans the pipeline, dispatches count and aggregate through a
//!   `QueryRunner` concurrently and builds the `PageResult`
//!
//! ```text
//! PageRequest ─▶ PipelineBuilder ─▶ PipelinePlan
//!                                      │
//!                 ┌────────────────────┴───────────────┐
//!                 ▼                                    ▼
//!        count (first page only)                 aggregate
//!                 └──────────────┬─────────────────────┘
//!                                ▼
//!                           PageResult
//! ```

mod result;
mod types;


pub use result::PageResult;
pub use types::{GroupSpec, PageRequest, PagerSpec, PopulateMode, PopulatorSpec, RetainedTarget};

use crate::config::PagerConfig;
use crate::error::{Error, Result};
use crate::executor::{DirectRunner, QueryOutput, QueryRequest, QueryRunner};
use crate::pipeline::{PipelineBuilder, PipelinePlan};
use crate::store::Collection;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Keyset pager over aggregation pipelines
#[derive(Clone)]
pub struct Pager {
    runner: Arc<dyn QueryRunner>,
    config: PagerConfig,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            runner: Arc::new(DirectRunner),
            config: PagerConfig::default(),
        }
    }
}

impl fmt::Debug for Pager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pager {
    /// Create a pager that queries collections directly
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch queries through `runner`
    #[must_use]
    pub fn with_runner(mut self, runner: impl QueryRunner + 'static) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    /// Dispatch queries through a shared runner
    #[must_use]
    pub fn with_shared_runner(mut self, runner: Arc<dyn QueryRunner>) -> Self {
        self.runner = runner;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: PagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    /// Plan a request without running it
    pub fn plan(&self, request: &PageRequest) -> Result<PipelinePlan> {
        PipelineBuilder::new(request, &self.config).build()
    }

    /// Fetch one page
    pub async fn page(&self, collection: &dyn Collection, request: &PageRequest) -> Result<PageResult> {
        let started_at = Utc::now();
        let plan = self.plan(request)?;

        tracing::debug!(
            collection = collection.name(),
            limit = plan.limit,
            stages = plan.stages.len(),
            "Planned page pipeline: {:?}",
            plan.stages
        );

        self.run_plan(collection, &plan, request.skip_cache, started_at)
            .await
    }

    /// Run an already built plan
    pub async fn run_plan(
        &self,
        collection: &dyn Collection,
        plan: &PipelinePlan,
        skip_cache: bool,
        started_at: DateTime<Utc>,
    ) -> Result<PageResult> {
        let count = async {
            let Some(query) = plan.count_query() else {
                return 0;
            };
            let request = QueryRequest::new(collection, query).with_skip_cache(skip_cache);
            match self.runner.run(request).await.and_then(QueryOutput::into_count) {
                Ok(total) => total,
                Err(e) => {
                    tracing::warn!(
                        collection = collection.name(),
                        "Count failed, reporting total as 0: {e}"
                    );
                    0
                }
            }
        };

        let rows = async {
            let request =
                QueryRequest::new(collection, plan.aggregate_query()).with_skip_cache(skip_cache);
            self.runner
                .run(request)
                .await
                .and_then(QueryOutput::into_documents)
        };

        let (total, rows) = futures::join!(count, rows);
        let rows = rows.map_err(|e| match e {
            e @ Error::QueryExecution { .. } => e,
            e => Error::query_execution(collection.name(), e),
        })?;

        let page = PageResult::from_rows(rows, plan, total, started_at);
        tracing::debug!(
            collection = collection.name(),
            size = page.size,
            can_load_more = page.can_load_more,
            "Page ready"
        );
        Ok(page)
    }
}

/// Fetch one page with the default pager
pub async fn page_aggregation(collection: &dyn Collection, request: &PageRequest) -> Result<PageResult> {
    Pager::default().page(collection, request).await
}
