//! Query execution module
//!
//! The hook through which the pager runs the queries it builds.
//!
//! # Overview
//!
//! The executor module provides:
//! - `Query` / `QueryOutput` - the two query shapes and their results
//! - `QueryRunner` - strategy trait the pager dispatches through
//! - `DirectRunner` - runs queries straight against the collection
//! - `LoggingRunner` - wraps another runner and traces every query

mod types;

#[cfg(test)]
mod tests;

pub use types::{Query, QueryOutput, QueryRequest};

use crate::error::Result;
use async_trait::async_trait;
use std::time::Instant;

/// Strategy for running a built query
///
/// Implementations can add caching, retries or instrumentation around the
/// store call. `skip_cache` on the request is a hint for caching runners.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Run a query and return its output
    async fn run(&self, request: QueryRequest<'_>) -> Result<QueryOutput>;
}

/// Runs queries directly against the collection
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRunner;

#[async_trait]
impl QueryRunner for DirectRunner {
    async fn run(&self, request: QueryRequest<'_>) -> Result<QueryOutput> {
        request.execute().await
    }
}

/// Traces each query and its duration before delegating
#[derive(Debug, Clone, Default)]
pub struct LoggingRunner<R> {
    inner: R,
}

impl<R: QueryRunner> LoggingRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// The wrapped runner
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: QueryRunner> QueryRunner for LoggingRunner<R> {
    async fn run(&self, request: QueryRequest<'_>) -> Result<QueryOutput> {
        let kind = request.query.kind();
        let collection = request.collection_name().to_string();
        let start = Instant::now();

        tracing::debug!(
            collection = %collection,
            skip_cache = request.skip_cache,
            "Running {kind} query"
        );

        let result = self.inner.run(request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(QueryOutput::Count(n)) => {
                tracing::debug!(collection = %collection, elapsed_ms, "Counted {n} documents");
            }
            Ok(QueryOutput::Documents(docs)) => {
                tracing::debug!(
                    collection = %collection,
                    elapsed_ms,
                    "Aggregation returned {} documents",
                    docs.len()
                );
            }
            Err(e) => {
                tracing::warn!(collection = %collection, elapsed_ms, "{kind} query failed: {e}");
            }
        }

        result
    }
}
