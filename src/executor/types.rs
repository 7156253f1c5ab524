//! Query executor types

use crate::error::{Error, Result};
use crate::store::Collection;
use bson::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A query built by the pager, ready to dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Query {
    /// Count documents matching a filter
    Count { filter: Document },

    /// Run an aggregation pipeline
    Aggregate { pipeline: Vec<Document> },
}

impl Query {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Count { .. } => "count",
            Self::Aggregate { .. } => "aggregate",
        }
    }
}

/// Result of a dispatched [`Query`]
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Count(u64),
    Documents(Vec<Document>),
}

impl QueryOutput {
    /// Unwrap a count result
    pub fn into_count(self) -> Result<u64> {
        match self {
            Self::Count(n) => Ok(n),
            Self::Documents(_) => Err(Error::UnexpectedOutput { expected: "count" }),
        }
    }

    /// Unwrap an aggregation result
    pub fn into_documents(self) -> Result<Vec<Document>> {
        match self {
            Self::Documents(docs) => Ok(docs),
            Self::Count(_) => Err(Error::UnexpectedOutput {
                expected: "documents",
            }),
        }
    }
}

/// One query against one collection
pub struct QueryRequest<'a> {
    /// Target collection
    pub collection: &'a dyn Collection,

    /// What to run
    pub query: Query,

    /// Whether a caching runner should bypass its cache
    pub skip_cache: bool,
}

impl<'a> QueryRequest<'a> {
    pub fn new(collection: &'a dyn Collection, query: Query) -> Self {
        Self {
            collection,
            query,
            skip_cache: false,
        }
    }

    #[must_use]
    pub fn with_skip_cache(mut self, skip_cache: bool) -> Self {
        self.skip_cache = skip_cache;
        self
    }

    /// Name of the target collection
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Run the query directly against the collection
    pub async fn execute(&self) -> Result<QueryOutput> {
        match &self.query {
            Query::Count { filter } => self
                .collection
                .count_documents(filter)
                .await
                .map(QueryOutput::Count),
            Query::Aggregate { pipeline } => self
                .collection
                .aggregate(pipeline)
                .await
                .map(QueryOutput::Documents),
        }
    }
}

impl fmt::Debug for QueryRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRequest")
            .field("collection", &self.collection_name())
            .field("query", &self.query)
            .field("skip_cache", &self.skip_cache)
            .finish()
    }
}
