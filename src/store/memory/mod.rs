//! In-memory document store
//!
//! Collections are plain vectors of documents behind a shared lock.
//! Aggregations run through a small interpreter that understands the stages
//! the pipeline builder emits (`$match`, `$project`, `$group`, `$sort`,
//! `$limit`, `$lookup`, `$set`, `$replaceRoot`) plus `$skip`, `$count` and
//! `$addFields`.

mod interpreter;
mod matcher;
mod values;


pub use values::compare_values;

use super::Collection;
use crate::error::Result;
use crate::types::ID_FIELD;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Collections = HashMap<String, Vec<Document>>;

/// A set of named in-memory collections
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from prepared collections
    pub fn with_collections(collections: impl IntoIterator<Item = (String, Vec<Document>)>) -> Self {
        let collections = collections
            .into_iter()
            .map(|(name, docs)| (name, docs.into_iter().map(with_id).collect()))
            .collect();
        Self {
            collections: Arc::new(RwLock::new(collections)),
        }
    }

    /// Append documents to a collection, assigning `_id` where missing
    pub async fn insert_many(&self, collection: &str, docs: impl IntoIterator<Item = Document>) -> usize {
        let mut guard = self.collections.write().await;
        let target = guard.entry(collection.to_string()).or_default();
        let before = target.len();
        target.extend(docs.into_iter().map(with_id));
        let inserted = target.len() - before;
        tracing::debug!("Inserted {inserted} documents into {collection}");
        inserted
    }

    /// Snapshot of a collection's documents
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        let guard = self.collections.read().await;
        guard.get(collection).cloned().unwrap_or_default()
    }

    /// Names of all collections, sorted
    pub async fn collection_names(&self) -> Vec<String> {
        let guard = self.collections.read().await;
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every collection
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }

    /// Handle to a collection (which need not exist yet)
    pub fn collection(&self, name: impl Into<String>) -> MemoryCollection {
        MemoryCollection {
            name: name.into(),
            store: self.clone(),
        }
    }
}

fn with_id(mut doc: Document) -> Document {
    if !doc.contains_key(ID_FIELD) {
        doc.insert(ID_FIELD, ObjectId::new());
    }
    doc
}

/// A named collection inside a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    store: MemoryStore,
}

impl MemoryCollection {
    /// The store this collection belongs to
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count_documents(&self, filter: &Document) -> Result<u64> {
        let guard = self.store.collections.read().await;
        let mut count = 0u64;
        for doc in guard.get(&self.name).into_iter().flatten() {
            if matcher::matches(doc, filter)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn aggregate(&self, pipeline: &[Document]) -> Result<Vec<Document>> {
        let guard = self.store.collections.read().await;
        let docs = guard.get(&self.name).cloned().unwrap_or_default();
        interpreter::run_pipeline(docs, pipeline, &guard)
    }
}
