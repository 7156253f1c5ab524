//! Tests for query runners

use super::*;
use crate::error::Error;
use crate::store::{Collection, MemoryStore};
use bson::doc;
use pretty_assertions::assert_eq;

async fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert_many("events", (1..=3).map(|n| doc! { "_id": n, "n": n }))
        .await;
    store
}

#[tokio::test]
async fn test_direct_runner_count() {
    let store = seeded().await;
    let events = store.collection("events");

    let request = QueryRequest::new(&events, Query::Count { filter: doc! { "n": { "$gte": 2 } } });
    let output = DirectRunner.run(request).await.unwrap();

    assert_eq!(output, QueryOutput::Count(2));
}

#[tokio::test]
async fn test_direct_runner_aggregate() {
    let store = seeded().await;
    let events = store.collection("events");

    let request = QueryRequest::new(
        &events,
        Query::Aggregate {
            pipeline: vec![doc! { "$sort": { "n": -1 } }, doc! { "$limit": 1 }],
        },
    );
    let docs = DirectRunner.run(request).await.unwrap().into_documents().unwrap();

    assert_eq!(docs, vec![doc! { "_id": 3, "n": 3 }]);
}

#[tokio::test]
async fn test_logging_runner_delegates() {
    let store = seeded().await;
    let events = store.collection("events");
    let runner = LoggingRunner::new(DirectRunner);

    let request = QueryRequest::new(&events, Query::Count { filter: doc! {} }).with_skip_cache(true);
    assert!(request.skip_cache);
    assert_eq!(request.collection_name(), events.name());

    let count = runner.run(request).await.unwrap().into_count().unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_logging_runner_passes_errors_through() {
    let store = seeded().await;
    let events = store.collection("events");
    let runner = LoggingRunner::new(DirectRunner);

    let request = QueryRequest::new(
        &events,
        Query::Aggregate {
            pipeline: vec![doc! { "$bucket": {} }],
        },
    );
    let err = runner.run(request).await.unwrap_err();

    assert!(matches!(err, Error::InvalidPipeline { .. }));
}

#[test]
fn test_output_mismatch() {
    let err = QueryOutput::Count(1).into_documents().unwrap_err();
    assert!(matches!(err, Error::UnexpectedOutput { expected: "documents" }));

    let err = QueryOutput::Documents(vec![]).into_count().unwrap_err();
    assert!(matches!(err, Error::UnexpectedOutput { expected: "count" }));
}

#[test]
fn test_query_serialization() {
    let query = Query::Count { filter: doc! { "a": 1 } };
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json, serde_json::json!({ "op": "count", "filter": { "a": 1 } }));
    assert_eq!(query.kind(), "count");
}
