//! Tests for pipeline assembly

use super::*;
use crate::config::PagerConfig;
use crate::cursor::CursorToken;
use crate::error::Error;
use crate::executor::Query;
use crate::pager::{GroupSpec, PageRequest, PopulatorSpec, RetainedTarget};
use crate::types::SortOrder;
use bson::oid::ObjectId;
use bson::{doc, Bson};
use pretty_assertions::assert_eq;

const OWNER: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

fn build(request: &PageRequest) -> PipelinePlan {
    PipelineBuilder::new(request, &PagerConfig::default())
        .with_stash_suffix("7")
        .build()
        .unwrap()
}

#[test]
fn test_first_page_plan() {
    let request = PageRequest::new("createdAt")
        .with_filter(doc! { "ownerId": OWNER, "status": "open" })
        .with_limit(5);

    let plan = build(&request);
    let owner = ObjectId::parse_str(OWNER).unwrap();

    assert_eq!(plan.filter, doc! { "ownerId": owner, "status": "open" });
    assert_eq!(plan.count_filter, Some(plan.filter.clone()));
    assert_eq!(plan.limit, 5);
    assert_eq!(plan.sort_order, SortOrder::Descending);
    assert_eq!(plan.cursor_field, "createdAt");
    assert!(!plan.uses_stash());
    assert_eq!(
        plan.stages,
        vec![
            doc! { "$match": { "ownerId": owner, "status": "open" } },
            doc! { "$sort": { "createdAt": -1 } },
            doc! { "$limit": 6_i64 },
        ]
    );

    // the caller's filter is not cast
    assert_eq!(request.filter.get_str("ownerId").unwrap(), OWNER);
}

#[test]
fn test_cursor_page_skips_count() {
    let request = PageRequest::new("score")
        .with_filter(doc! { "score": { "$gte": 0 } })
        .with_cursor(CursorToken::from(doc! { "score": 40 }))
        .with_sort_order(SortOrder::Ascending)
        .with_secondary_sort_on_id(true);

    let plan = build(&request);

    assert_eq!(plan.count_filter, None);
    assert!(plan.count_query().is_none());
    assert_eq!(plan.filter, doc! { "score": { "$lt": 40 } });
    assert_eq!(plan.sort, doc! { "score": 1, "_id": 1 });
    assert_eq!(plan.limit, 10);
    assert_eq!(plan.fetch_limit(), 11);
}

#[test]
fn test_cursor_without_field_value_still_skips_count() {
    let request = PageRequest::new("score").with_cursor(CursorToken::from(doc! { "other": 1 }));

    let plan = build(&request);

    assert_eq!(plan.count_filter, None);
    assert_eq!(plan.filter, doc! {});
}

#[test]
fn test_text_cursor_is_classified() {
    let request = PageRequest::new("createdAt").with_cursor(r#"{"createdAt":"2024-03-01T10:00:00.000Z"}"#);

    let plan = build(&request);
    let predicate = plan.filter.get_document("createdAt").unwrap();

    assert!(matches!(predicate.get("$lt"), Some(Bson::DateTime(_))));
}

#[test]
fn test_group_plan_order() {
    let request = PageRequest::new("createdAt")
        .with_group(GroupSpec::new(["g"]).with_sum("v", "total").sort_before())
        .with_limit("3");

    let plan = build(&request);
    let names: Vec<&str> = plan
        .stages
        .iter()
        .filter_map(|stage| stage.keys().next().map(String::as_str))
        .collect();

    assert_eq!(names, vec!["$match", "$sort", "$group", "$sort", "$limit"]);
    assert_eq!(plan.stages[4], doc! { "$limit": 4_i64 });
}

#[test]
fn test_root_replacement_plan() {
    let request = PageRequest::new("createdAt")
        .with_group(GroupSpec::new(["teamId"]).with_sum("points", "total"))
        .with_populator(
            PopulatorSpec::new("users", "userId")
                .with_alias("user")
                .retain("role", RetainedTarget::Keep(true)),
        )
        .with_post_filter(doc! { "active": true });

    let plan = build(&request);

    assert_eq!(plan.cursor_field, "_createdAt_7");
    assert!(plan.uses_stash());
    assert_eq!(
        plan.stages[1],
        doc! { "$project": {
            "_id": 1, "createdAt": 1, "userId": 1, "role": 1, "teamId": 1, "points": 1,
        } }
    );
    assert_eq!(plan.stages.last(), Some(&doc! { "$match": { "active": true } }));

    let names: Vec<&str> = plan
        .stages
        .iter()
        .filter_map(|stage| stage.keys().next().map(String::as_str))
        .collect();
    assert_eq!(
        names,
        vec![
            "$match", "$project", "$group", "$sort", "$limit", "$lookup", "$set", "$match",
            "$replaceRoot", "$match", "$match",
        ]
    );
}

#[test]
fn test_join_only_has_no_projection() {
    let request = PageRequest::new("createdAt").with_populator(PopulatorSpec::new("users", "userId"));

    let plan = build(&request);

    assert!(!plan.stages.iter().any(|stage| stage.contains_key("$project")));
    assert_eq!(plan.cursor_field, "createdAt");
}

#[test]
fn test_max_limit_clamps() {
    let request = PageRequest::new("createdAt").with_limit(500);
    let config = PagerConfig::default().with_max_limit(Some(50));

    let plan = PipelineBuilder::new(&request, &config).build().unwrap();

    assert_eq!(plan.limit, 50);
}

#[test]
fn test_invalid_request_is_rejected() {
    let request = PageRequest::new("  ");
    let err = PipelineBuilder::new(&request, &PagerConfig::default())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest { .. }));

    let request = PageRequest::new("createdAt")
        .with_populator(PopulatorSpec::new("a", "aId").replace_root())
        .with_populator(PopulatorSpec::new("b", "bId").replace_root());
    let err = PipelineBuilder::new(&request, &PagerConfig::default())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::MultipleRootReplacements { count: 2 }));
}

#[test]
fn test_queries() {
    let plan = build(&PageRequest::new("createdAt"));

    assert_eq!(plan.count_query(), Some(Query::Count { filter: doc! {} }));
    assert_eq!(
        plan.aggregate_query(),
        Query::Aggregate {
            pipeline: plan.stages.clone()
        }
    );
}
