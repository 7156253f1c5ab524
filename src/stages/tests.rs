//! Tests for stage generators

use super::*;
use crate::error::Error;
use crate::pager::{GroupSpec, PopulatorSpec, RetainedTarget};
use crate::sort::sort_document;
use crate::types::SortOrder;
use bson::doc;
use pretty_assertions::assert_eq;

// ============================================================================
// Group Stage Tests
// ============================================================================

#[test]
fn test_group_single_field_descending() {
    let spec = GroupSpec::new(["g"]).with_sum("v", "total").with_count("count");
    let sort = sort_document("createdAt", SortOrder::Descending, false);

    let stages = group_stages(&spec, "createdAt", SortOrder::Descending, &sort);

    assert_eq!(
        stages,
        vec![doc! {
            "$group": {
                "_id": "$g",
                "createdAt": { "$first": "$createdAt" },
                "g": { "$first": "$g" },
                "total": { "$sum": "$v" },
                "count": { "$sum": 1 },
            }
        }]
    );
}

#[test]
fn test_group_ascending_uses_last() {
    let spec = GroupSpec::new(["g"]);
    let sort = sort_document("createdAt", SortOrder::Ascending, false);

    let stages = group_stages(&spec, "createdAt", SortOrder::Ascending, &sort);
    let group = stages[0].get_document("$group").unwrap();

    assert_eq!(
        group.get_document("createdAt").unwrap(),
        &doc! { "$last": "$createdAt" }
    );
}

#[test]
fn test_group_composite_key_and_projection() {
    let spec = GroupSpec::new(["_id", "country", "city"])
        .with_project_fields(["name", "city", "_id"]);
    let sort = sort_document("score", SortOrder::Descending, false);

    let stages = group_stages(&spec, "score", SortOrder::Descending, &sort);

    assert_eq!(
        stages,
        vec![doc! {
            "$group": {
                "_id": { "country": "$country", "city": "$city" },
                "score": { "$first": "$score" },
                "country": { "$first": "$country" },
                "city": { "$first": "$city" },
                "name": { "$first": "$name" },
            }
        }]
    );
}

#[test]
fn test_group_sort_before() {
    let spec = GroupSpec::new(["g"]).sort_before();
    let sort = sort_document("createdAt", SortOrder::Descending, true);

    let stages = group_stages(&spec, "createdAt", SortOrder::Descending, &sort);

    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0], doc! { "$sort": { "createdAt": -1, "_id": -1 } });
    assert!(stages[1].contains_key("$group"));
}

// ============================================================================
// Populate Stage Tests
// ============================================================================

#[test]
fn test_populate_join_only() {
    let populators = vec![
        PopulatorSpec::new("users", "userId"),
        PopulatorSpec::new("teams", "teamSlug")
            .with_foreign_field("slug")
            .with_alias("team"),
    ];

    let plan = populate_stages(&populators, "createdAt", "1").unwrap();

    assert!(!plan.replaces_root());
    assert_eq!(plan.cursor_field, None);
    assert_eq!(plan.read_fields, vec!["userId", "teamSlug"]);
    assert_eq!(
        plan.stages,
        vec![
            doc! { "$lookup": {
                "from": "users", "localField": "userId", "foreignField": "_id", "as": "users"
            } },
            doc! { "$lookup": {
                "from": "teams", "localField": "teamSlug", "foreignField": "slug", "as": "team"
            } },
        ]
    );
}

#[test]
fn test_populate_replace_root() {
    let populators = vec![PopulatorSpec::new("users", "userId")
        .with_alias("user")
        .retain("role", RetainedTarget::Keep(true))
        .retain("createdAt", RetainedTarget::Rename("joinedAt".into()))
        .retain("secret", RetainedTarget::Keep(false))];

    let plan = populate_stages(&populators, "createdAt", "42").unwrap();

    assert!(plan.replaces_root());
    assert_eq!(plan.cursor_field.as_deref(), Some("_createdAt_42"));
    assert_eq!(plan.read_fields, vec!["userId", "createdAt", "role"]);
    assert_eq!(
        plan.stages,
        vec![
            doc! { "$lookup": {
                "from": "users", "localField": "userId", "foreignField": "_id", "as": "user"
            } },
            doc! { "$set": {
                "user._userId_42": "$userId",
                "user._createdAt_42": "$createdAt",
                "user.joinedAt": "$createdAt",
                "user.role": "$role",
            } },
            doc! { "$match": { "user.0": { "$exists": true } } },
            doc! { "$replaceRoot": { "newRoot": { "$first": "$user" } } },
            doc! { "$match": { "$expr": { "$eq": ["$_id", "$_userId_42"] } } },
        ]
    );
}

#[test]
fn test_populate_stash_names_are_flat_for_nested_fields() {
    let populators = vec![PopulatorSpec::new("users", "owner.userId")
        .with_alias("user")
        .replace_root()];

    let plan = populate_stages(&populators, "meta.createdAt", "7").unwrap();

    assert_eq!(plan.cursor_field.as_deref(), Some("_meta_createdAt_7"));
    assert_eq!(
        plan.stages[1],
        doc! { "$set": {
            "user._owner_userId_7": "$owner.userId",
            "user._meta_createdAt_7": "$meta.createdAt",
        } }
    );
    assert_eq!(
        plan.stages[4],
        doc! { "$match": { "$expr": { "$eq": ["$_id", "$_owner_userId_7"] } } }
    );
}

#[test]
fn test_populate_rejects_second_root_replacement() {
    let populators = vec![
        PopulatorSpec::new("users", "userId").replace_root(),
        PopulatorSpec::new("orgs", "orgId").replace_root(),
    ];

    let err = populate_stages(&populators, "createdAt", "1").unwrap_err();
    assert!(matches!(err, Error::MultipleRootReplacements { count: 2 }));
}

#[test]
fn test_stash_suffix_is_numeric() {
    let suffix = stash_suffix();
    assert!(!suffix.is_empty());
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
}
