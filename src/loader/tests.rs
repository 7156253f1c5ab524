//! Tests for the loader module

use super::*;
use crate::cursor::CursorToken;
use crate::error::Error;
use crate::pager::{PopulateMode, RetainedTarget};
use crate::types::{LimitValue, SortOrder};
use bson::Bson;
use std::io::Write;
use tempfile::NamedTempFile;

// ============================================================================
// Request Loading Tests
// ============================================================================

#[test]
fn test_load_minimal_request() {
    let yaml = r#"
pager:
  field: createdAt
"#;

    let request = load_request_from_str(yaml).unwrap();
    assert_eq!(request.pager.field, "createdAt");
    assert_eq!(request.pager.limit, None);
    assert_eq!(request.pager.resolved_order(), SortOrder::Descending);
    assert!(request.filter.is_empty());
    assert!(request.populators.is_empty());
    assert!(!request.secondary_sort_on_id);
}

#[test]
fn test_load_full_request() {
    let yaml = r#"
filter:
  status: open
  ownerId: 65a1f0c2e4b0a1b2c3d4e5f6
  score: { $gte: 10 }
pager:
  field: score
  limit: "25"
  sort_ascending: true
  from: '{"score": 40}'
  group_by:
    fields: [teamId]
    sort_before_group: true
    count_as: members
    field_sum_map:
      score: totalScore
populators:
  - from: users
    local_field: userId
    alias: user
    mode:
      type: replace_root
      retained_fields:
        role: true
        createdAt: joinedAt
        secret: false
  - from: teams
    local_field: teamId
post_filter:
  active: true
secondary_sort_on_id: true
skip_cache: true
"#;

    let request = load_request_from_str(yaml).unwrap();

    assert_eq!(request.filter.get_str("status").unwrap(), "open");
    assert_eq!(request.pager.limit, Some(LimitValue::Text("25".into())));
    assert_eq!(request.pager.resolved_order(), SortOrder::Ascending);
    assert_eq!(
        request.pager.from,
        Some(CursorToken::Text(r#"{"score": 40}"#.into()))
    );

    let group = request.pager.group_by.as_ref().unwrap();
    assert_eq!(group.fields, vec!["teamId"]);
    assert!(group.sort_before_group);
    assert_eq!(group.count_as.as_deref(), Some("members"));
    assert_eq!(group.field_sum_map.get("score").map(String::as_str), Some("totalScore"));

    assert_eq!(request.populators.len(), 2);
    let PopulateMode::ReplaceRoot { retained_fields } = &request.populators[0].mode else {
        panic!("expected root replacement");
    };
    assert_eq!(retained_fields.get("role"), Some(&RetainedTarget::Keep(true)));
    assert_eq!(
        retained_fields.get("createdAt"),
        Some(&RetainedTarget::Rename("joinedAt".into()))
    );
    assert_eq!(retained_fields.get("secret"), Some(&RetainedTarget::Keep(false)));
    assert_eq!(request.populators[1].mode, PopulateMode::Join);
    assert_eq!(request.populators[1].alias(), "teams");

    assert!(request.post_filter.is_some());
    assert!(request.secondary_sort_on_id);
    assert!(request.skip_cache);
}

#[test]
fn test_native_cursor_document() {
    let yaml = r#"
pager:
  field: _id
  from:
    _id: { $oid: 65a1f0c2e4b0a1b2c3d4e5f6 }
"#;

    let request = load_request_from_str(yaml).unwrap();
    let Some(CursorToken::Document(cursor)) = &request.pager.from else {
        panic!("expected a document cursor");
    };
    assert!(matches!(cursor.get("_id"), Some(Bson::ObjectId(_))));
}

#[test]
fn test_reject_empty_pager_field() {
    let err = load_request_from_str("pager: { field: '' }").unwrap_err();
    assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[test]
fn test_reject_two_root_replacements() {
    let yaml = r#"
pager: { field: createdAt }
populators:
  - { from: users, local_field: userId, mode: { type: replace_root } }
  - { from: orgs, local_field: orgId, mode: { type: replace_root } }
"#;

    let err = load_request_from_str(yaml).unwrap_err();
    assert!(matches!(err, Error::MultipleRootReplacements { count: 2 }));
}

#[test]
fn test_reject_group_without_fields() {
    let yaml = r#"
pager:
  field: createdAt
  group_by: { fields: [_id] }
"#;

    let err = load_request_from_str(yaml).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[test]
fn test_reject_malformed_yaml() {
    let err = load_request_from_str("pager: [").unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

// ============================================================================
// File Loading Tests
// ============================================================================

#[test]
fn test_load_request_from_json_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"pager": {{"field": "n", "limit": 3}}}}"#).unwrap();

    let request = load_request(file.path()).unwrap();
    assert_eq!(request.pager.field, "n");
    assert_eq!(request.pager.limit, Some(LimitValue::Number(3)));
}

#[test]
fn test_load_request_from_yaml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "pager:\n  field: n\n  sort_order: 1").unwrap();

    let request = load_request(file.path()).unwrap();
    assert_eq!(request.pager.resolved_order(), SortOrder::Ascending);
}

#[test]
fn test_loose_limits_fall_back_instead_of_failing() {
    let config = crate::config::PagerConfig::new();

    let request = load_request_from_str("pager:\n  field: n\n  limit: 12.5\n").unwrap();
    assert_eq!(request.pager.limit, Some(LimitValue::Number(12)));

    let request = load_request_from_str("pager:\n  field: n\n  limit: \"12abc\"\n").unwrap();
    assert_eq!(config.effective_limit(request.pager.limit.as_ref()), 12);

    let request = load_request_from_str("pager:\n  field: n\n  limit: true\n").unwrap();
    assert_eq!(request.pager.limit, None);
    assert_eq!(config.effective_limit(request.pager.limit.as_ref()), 10);
}

#[test]
fn test_load_missing_file() {
    let err = load_request("/nonexistent/request.yaml").unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_load_document_list() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"[{{"_id": 1, "n": 1}}, {{"_id": 2, "n": 2}}]"#).unwrap();

    let collections = load_documents(file.path(), "rows").unwrap();
    assert_eq!(collections.len(), 1);
    assert_eq!(collections["rows"].len(), 2);
}

#[test]
fn test_load_named_collections() {
    let yaml = r#"
users:
  - { _id: { $oid: 65a1f0c2e4b0a1b2c3d4e5f6 }, name: Ada }
posts:
  - { title: first }
  - { title: second }
"#;

    let collections = load_documents_from_str(yaml, "ignored").unwrap();
    assert_eq!(
        collections.keys().collect::<Vec<_>>(),
        vec!["posts", "users"]
    );
    assert!(matches!(
        collections["users"][0].get("_id"),
        Some(Bson::ObjectId(_))
    ));
}
