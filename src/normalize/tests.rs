//! Tests for the normalizer

use super::*;
use crate::entity::EntityKind;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;

fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

fn ctx() -> EntityContext {
    EntityContext {
        today: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        school_year_start: ts(2023, 8, 1, 0, 0, 0),
        ..EntityContext::default()
    }
}

#[test]
fn test_parse_timestamp_formats() {
    assert_eq!(
        parse_timestamp("2024-01-15T10:30:00.123Z"),
        Some(
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_milli_opt(10, 30, 0, 123)
                .unwrap()
        )
    );
    assert_eq!(
        parse_timestamp("2024-01-15T10:30:00-05:00"),
        Some(ts(2024, 1, 15, 15, 30, 0))
    );
    assert_eq!(
        parse_timestamp("2024-01-15 10:30:00"),
        Some(ts(2024, 1, 15, 10, 30, 0))
    );
    assert_eq!(
        parse_timestamp("2024-01-15T10:30:00"),
        Some(ts(2024, 1, 15, 10, 30, 0))
    );
    assert_eq!(parse_timestamp("2024-01-15"), Some(ts(2024, 1, 15, 0, 0, 0)));
    assert_eq!(
        parse_timestamp("1970-01-01T00:00:00.00Z"),
        Some(ts(1970, 1, 1, 0, 0, 0))
    );
    assert_eq!(parse_timestamp("last tuesday"), None);
    assert_eq!(parse_timestamp("2024-13-01"), None);
}

#[test]
fn test_flatten_nested_objects() {
    let flat = flatten(&json!({
        "id": "1",
        "profile": {"name": {"fullName": "Ada"}, "emailAddress": "ada@a.com"},
        "tags": ["a", "b"],
        "empty": {}
    }))
    .unwrap();

    assert_eq!(flat.get("profile.name.fullName"), Some(&json!("Ada")));
    assert_eq!(flat.get("profile.emailAddress"), Some(&json!("ada@a.com")));
    assert_eq!(flat.get("tags"), Some(&json!(["a", "b"])));
    assert_eq!(flat.get("empty"), Some(&json!({})));
    assert!(flatten(&json!("scalar")).is_none());
}

#[test]
fn test_normalize_reindexes_to_schema() {
    let descriptor = EntityKind::Topics.descriptor();
    let frame = normalize(
        descriptor,
        vec![
            json!({"courseId": "1", "topicId": "t1", "name": "Unit 1", "updateTime": "2024-01-15T10:30:00Z", "extra": 5}),
            json!({"courseId": "1", "topicId": "t2"}),
        ],
        &ctx(),
    )
    .unwrap();

    assert_eq!(
        frame.columns(),
        &["courseId", "topicId", "name", "updateTime"]
    );
    assert_eq!(frame.len(), 2);
    assert_eq!(
        frame.get(0, "updateTime"),
        Some(&Cell::Timestamp(ts(2024, 1, 15, 10, 30, 0)))
    );
    assert_eq!(frame.get(1, "name"), Some(&Cell::Null));
    assert_eq!(frame.get(1, "updateTime"), Some(&Cell::Null));
}

#[test]
fn test_normalize_bad_date_fails_batch() {
    let descriptor = EntityKind::Topics.descriptor();
    let result = normalize(
        descriptor,
        vec![
            json!({"courseId": "1", "topicId": "t1", "updateTime": "2024-01-15T10:30:00Z"}),
            json!({"courseId": "1", "topicId": "t2", "updateTime": "not a date"}),
        ],
        &ctx(),
    );

    assert!(matches!(
        result,
        Err(Error::DateCoercion { ref column, .. }) if column == "updateTime"
    ));
}

#[test]
fn test_normalize_rejects_non_object_records() {
    let result = normalize(EntityKind::Topics.descriptor(), vec![json!(42)], &ctx());
    assert!(matches!(result, Err(Error::Normalize { .. })));
}

#[test]
fn test_normalize_applies_course_filter() {
    let frame = normalize(
        EntityKind::Courses.descriptor(),
        vec![
            json!({"id": "1", "name": "Biology", "updateTime": "2023-09-01T00:00:00Z"}),
            json!({"id": "2", "name": "Old", "updateTime": "2022-09-01T00:00:00Z"}),
            json!({"id": "3", "name": "Never updated"}),
        ],
        &ctx(),
    )
    .unwrap();

    assert_eq!(frame.len(), 1);
    assert_eq!(frame.get(0, "id"), Some(&Cell::text("1")));
}

#[test]
fn test_normalize_students_profile() {
    let frame = normalize(
        EntityKind::Students.descriptor(),
        vec![json!({
            "courseId": "1",
            "userId": "10",
            "profile": {
                "id": "10",
                "name": {"givenName": "Ada", "familyName": "Lovelace", "fullName": "Ada Lovelace"},
                "emailAddress": "ada@school.org"
            }
        })],
        &ctx(),
    )
    .unwrap();

    assert_eq!(
        frame.rows()[0],
        vec![
            Cell::text("1"),
            Cell::text("10"),
            Cell::text("Ada Lovelace"),
            Cell::text("ada@school.org"),
        ]
    );
}

#[test]
fn test_normalize_usage_dates() {
    let frame = normalize(
        EntityKind::StudentUsage.descriptor(),
        vec![json!({
            "entity": {"userEmail": "s@school.org"},
            "date": "2024-02-28",
            "parameters": [{"name": "classroom:last_interaction_time", "datetimeValue": "2024-02-28T14:00:00.000Z"}]
        })],
        &ctx(),
    )
    .unwrap();

    assert_eq!(
        frame.rows()[0],
        vec![
            Cell::text("s@school.org"),
            Cell::Timestamp(ts(2024, 2, 28, 0, 0, 0)),
            Cell::Timestamp(ts(2024, 2, 28, 14, 0, 0)),
            Cell::Timestamp(ts(2024, 3, 1, 0, 0, 0)),
        ]
    );
}
