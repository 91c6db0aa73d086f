//! Tests for sync module

use super::*;
use crate::api::mock::MockTransport;
use crate::api::{ApiError, ApiRequest};
use crate::sink::DuckDbSink;
use crate::types::Method;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;

fn text_frame(columns: &[&str], rows: &[&[&str]]) -> Frame {
    Frame::from_rows(
        columns.iter().copied(),
        rows.iter()
            .map(|r| r.iter().map(|v| Cell::text(*v)).collect())
            .collect(),
    )
    .unwrap()
}

/// Warehouse with courses, aliases, students and teachers already pulled
fn seeded_sink() -> Arc<DuckDbSink> {
    let sink = DuckDbSink::in_memory().unwrap();
    sink.insert_append(
        "GoogleClassroom_Courses",
        &text_frame(
            &["id", "name", "section", "courseState"],
            &[
                &["1", "Biology", "1", "ACTIVE"],
                &["2", "Math", "1", "ACTIVE"],
                &["3", "English", "2", "ACTIVE"],
                &["4", "Paleontology", "3", "ARCHIVED"],
                &["5", "Physics", "4", "ACTIVE"],
            ],
        ),
    )
    .unwrap();
    sink.insert_append(
        "GoogleClassroom_CourseAliases",
        &text_frame(
            &["courseId", "alias"],
            &[
                &["1", "d:123"],
                &["2", "d:234"],
                &["3", "d:345"],
                &["4", "d:456"],
                &["0", "d:111"],
            ],
        ),
    )
    .unwrap();
    sink.insert_append(
        "GoogleClassroom_Students",
        &text_frame(
            &["courseId", "userId", "fullName", "emailAddress"],
            &[
                &["1", "1", "User1", "1@a.com"],
                &["1", "2", "User2", "2@a.com"],
                &["2", "1", "User1", "1@a.com"],
                &["2", "3", "User3", "3@a.com"],
            ],
        ),
    )
    .unwrap();
    sink.insert_append(
        "GoogleClassroom_Teachers",
        &text_frame(
            &["courseId", "userId", "fullName", "emailAddress"],
            &[
                &["1", "91", "Teacher1", "t1@a.com"],
                &["1", "92", "Teacher2", "t2@a.com"],
                &["2", "91", "Teacher1", "t1@a.com"],
                &["2", "93", "Teacher3", "t3@a.com"],
            ],
        ),
    )
    .unwrap();
    Arc::new(sink)
}

fn desired_courses() -> Frame {
    text_frame(
        &["alias", "name", "section", "teacher_email"],
        &[
            &["123", "Biology", "1", "a@b.com"],
            &["234", "Math", "1", "a@b.com"],
            &["678", "History", "2", "a@b.com"],
            &["789", "Computer Science", "2", "a@b.com"],
        ],
    )
}

fn desired_roster(emails: [&str; 3]) -> Frame {
    text_frame(
        &["alias", "emailAddress"],
        &[
            &["123", emails[0]],
            &["234", emails[1]],
            &["345", emails[2]],
        ],
    )
}

fn ok_transport() -> Arc<MockTransport> {
    Arc::new(MockTransport::constant(json!({})))
}

fn engine(transport: Arc<MockTransport>, sink: Arc<DuckDbSink>) -> SyncEngine {
    SyncEngine::new(transport, sink).with_config(
        SyncConfig::new()
            .with_cooldown(Duration::ZERO)
            .with_debug(true),
    )
}

fn sorted_paths(requests: &[(String, ApiRequest)]) -> Vec<(Method, String)> {
    let mut paths: Vec<(Method, String)> = requests
        .iter()
        .map(|(_, r)| (r.method, r.path.clone()))
        .collect();
    paths.sort_by(|a, b| a.1.cmp(&b.1));
    paths
}

// ============================================================================
// CSV Input Tests
// ============================================================================

#[test]
fn test_parse_csv_text_and_nulls() {
    let data = "alias,name,section\n123, Biology ,1\n234,Math,\n";
    let frame = parse_csv(data.as_bytes()).unwrap();

    assert_eq!(frame.columns(), &["alias", "name", "section"]);
    assert_eq!(frame.len(), 2);
    assert_eq!(frame.get(0, "name"), Some(&Cell::text("Biology")));
    assert_eq!(frame.get(0, "alias"), Some(&Cell::text("123")));
    assert_eq!(frame.get(1, "section"), Some(&Cell::Null));
}

#[test]
fn test_parse_csv_ragged_row_fails() {
    let data = "alias,emailAddress\n123\n";
    assert!(matches!(parse_csv(data.as_bytes()), Err(Error::Csv(_))));
}

#[test]
fn test_read_csv_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = read_csv(&dir.path().join("courses.csv")).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

// ============================================================================
// Diff Tests
// ============================================================================

#[test]
fn test_course_diff() {
    let sync = engine(ok_transport(), seeded_sink());
    let diff = sync
        .diff(EntityKind::Courses, Some(desired_courses()))
        .unwrap();

    assert_eq!(
        diff.to_create,
        text_frame(
            &["alias", "name", "section", "teacher_email"],
            &[
                &["d:678", "History", "2", "a@b.com"],
                &["d:789", "Computer Science", "2", "a@b.com"],
            ],
        )
    );
    assert_eq!(
        diff.to_delete,
        text_frame(
            &["alias", "name", "section", "courseId"],
            &[&["d:345", "English", "2", "3"]],
        )
    );
    assert_eq!(diff.unchanged.len(), 2);
}

#[test]
fn test_student_diff() {
    let sync = engine(ok_transport(), seeded_sink());
    let diff = sync
        .diff(
            EntityKind::Students,
            Some(desired_roster(["1@a.com", "2@a.com", "1@a.com"])),
        )
        .unwrap();

    assert_eq!(
        diff.to_create,
        text_frame(
            &["alias", "emailAddress"],
            &[&["d:234", "2@a.com"], &["d:345", "1@a.com"]],
        )
    );
    assert_eq!(
        diff.to_delete,
        text_frame(
            &["alias", "emailAddress", "courseId", "userId", "fullName"],
            &[
                &["d:123", "2@a.com", "1", "2", "User2"],
                &["d:234", "1@a.com", "2", "1", "User1"],
                &["d:234", "3@a.com", "2", "3", "User3"],
            ],
        )
    );
}

#[test]
fn test_diff_without_pulled_tables_creates_everything() {
    let sync = engine(ok_transport(), Arc::new(DuckDbSink::in_memory().unwrap()));
    let diff = sync
        .diff(EntityKind::Courses, Some(desired_courses()))
        .unwrap();

    assert_eq!(diff.to_create.len(), 4);
    assert!(diff.to_delete.is_empty());
}

#[test]
fn test_diff_rejects_missing_columns() {
    let sync = engine(ok_transport(), seeded_sink());

    let no_alias = text_frame(&["emailAddress"], &[&["1@a.com"]]);
    let err = sync.diff(EntityKind::Students, Some(no_alias)).unwrap_err();
    assert!(matches!(err, Error::Sync { .. }));

    let no_email = text_frame(&["alias"], &[&["123"]]);
    let err = sync.diff(EntityKind::Students, Some(no_email)).unwrap_err();
    assert!(matches!(err, Error::Sync { .. }));
}

#[test]
fn test_diff_rejects_unsyncable_entity() {
    let sync = engine(ok_transport(), seeded_sink());
    let err = sync
        .diff(EntityKind::Topics, Some(desired_courses()))
        .unwrap_err();
    assert!(matches!(err, Error::Sync { .. }));
}

// ============================================================================
// Submission Tests
// ============================================================================

#[tokio::test]
async fn test_sync_courses_creates_and_archives() {
    let transport = ok_transport();
    let sync = engine(transport.clone(), seeded_sink());

    let diff = sync
        .sync(EntityKind::Courses, Some(desired_courses()))
        .await
        .unwrap();
    assert_eq!(diff.to_create.len(), 2);

    let requests = transport.requests();
    let mut ids: Vec<&str> = requests.iter().map(|(id, _)| id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["0", "1", "2"]);

    assert_eq!(
        sorted_paths(&requests),
        vec![
            (Method::POST, "courses".to_string()),
            (Method::POST, "courses".to_string()),
            (Method::PATCH, "courses/3".to_string()),
        ]
    );
    let archive = requests.iter().find(|(id, _)| id == "2").unwrap();
    assert_eq!(archive.1.query_value("updateMask"), Some("courseState"));
    assert_eq!(archive.1.body, Some(json!({"courseState": "ARCHIVED"})));

    let create = requests.iter().find(|(id, _)| id == "0").unwrap();
    assert_eq!(
        create.1.body,
        Some(json!({
            "id": "d:678",
            "name": "History",
            "section": "2",
            "ownerId": "a@b.com",
            "courseState": "ACTIVE"
        }))
    );
}

#[tokio::test]
async fn test_sync_students_adds_and_removes() {
    let transport = ok_transport();
    let sync = engine(transport.clone(), seeded_sink());

    sync.sync(
        EntityKind::Students,
        Some(desired_roster(["1@a.com", "2@a.com", "1@a.com"])),
    )
    .await
    .unwrap();

    assert_eq!(
        sorted_paths(&transport.requests()),
        vec![
            (Method::DELETE, "courses/1/students/2".to_string()),
            (Method::DELETE, "courses/2/students/1".to_string()),
            (Method::DELETE, "courses/2/students/3".to_string()),
            (Method::POST, "courses/d:234/students".to_string()),
            (Method::POST, "courses/d:345/students".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_sync_teachers_never_deletes() {
    let transport = ok_transport();
    let sync = engine(transport.clone(), seeded_sink());

    let diff = sync
        .diff(
            EntityKind::Teachers,
            Some(desired_roster(["t1@a.com", "t2@a.com", "t1@a.com"])),
        )
        .unwrap();
    assert_eq!(
        diff.to_delete,
        text_frame(
            &["alias", "emailAddress", "courseId", "userId", "fullName"],
            &[
                &["d:123", "t2@a.com", "1", "92", "Teacher2"],
                &["d:234", "t1@a.com", "2", "91", "Teacher1"],
                &["d:234", "t3@a.com", "2", "93", "Teacher3"],
            ],
        )
    );

    let stats = sync.submit(EntityKind::Teachers, &diff).await.unwrap();
    assert_eq!(stats.created, 2);
    assert_eq!(stats.deleted, 0);
    assert_eq!(stats.deletes_skipped, 3);
    assert!(transport
        .requests()
        .iter()
        .all(|(_, r)| r.method == Method::POST && r.path.ends_with("/teachers")));
}

#[tokio::test]
async fn test_sync_requeues_quota_and_internal_errors() {
    let transport = ok_transport();
    transport.fail_once("0", 429);
    transport.fail_once("2", 500);
    transport.fail_once("1", 403);
    let sync = engine(transport.clone(), seeded_sink());

    let diff = sync
        .diff(EntityKind::Courses, Some(desired_courses()))
        .unwrap();
    let stats = sync.submit(EntityKind::Courses, &diff).await.unwrap();

    assert_eq!(stats.requeued, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.created, 1);
    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.batches, 2);

    let mut resubmitted: Vec<String> = transport.batches()[1]
        .iter()
        .map(|(id, _)| id.clone())
        .collect();
    resubmitted.sort();
    assert_eq!(resubmitted, vec!["0", "2"]);
}

#[tokio::test(start_paused = true)]
async fn test_sync_cools_down_once_per_quota_batch() {
    let transport = ok_transport();
    transport.fail_once("0", 429);
    transport.fail_once("1", 429);
    let cooldown = Duration::from_secs(20);
    let sync = SyncEngine::new(transport.clone(), seeded_sink()).with_config(
        SyncConfig::new()
            .with_cooldown(cooldown)
            .with_debug(true),
    );
    let diff = sync
        .diff(EntityKind::Courses, Some(desired_courses()))
        .unwrap();

    let started = tokio::time::Instant::now();
    let stats = sync.submit(EntityKind::Courses, &diff).await.unwrap();

    // two quota failures in one batch pause once
    let elapsed = started.elapsed();
    assert!(elapsed >= cooldown && elapsed < cooldown * 2, "{elapsed:?}");
    assert_eq!(stats.requeued, 2);
    assert_eq!(stats.created, 2);
    assert_eq!(stats.batches, 2);

    let mut resubmitted: Vec<String> = transport.batches()[1]
        .iter()
        .map(|(id, _)| id.clone())
        .collect();
    resubmitted.sort();
    assert_eq!(resubmitted, vec!["0", "1"]);
}

#[tokio::test]
async fn test_sync_respects_batch_size() {
    let transport = ok_transport();
    let sync = SyncEngine::new(transport.clone(), seeded_sink()).with_config(
        SyncConfig::new()
            .with_batch_size(2)
            .with_cooldown(Duration::ZERO)
            .with_debug(true),
    );

    sync.sync(
        EntityKind::Students,
        Some(desired_roster(["1@a.com", "2@a.com", "1@a.com"])),
    )
    .await
    .unwrap();

    let sizes: Vec<usize> = transport.batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    let first: Vec<String> = transport.batches()[0]
        .iter()
        .map(|(id, _)| id.clone())
        .collect();
    assert_eq!(first, vec!["4", "3"]);
}

#[tokio::test]
async fn test_sync_batch_failure_propagates() {
    let transport = ok_transport();
    transport.fail_next_batch(Error::http_status(503, "unavailable"));
    let sync = engine(transport, seeded_sink());

    let result = sync
        .sync(EntityKind::Courses, Some(desired_courses()))
        .await;
    assert!(matches!(result, Err(Error::HttpStatus { status: 503, .. })));
}

#[tokio::test]
async fn test_sync_reads_desired_state_from_csv() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("students.csv"),
        "alias,emailAddress\n123,1@a.com\n234,2@a.com\n345,1@a.com\n",
    )
    .unwrap();

    let transport = Arc::new(MockTransport::new(|_, request| {
        if request.method == Method::DELETE {
            Err(ApiError::new(404, "not found"))
        } else {
            Ok(json!({}))
        }
    }));
    let sync = SyncEngine::new(transport.clone(), seeded_sink()).with_config(
        SyncConfig::new()
            .with_sync_dir(dir.path())
            .with_cooldown(Duration::ZERO)
            .with_debug(true),
    );
    assert_eq!(
        sync.sync_file(EntityKind::Students),
        dir.path().join("students.csv")
    );

    let diff = sync.sync(EntityKind::Students, None).await.unwrap();
    assert_eq!(diff.to_create.len(), 2);
    assert_eq!(diff.to_delete.len(), 3);
    assert_eq!(transport.requests().len(), 5);
}
