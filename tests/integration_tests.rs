//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config → HTTP batches → DuckDB → sync → Parquet

use chrono::NaiveDate;
use classroom_sync::config::{AppConfig, AuthSettings};
use classroom_sync::driver::{Step, StepResult};
use classroom_sync::output::export_table;
use classroom_sync::partition::PartitionPlan;
use classroom_sync::{
    Cell, Driver, DuckDbSink, EntityKind, Frame, PullEngine, Sink, SyncEngine, WriteMode,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn config_for(server: &MockServer, dir: &TempDir) -> AppConfig {
    let mut config = AppConfig {
        db: dir.path().join("classroom.duckdb"),
        data_dir: dir.path().join("data"),
        sync_dir: dir.path().join("sync_files"),
        school_year_start: NaiveDate::from_ymd_opt(2024, 8, 1),
        cooldown_seconds: 0,
        debug: true,
        auth: AuthSettings::Bearer {
            token: "test-token".to_string(),
        },
        ..AppConfig::default()
    };
    config.http.base_url = Some(server.uri());
    config
}

fn text_frame(columns: &[&str], rows: &[&[&str]]) -> Frame {
    Frame::from_rows(
        columns.iter().copied(),
        rows.iter()
            .map(|row| row.iter().map(|v| Cell::text(*v)).collect())
            .collect(),
    )
    .unwrap()
}

fn engine(config: &AppConfig, sink: Arc<DuckDbSink>) -> PullEngine {
    PullEngine::new(Arc::new(config.transport().unwrap()), sink)
        .with_config(config.pull_config().unwrap())
        .with_context(config.entity_context())
}

// ============================================================================
// Pull Tests
// ============================================================================

#[tokio::test]
async fn test_pull_courses_follows_page_tokens() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Second page, matched before the catch-all first page
    Mock::given(method("GET"))
        .and(path("/classroom/courses"))
        .and(query_param("pageToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "courses": [{"id": "2", "name": "Math", "courseState": "ACTIVE",
                         "updateTime": "2024-09-02T00:00:00Z"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/classroom/courses"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "courses": [{"id": "1", "name": "Biology", "courseState": "ACTIVE",
                         "updateTime": "2024-09-01T00:00:00Z"}],
            "nextPageToken": "p2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server, &dir);
    let sink = Arc::new(DuckDbSink::open(&config.db).unwrap());
    let stats = engine(&config, sink.clone())
        .pull(
            EntityKind::Courses,
            &PartitionPlan::single(),
            WriteMode::Overwrite,
        )
        .await
        .unwrap();

    assert_eq!(stats.rows_written, 2);
    assert_eq!(stats.dropped, 0);

    let courses = sink.read_table("GoogleClassroom_Courses").unwrap().unwrap();
    let mut ids = courses.distinct_text("id");
    ids.sort();
    assert_eq!(ids, vec!["1".to_string(), "2".to_string()]);
    assert!(courses.has_column("calendarId"));
}

#[tokio::test]
async fn test_quota_response_is_requeued() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // First request hits the quota, second succeeds
    Mock::given(method("GET"))
        .and(path("/classroom/courses/1/students"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/classroom/courses/1/students"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "students": [{
                "courseId": "1",
                "userId": "s1",
                "profile": {"name": {"fullName": "Ada Lovelace"}, "emailAddress": "ada@x.org"}
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/classroom/courses/2/students"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let config = config_for(&server, &dir);
    let sink = Arc::new(DuckDbSink::open(&config.db).unwrap());
    let plan = PartitionPlan::single().with_courses(["1", "2"]);
    let stats = engine(&config, sink.clone())
        .pull(EntityKind::Students, &plan, WriteMode::Overwrite)
        .await
        .unwrap();

    assert_eq!(stats.requeued, 1);
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.rows_written, 1);

    let students = sink.read_table("GoogleClassroom_Students").unwrap().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(
        students.get(0, "emailAddress"),
        Some(&Cell::text("ada@x.org"))
    );
}

#[tokio::test]
async fn test_driver_pulls_courses_then_topics_and_exports() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/classroom/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "courses": [{"id": "7", "name": "Chemistry", "courseState": "ACTIVE",
                         "updateTime": "2024-09-01T00:00:00Z"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/classroom/courses/7/topics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "topic": [{"courseId": "7", "topicId": "t1", "name": "Atoms",
                       "updateTime": "2024-09-03T00:00:00Z"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, &dir);
    config.pull.courses = true;
    config.pull.topics = true;

    let sink = Arc::new(DuckDbSink::open(&config.db).unwrap());
    let transport = Arc::new(config.transport().unwrap());
    let summary = Driver::new(transport, sink.clone(), &config)
        .unwrap()
        .run()
        .await;

    assert!(summary.is_success(), "{summary:?}");
    match summary.result(Step::Pull(EntityKind::Topics)) {
        Some(StepResult::Pulled(stats)) => assert_eq!(stats.rows_written, 1),
        other => panic!("topics did not pull: {other:?}"),
    }

    let output = dir.path().join("topics.parquet");
    let rows = export_table(sink.as_ref(), "GoogleClassroom_Topics", &output, None).unwrap();
    assert_eq!(rows, 1);
    assert!(output.exists());
}

// ============================================================================
// Sync Tests
// ============================================================================

#[tokio::test]
async fn test_course_sync_creates_and_archives() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/classroom/courses"))
        .and(body_partial_json(json!({"id": "d:678", "name": "History"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "8"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/classroom/courses/3"))
        .and(query_param("updateMask", "courseState"))
        .and(body_partial_json(json!({"courseState": "ARCHIVED"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "3"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, &dir);
    config.sync.courses = true;

    let sink = Arc::new(DuckDbSink::open(&config.db).unwrap());
    sink.insert_append(
        "GoogleClassroom_Courses",
        &text_frame(
            &["id", "name", "section", "courseState"],
            &[
                &["1", "Biology", "1", "ACTIVE"],
                &["2", "Math", "1", "ACTIVE"],
                &["3", "English", "2", "ACTIVE"],
                &["4", "Paleontology", "3", "ARCHIVED"],
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
            ],
        ),
    )
    .unwrap();

    std::fs::create_dir_all(&config.sync_dir).unwrap();
    std::fs::write(
        config.sync_dir.join("courses.csv"),
        "alias,name,section,teacher_email\n\
         123,Biology,1,a@b.com\n\
         234,Math,1,a@b.com\n\
         678,History,2,a@b.com\n",
    )
    .unwrap();

    let transport = Arc::new(config.transport().unwrap());
    let summary = Driver::new(transport, sink, &config).unwrap().run().await;

    match summary.result(Step::Sync(EntityKind::Courses)) {
        Some(StepResult::Synced(stats)) => {
            assert_eq!(stats.created, 1);
            assert_eq!(stats.deleted, 1);
            assert_eq!(stats.failed, 0);
        }
        other => panic!("courses did not sync: {other:?}"),
    }
}

#[tokio::test]
async fn test_student_sync_counts_rejections() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/classroom/courses/d:123/students"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/classroom/courses/1/students/1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server, &dir);
    let sink = Arc::new(DuckDbSink::open(&config.db).unwrap());
    sink.insert_append(
        "GoogleClassroom_CourseAliases",
        &text_frame(&["courseId", "alias"], &[&["1", "d:123"]]),
    )
    .unwrap();
    sink.insert_append(
        "GoogleClassroom_Students",
        &text_frame(
            &["courseId", "userId", "fullName", "emailAddress"],
            &[&["1", "1", "User1", "1@a.com"]],
        ),
    )
    .unwrap();

    let desired = text_frame(&["alias", "emailAddress"], &[&["123", "2@a.com"]]);
    let sync = SyncEngine::new(Arc::new(config.transport().unwrap()), sink)
        .with_config(config.sync_config());
    let (diff, stats) = sync
        .run(EntityKind::Students, Some(desired))
        .await
        .unwrap();

    assert_eq!(diff.to_create.len(), 1);
    assert_eq!(diff.to_delete.len(), 1);
    assert_eq!(stats.created, 1);
    assert_eq!(stats.deleted, 0);
    assert_eq!(stats.failed, 1);
}
