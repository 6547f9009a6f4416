//! Integration tests for clustermapd
//!
//! These tests drive the HTTP surface in-process.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use clustermap_api::{LocationRecord, SessionType, SourceFact, SourceKind};
use clustermap_config::{parse_config, Settings};
use clustermap_core::{PresenceEngine, PresenceSources, Reconciler, ResultCache};
use clustermap_oracle::{StaticOracle, EXAM_MODE_HOSTS_PATH};
use clustermap_store::StaticSource;
use clustermap_util::{Hostname, ManualClock};
use clustermapd::{build_engine, create_router, AppState, Overrides};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn host(name: &str) -> Hostname {
    Hostname::normalize(name, None).unwrap()
}

struct Harness {
    seats: Arc<StaticSource>,
    hosts: Arc<StaticSource>,
    oracle: Arc<StaticOracle>,
    clock: Arc<ManualClock>,
    router: Router,
}

fn harness(base_path: &str) -> Harness {
    let seats = Arc::new(StaticSource::empty(SourceKind::SeatSessions));
    let exams = Arc::new(StaticSource::empty(SourceKind::ExamSessions));
    let hosts = Arc::new(StaticSource::empty(SourceKind::HostHealth));
    let oracle = Arc::new(StaticOracle::default());
    let clock = Arc::new(ManualClock::new());

    let engine = PresenceEngine::new(
        PresenceSources {
            seats: seats.clone(),
            exams,
            hosts: hosts.clone(),
        },
        oracle.clone(),
        Reconciler::default(),
        ResultCache::new(clock.clone()),
        Duration::from_secs(5),
    );

    Harness {
        seats,
        hosts,
        oracle,
        clock,
        router: create_router(AppState::new(engine), base_path),
    }
}

async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ORIGIN, "https://map.example")
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn test_active_answers_get_and_post() {
    let h = harness("");
    h.seats.set_facts(vec![SourceFact::seat("abc", host("h1"))]);

    for method in [Method::GET, Method::POST] {
        let (status, headers, body) = send(&h.router, method, "/api/active").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let records: Vec<LocationRecord> = serde_json::from_slice(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].login.as_deref(), Some("abc"));
    }
}

#[tokio::test]
async fn test_active_answers_head_without_body() {
    let h = harness("");
    let (status, _, body) = send(&h.router, Method::HEAD, "/api/active").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_other_methods_are_rejected_before_aggregation() {
    let h = harness("");

    for method in [Method::PUT, Method::DELETE, Method::PATCH] {
        let (status, _, _) = send(&h.router, method, "/api/active").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
    assert_eq!(h.seats.fetch_count(), 0);
    assert_eq!(h.oracle.fetch_count(), 0);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let h = harness("");
    let (_, headers, _) = send(&h.router, Method::GET, "/api/active").await;
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/active")
        .header(header::ORIGIN, "https://map.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = h.router.clone().oneshot(preflight).await.unwrap();
    let allowed = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    for method in ["GET", "HEAD", "POST"] {
        assert!(allowed.contains(method), "{method} missing from {allowed}");
    }
}

#[tokio::test]
async fn test_responses_are_cached_within_ttl() {
    let h = harness("");
    h.seats.set_facts(vec![SourceFact::seat("abc", host("h1"))]);

    let (_, _, first) = send(&h.router, Method::GET, "/api/active").await;
    h.seats.set_facts(vec![SourceFact::seat("def", host("h2"))]);
    h.clock.advance(Duration::from_secs(2));
    let (_, _, second) = send(&h.router, Method::POST, "/api/active").await;
    assert_eq!(first, second);
    assert_eq!(h.seats.fetch_count(), 1);

    h.clock.advance(Duration::from_secs(5));
    let (_, _, third) = send(&h.router, Method::GET, "/api/active").await;
    assert_ne!(first, third);
    assert_eq!(h.seats.fetch_count(), 2);
}

#[tokio::test]
async fn test_source_failure_returns_500() {
    let h = harness("");
    h.hosts.set_failing(true);

    let (status, _, body) = send(&h.router, Method::GET, "/api/active").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("host_health"));
}

#[tokio::test]
async fn test_images_not_implemented() {
    let h = harness("");
    let (status, _, body) = send(&h.router, Method::GET, "/api/images").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "error": "Not Implemented" }));
}

#[tokio::test]
async fn test_health_reports_sources() {
    let h = harness("");
    let (status, _, body) = send(&h.router, Method::GET, "/api/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sources"].as_array().unwrap().len(), 3);

    h.hosts.set_failing(true);
    let (_, _, body) = send(&h.router, Method::GET, "/api/health").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "degraded");
}

#[tokio::test]
async fn test_routes_honor_base_path() {
    let h = harness("/clustermap");

    let (status, _, _) = send(&h.router, Method::GET, "/clustermap/api/active").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&h.router, Method::GET, "/api/active").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn create_cluster_db(path: &Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE location (login TEXT NOT NULL, hostname TEXT, end_at TEXT);
        CREATE TABLE workstation (hostname TEXT PRIMARY KEY, alive INTEGER, active INTEGER);

        INSERT INTO location (login, hostname, end_at) VALUES ('abc', 'f1r1s1', NULL);
        INSERT INTO location (login, hostname, end_at) VALUES ('old', 'f1r1s2', '2024-01-01');
        INSERT INTO workstation (hostname, alive, active) VALUES ('f1r1s1.codam.nl', 0, 1);
        INSERT INTO workstation (hostname, alive, active) VALUES ('f1r9s9.codam.nl', 0, 0);
        "#,
    )
    .unwrap();
}

fn create_exam_db(path: &Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE "user" (id INTEGER PRIMARY KEY, username TEXT NOT NULL);
        CREATE TABLE exam_session (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            state TEXT NOT NULL,
            last_known_ip TEXT,
            last_known_hostname TEXT
        );

        INSERT INTO "user" (id, username) VALUES (1, 'alice'), (2, 'bob');
        INSERT INTO exam_session (user_id, state, last_known_ip, last_known_hostname)
            VALUES (1, 'in_progress', '10.12.3.4', NULL);
        INSERT INTO exam_session (user_id, state, last_known_ip, last_known_hostname)
            VALUES (2, 'finished', '10.12.5.6', NULL);
        "#,
    )
    .unwrap();
}

/// Serve a fixed exam-mode payload on a local port, returning its base URL
async fn serve_oracle(payload: &'static str) -> String {
    let router = Router::new().route(
        EXAM_MODE_HOSTS_PATH,
        axum::routing::get(move || async move { payload }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_end_to_end_with_sqlite_stores() {
    let dir = tempfile::tempdir().unwrap();
    let cluster_db = dir.path().join("cluster.db");
    let exam_db = dir.path().join("exam.db");
    create_cluster_db(&cluster_db);
    create_exam_db(&exam_db);

    let mut settings = Settings::default();
    settings.sources.cluster_db = cluster_db;
    settings.sources.exam_db = exam_db;
    settings.oracle.base_url = None;

    let engine = build_engine(&settings).unwrap();
    let router = create_router(AppState::new(engine), "");

    let (status, _, body) = send(&router, Method::GET, "/api/active").await;
    assert_eq!(status, StatusCode::OK);

    let mut records: Vec<LocationRecord> = serde_json::from_slice(&body).unwrap();
    records.sort_by(|a, b| a.hostname.cmp(&b.hostname));

    assert_eq!(
        records,
        vec![
            LocationRecord {
                login: Some("abc".into()),
                hostname: host("f1r1s1.codam.nl"),
                session_type: SessionType::Dead,
                alive: false,
            },
            LocationRecord {
                login: Some("alice".into()),
                hostname: host("f2r3s4.codam.nl"),
                session_type: SessionType::Exam,
                alive: true,
            },
        ]
    );

    let (_, _, body) = send(&router, Method::GET, "/api/health").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["oracle_enabled"], false);
}

#[tokio::test]
async fn test_default_config_merges_sources_by_qualified_hostname() {
    let dir = tempfile::tempdir().unwrap();
    let cluster_db = dir.path().join("cluster.db");
    let exam_db = dir.path().join("exam.db");

    let conn = rusqlite::Connection::open(&cluster_db).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE location (login TEXT NOT NULL, hostname TEXT, end_at TEXT);
        CREATE TABLE workstation (hostname TEXT PRIMARY KEY, alive INTEGER, active INTEGER);

        INSERT INTO location (login, hostname, end_at) VALUES ('abc', 'f2r3s4.codam.nl', NULL);
        INSERT INTO location (login, hostname, end_at) VALUES ('def', 'f1r1s1.codam.nl', NULL);
        "#,
    )
    .unwrap();
    create_exam_db(&exam_db);

    let mut settings = parse_config("config_version = 1").unwrap();
    Overrides {
        cluster_db: Some(cluster_db),
        exam_db: Some(exam_db),
        oracle_url: Some(serve_oracle(r#"{"exam_mode_hosts": ["f1r1s1"]}"#).await),
        ..Default::default()
    }
    .apply(&mut settings)
    .unwrap();

    let router = create_router(AppState::new(build_engine(&settings).unwrap()), "");
    let (status, _, body) = send(&router, Method::GET, "/api/active").await;
    assert_eq!(status, StatusCode::OK);

    let mut records: Vec<LocationRecord> = serde_json::from_slice(&body).unwrap();
    records.sort_by(|a, b| a.hostname.cmp(&b.hostname));

    // The exam session derived from 10.12.3.4 lands on the seat's workstation,
    // and the short oracle hostname overlays the other seat.
    assert_eq!(
        records,
        vec![
            LocationRecord {
                login: Some("def".into()),
                hostname: host("f1r1s1.codam.nl"),
                session_type: SessionType::Exam,
                alive: true,
            },
            LocationRecord {
                login: Some("abc".into()),
                hostname: host("f2r3s4.codam.nl"),
                session_type: SessionType::Normal,
                alive: true,
            },
        ]
    );
}
