//! Integration tests for the intervo-api REST surface
//!
//! The router is exercised in-process with `tower::ServiceExt::oneshot`
//! against an in-memory database. Outbound HTTP clients are configured with
//! unreachable endpoints; none of these tests depend on them responding.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use intervo_api::auth::token_digest;
use intervo_api::clients::{FsObjectStorage, HttpAiGateway, HttpSttTokenIssuer, HttpTtsService};
use intervo_api::config::Config;
use intervo_api::db;
use intervo_api::orchestrator::{NewInterviewParams, Orchestrator};
use intervo_api::rooms::{LocalBus, RoomRegistry};
use intervo_api::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;

const SECRET: &str = "test-secret";

async fn setup_state() -> (AppState, SqlitePool) {
    // One connection: every pooled connection to :memory: is a separate db
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();

    let mut config = Config::default();
    config.shared_secret = SECRET.to_string();
    config.storage_dir = std::env::temp_dir();

    let rooms = RoomRegistry::new(Arc::new(LocalBus::default()));
    let orchestrator = Arc::new(Orchestrator::new(
        pool.clone(),
        Arc::new(HttpAiGateway::new("http://127.0.0.1:1".to_string(), None)),
        Arc::new(FsObjectStorage::new(std::env::temp_dir(), "http://test/uploads".to_string())),
        Arc::new(HttpTtsService::new("http://127.0.0.1:1".to_string())),
        Arc::new(HttpSttTokenIssuer::new("http://127.0.0.1:1".to_string(), "key".to_string())),
        rooms.clone(),
    ));

    let state = AppState { config: Arc::new(config), rooms, orchestrator };
    (state, pool)
}

/// Create a user row plus a matching access_token cookie value
async fn setup_user(pool: &SqlitePool) -> (Uuid, String) {
    let digest_placeholder = Uuid::new_v4().to_string();
    let user = db::users::create_user(pool, "tester", &digest_placeholder).await.unwrap();
    let cookie = format!("access_token={}.{}", user.id, token_digest(user.id, SECRET));
    (user.id, cookie)
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn healthz_reports_ok_without_auth() {
    let (state, _pool) = setup_state().await;
    let app = build_router(state);

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "intervo-api");
}

#[tokio::test]
async fn get_interview_requires_access_token() {
    let (state, _pool) = setup_state().await;
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/interviews/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn get_interview_rejects_forged_token() {
    let (state, pool) = setup_state().await;
    let (user_id, _) = setup_user(&pool).await;
    let app = build_router(state);

    // Right user id, digest computed with the wrong secret
    let forged = format!("access_token={}.{}", user_id, token_digest(user_id, "other-secret"));
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/interviews/{}", Uuid::new_v4()))
                .header(header::COOKIE, forged)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn get_unknown_interview_is_404() {
    let (state, pool) = setup_state().await;
    let (_user_id, cookie) = setup_user(&pool).await;
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/interviews/{}", Uuid::new_v4()))
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn get_interview_is_owner_scoped() {
    let (state, pool) = setup_state().await;
    let (owner_id, _owner_cookie) = setup_user(&pool).await;

    let session = state
        .orchestrator
        .initialize_session(
            owner_id,
            NewInterviewParams {
                company: "Acme".to_string(),
                job_title: "Backend Engineer".to_string(),
                job_spec: "Rust".to_string(),
                ideal_talent: "Ownership".to_string(),
            },
        )
        .await
        .unwrap();

    let intruder = db::users::create_user(&pool, "intruder", "other-digest").await.unwrap();
    let intruder_cookie = format!(
        "access_token={}.{}",
        intruder.id,
        token_digest(intruder.id, SECRET)
    );

    let app = build_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/interviews/{}", session.id))
                .header(header::COOKIE, intruder_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn get_interview_returns_session_and_steps() {
    let (state, pool) = setup_state().await;
    let (user_id, cookie) = setup_user(&pool).await;

    let session = state
        .orchestrator
        .initialize_session(
            user_id,
            NewInterviewParams {
                company: "Acme".to_string(),
                job_title: "Backend Engineer".to_string(),
                job_spec: "Rust".to_string(),
                ideal_talent: "Ownership".to_string(),
            },
        )
        .await
        .unwrap();

    let app = build_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/interviews/{}", session.id))
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["session"]["title"], "Acme 1");
    assert_eq!(json["session"]["status"], "PENDING");
    assert!(json["steps"].as_array().unwrap().is_empty());
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            boundary, name, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    body
}

#[tokio::test]
async fn create_interview_returns_201_with_session_id() {
    let (state, pool) = setup_state().await;
    let (_user_id, cookie) = setup_user(&pool).await;
    let app = build_router(state);

    let boundary = "intervo-test-boundary";
    let body = multipart_body(
        boundary,
        &[
            ("company", "Acme"),
            ("jobTitle", "Backend Engineer"),
            ("jobSpec", "Rust, SQL"),
            ("idealTalent", "Ownership"),
        ],
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/interviews")
                .header(header::COOKIE, cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = extract_json(response.into_body()).await;
    let session_id = json["sessionId"].as_str().unwrap();
    assert!(Uuid::parse_str(session_id).is_ok());

    let session = db::sessions::load_session(&pool, Uuid::parse_str(session_id).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.title, "Acme 1");
}

#[tokio::test]
async fn create_interview_rejects_blank_fields() {
    let (state, pool) = setup_state().await;
    let (_user_id, cookie) = setup_user(&pool).await;
    let app = build_router(state);

    let boundary = "intervo-test-boundary";
    let body = multipart_body(boundary, &[("company", "Acme"), ("jobTitle", "  ")]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/interviews")
                .header(header::COOKIE, cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}
