//! Shared helpers for API integration tests.
//!
//! Builds the real application router (same middleware stack as `main.rs`)
//! over an in-memory object store and a live worker pool, so tests exercise
//! the full request path including authentication and the extraction
//! pipeline.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use moondance_api::auth::jwt::{generate_access_token, JwtConfig};
use moondance_api::config::ServerConfig;
use moondance_api::router::build_app_router;
use moondance_api::state::AppState;
use moondance_core::types::DbId;
use moondance_pipeline::{ExtractionPipeline, PipelineConfig};
use moondance_storage::{MemoryObjectStore, ObjectStore};

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        presign_ttl_secs: 300,
        jwt: test_jwt_config(),
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret-long-enough-for-hmac".to_string(),
        access_token_expiry_mins: 60,
    }
}

/// Build the full application router over an in-memory object store.
/// Returns the store too, so tests can inspect or break it.
pub fn build_test_app(pool: PgPool) -> (Router, Arc<MemoryObjectStore>) {
    let config = test_config();
    let store = Arc::new(MemoryObjectStore::new());
    let dyn_store: Arc<dyn ObjectStore> = Arc::clone(&store) as Arc<dyn ObjectStore>;

    let pipeline = ExtractionPipeline::start(
        pool.clone(),
        Arc::clone(&dyn_store),
        PipelineConfig {
            workers: 2,
            backlog: 16,
            job_timeout: Duration::from_secs(5),
        },
        CancellationToken::new(),
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        store: dyn_store,
        pipeline,
    };

    (build_app_router(state, &config), store)
}

/// Mint a valid access token for the given user, signed with the test secret.
pub fn token_for(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &test_jwt_config())
        .expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Database fixtures
// ---------------------------------------------------------------------------

/// Insert a user with the given role and return its id.
pub async fn seed_user(pool: &PgPool, email: &str, role: &str) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO users (email, display_name, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(email)
    .bind(email.split('@').next().unwrap())
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert a course session row and return its id.
pub async fn seed_course_session(pool: &PgPool) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO course_sessions (course_code, term_label) \
         VALUES ('CS-201', 'Fall 2025') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send an unauthenticated GET request.
pub async fn get(app: Router, path: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send an authenticated request with an optional JSON body.
pub async fn send(
    app: Router,
    method: Method,
    path: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Parse a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Multipart upload helpers
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Build a `multipart/form-data` body with a `metadata` JSON part and a
/// `file` part. Returns `(content_type, body)`.
pub fn multipart_body(
    metadata: &serde_json::Value,
    file_name: &str,
    mime_type: &str,
    file_bytes: &[u8],
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"metadata\"\r\n\
             Content-Type: application/json\r\n\r\n\
             {metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {mime_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// POST a multipart note upload and return the response.
pub async fn upload_note(
    app: Router,
    token: &str,
    metadata: &serde_json::Value,
    file_name: &str,
    mime_type: &str,
    file_bytes: &[u8],
) -> Response<Body> {
    let (content_type, body) = multipart_body(metadata, file_name, mime_type, file_bytes);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/notes")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Upload a small PDF note and return its id. Panics on non-201.
pub async fn upload_basic_note(app: &Router, pool: &PgPool, token: &str) -> DbId {
    let session_id = seed_course_session(pool).await;
    let metadata = serde_json::json!({
        "title": "Graph algorithms, week 5",
        "note_type_id": 1,
        "course_session_id": session_id,
        "tags": ["algorithms"],
    });
    let response = upload_note(
        app.clone(),
        token,
        &metadata,
        "week5.pdf",
        "application/pdf",
        b"%PDF-1.4 (Dijkstra relaxes every edge)",
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
