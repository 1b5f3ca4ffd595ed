use std::sync::Arc;

use axum::http::StatusCode;
use devdash_core::config::{AiConfig, BuildConfig, Config};
use devdash_core::store::FileProjectStore;
use devdash_server::{build_router, AppState};
use gemini_agent::GeminiClient;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config() -> Config {
    Config {
        ai: AiConfig {
            api_key_env: "DEVDASH_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// State over a file store in `dir`, with no AI configured.
fn state(dir: &TempDir) -> AppState {
    let store = Arc::new(FileProjectStore::new(dir.path().join("projects.json")));
    AppState::new(dir.path().to_path_buf(), config(), store)
}

fn app(dir: &TempDir) -> axum::Router {
    build_router(state(dir))
}

fn app_with_gemini(dir: &TempDir, server: &mockito::ServerGuard) -> axum::Router {
    let client = GeminiClient::builder()
        .api_key("test-key")
        .base_url(server.url())
        .build()
        .unwrap();
    build_router(state(dir).with_ai(Some(client)))
}

fn app_with_build(dir: &TempDir, script: &str) -> axum::Router {
    let mut cfg = config();
    cfg.build = BuildConfig {
        command: vec!["sh".into(), "-c".into(), script.into()],
        timeout_secs: 10,
    };
    let store = Arc::new(FileProjectStore::new(dir.path().join("projects.json")));
    build_router(AppState::new(dir.path().to_path_buf(), cfg, store))
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&b).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send `body` verbatim with no content-type header.
async fn send_raw(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: &'static str,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::from(body))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn put_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, Some(body)).await
}

async fn delete(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, None).await
}

async fn create(dir: &TempDir, name: &str) -> serde_json::Value {
    let (status, body) = post_json(app(dir), "/api/projects", serde_json::json!({ "name": name })).await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

fn gemini_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_is_empty_without_store_file() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(app(&dir), "/api/projects").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn create_returns_fresh_planning_project() {
    let dir = TempDir::new().unwrap();
    let body = create(&dir, "Alpha").await;
    assert_eq!(body["name"], "Alpha");
    assert_eq!(body["status"], "Planning");
    assert_eq!(body["chatHistory"], serde_json::json!([]));
    assert_eq!(body["logs"], serde_json::json!([]));
    assert!(body["id"].as_str().unwrap().starts_with("proj-"));
}

#[tokio::test]
async fn create_rejects_blank_or_missing_name() {
    let dir = TempDir::new().unwrap();
    for body in [
        serde_json::json!({ "name": "" }),
        serde_json::json!({ "name": "   " }),
        serde_json::json!({}),
    ] {
        let (status, err) = post_json(app(&dir), "/api/projects", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].as_str().unwrap().contains("name"));
    }
    let (_, list) = get(app(&dir), "/api/projects").await;
    assert_eq!(list, serde_json::json!([]));
}

#[tokio::test]
async fn create_without_body_is_missing_name() {
    let dir = TempDir::new().unwrap();
    let (status, err) = send_raw(app(&dir), "POST", "/api/projects", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn malformed_json_is_bad_request_with_error_body() {
    let dir = TempDir::new().unwrap();
    let id = create(&dir, "Alpha").await["id"].as_str().unwrap().to_string();
    let uri = format!("/api/projects/{id}");
    for (method, path) in [("POST", "/api/projects"), ("PUT", uri.as_str()), ("POST", "/api/ai")] {
        let (status, err) = send_raw(app(&dir), method, path, "{bad").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {path}");
        assert!(err["error"].as_str().unwrap().contains("invalid JSON body"));
    }
    let (_, list) = get(app(&dir), "/api/projects").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn list_returns_every_created_project() {
    let dir = TempDir::new().unwrap();
    for name in ["Alpha", "Beta", "Gamma"] {
        create(&dir, name).await;
    }
    let (status, list) = get(app(&dir), "/api/projects").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
}

#[tokio::test]
async fn update_status_changes_only_status() {
    let dir = TempDir::new().unwrap();
    let created = create(&dir, "Alpha").await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = put_json(
        app(&dir),
        &format!("/api/projects/{id}"),
        serde_json::json!({ "status": "Completed" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Completed");

    let (_, fetched) = get(app(&dir), &format!("/api/projects/{id}")).await;
    let mut expected = created.clone();
    expected["status"] = "Completed".into();
    assert_eq!(fetched, expected);
}

#[tokio::test]
async fn update_replaces_supplied_sequences() {
    let dir = TempDir::new().unwrap();
    let created = create(&dir, "Alpha").await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = put_json(
        app(&dir),
        &format!("/api/projects/{id}"),
        serde_json::json!({
            "id": "proj-ignored",
            "logs": ["[INFO] one"],
            "chatHistory": [{ "id": 1, "sender": "user", "text": "hi" }],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id);
    assert_eq!(updated["logs"], serde_json::json!(["[INFO] one"]));
    assert_eq!(updated["chatHistory"][0]["sender"], "user");
    assert_eq!(updated["status"], "Planning");
}

#[tokio::test]
async fn update_rejects_unknown_status() {
    let dir = TempDir::new().unwrap();
    let created = create(&dir, "Alpha").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = put_json(
        app(&dir),
        &format!("/api/projects/{id}"),
        serde_json::json!({ "status": "Shipped" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Shipped"));

    let (_, fetched) = get(app(&dir), &format!("/api/projects/{id}")).await;
    assert_eq!(fetched["status"], "Planning");
}

#[tokio::test]
async fn unknown_id_is_404_everywhere() {
    let dir = TempDir::new().unwrap();
    create(&dir, "Alpha").await;

    let (status, body) = get(app(&dir), "/api/projects/proj-missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("proj-missing"));

    let (status, _) = put_json(
        app(&dir),
        "/api/projects/proj-missing",
        serde_json::json!({ "status": "Testing" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = delete(app(&dir), "/api/projects/proj-missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_project() {
    let dir = TempDir::new().unwrap();
    let created = create(&dir, "Alpha").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = delete(app(&dir), &format!("/api/projects/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "deleted": id }));

    let (status, _) = get(app(&dir), &format!("/api/projects/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// AI
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ai_requires_prompt() {
    let dir = TempDir::new().unwrap();
    let (status, body) = post_json(app(&dir), "/api/ai", serde_json::json!({ "prompt": " " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "prompt is required");
}

#[tokio::test]
async fn ai_without_body_requires_prompt() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send_raw(app(&dir), "POST", "/api/ai", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "prompt is required");
}

#[tokio::test]
async fn ai_without_key_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let (status, _) = post_json(app(&dir), "/api/ai", serde_json::json!({ "prompt": "hi" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn ai_rejects_unknown_type() {
    let dir = TempDir::new().unwrap();
    let (status, _) = post_json(
        app(&dir),
        "/api/ai",
        serde_json::json!({ "prompt": "hi", "type": "poem" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ai_chat_returns_text() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_header("x-goog-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_reply("Hello from the model"))
        .create_async()
        .await;

    let (status, body) = post_json(
        app_with_gemini(&dir, &server),
        "/api/ai",
        serde_json::json!({ "prompt": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "text": "Hello from the model" }));
    mock.assert_async().await;
}

#[tokio::test]
async fn ai_decompose_strips_fences() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_reply(
            "```json\n[{\"command\":\"mkdir app\",\"description\":\"Create dir\"}]\n```",
        ))
        .create_async()
        .await;

    let (status, body) = post_json(
        app_with_gemini(&dir, &server),
        "/api/ai",
        serde_json::json!({ "prompt": "make an app", "type": "decompose" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({ "commands": [{ "command": "mkdir app", "description": "Create dir" }] })
    );
}

#[tokio::test]
async fn ai_decompose_parse_failure_returns_raw_text() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_reply("Sorry, I cannot help with that."))
        .create_async()
        .await;

    let (status, body) = post_json(
        app_with_gemini(&dir, &server),
        "/api/ai",
        serde_json::json!({ "prompt": "make an app", "type": "decompose" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["rawText"], "Sorry, I cannot help with that.");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn ai_upstream_failure_is_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;

    let (status, body) = post_json(
        app_with_gemini(&dir, &server),
        "/api/ai",
        serde_json::json!({ "prompt": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("500"));
}

// ---------------------------------------------------------------------------
// Build verification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn verify_reports_success() {
    let dir = TempDir::new().unwrap();
    let (status, body) = post_json(
        app_with_build(&dir, "echo compiled"),
        "/api/verify",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["stdout"].as_str().unwrap().trim(), "compiled");
}

#[tokio::test]
async fn verify_reports_stderr_as_failure() {
    let dir = TempDir::new().unwrap();
    let (status, body) = post_json(
        app_with_build(&dir, "echo 'Module not found' >&2"),
        "/api/verify",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Build failed with errors");
    assert_eq!(body["stderr"].as_str().unwrap().trim(), "Module not found");
}

#[tokio::test]
async fn verify_runs_in_project_root() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let (status, body) = post_json(
        app_with_build(&dir, "cat marker.txt"),
        "/api/verify",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stdout"], "here");
}

// ---------------------------------------------------------------------------
// System check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn system_check_reports_missing_key() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(app(&dir), "/api/system-check").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "incomplete");
    assert_eq!(body["store"], "file");
    assert_eq!(body["checks"]["DEVDASH_TEST_KEY_THAT_IS_NEVER_SET"], false);
}
