//! HTTP routes driven through the router without binding a socket

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{extraction_reply, models, models_with, test_config, MockLlm, SwitchableEmbedder};
use research_rag::server::{build_router, state::AppState};

const BOUNDARY: &str = "research-rag-test-boundary";

fn app(dir: &std::path::Path) -> Router {
    // Answers questions in plain text and extraction prompts in JSON
    let llm = MockLlm::with(|request| {
        if request.json_mode {
            extraction_reply(request)
        } else {
            Ok("Accuracy reached 94.5% in 2023.".to_string())
        }
    });
    build_router(AppState::with_models(test_config(dir), models(llm)))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart(uri: &str, files: &[(&str, &str)]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"source\"\r\n\r\nbrowser\r\n"
    );
    for (name, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn create_session(router: &Router) -> String {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/sessions")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_and_info() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());

    let (status, body) = send(
        &router,
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));

    let (status, body) = send(
        &router,
        Request::get("/api/info").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collection"], "research_papers");
    assert_eq!(body["llm"]["provider"], "mock");
}

#[tokio::test]
async fn readiness_follows_model_health() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = SwitchableEmbedder::new();
    let router = build_router(AppState::with_models(
        test_config(dir.path()),
        models_with(embedder.clone(), MockLlm::answering("ok")),
    ));
    let ready = || Request::get("/ready").body(Body::empty()).unwrap();

    let (status, _) = send(&router, ready()).await;
    assert_eq!(status, StatusCode::OK);

    embedder.set_failing(true);
    let (status, _) = send(&router, ready()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    embedder.set_failing(false);
    let (status, _) = send(&router, ready()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn query_before_upload_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());
    let id = create_session(&router).await;

    let (status, body) = send(
        &router,
        post_json(
            &format!("/api/sessions/{id}/query"),
            json!({"question": "What is the accuracy?"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "warning");
    assert_eq!(
        body["error"]["message"],
        "Please upload and process documents first!"
    );
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());

    let (status, body) = send(
        &router,
        Request::get(format!("/api/sessions/{}", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "session_not_found");
}

#[tokio::test]
async fn upload_without_files_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());
    let id = create_session(&router).await;

    let (status, body) = send(
        &router,
        multipart(&format!("/api/sessions/{id}/documents"), &[]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Please upload a PDF first");
}

#[tokio::test]
async fn upload_query_extract_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());
    let id = create_session(&router).await;

    let (status, body) = send(
        &router,
        multipart(
            &format!("/api/sessions/{id}/documents"),
            &[
                ("study.txt", "In our 2023 study the accuracy was 94.5% on the test set."),
                ("notes.txt", "An undated F1 result for the baseline."),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["files"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &router,
        post_json(
            &format!("/api/sessions/{id}/query"),
            json!({"question": "What accuracy did the study report?", "top_k": 1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Accuracy reached 94.5% in 2023.");
    assert_eq!(body["sources"].as_array().unwrap().len(), 1);
    assert_eq!(body["sources"][0]["filename"], "study.txt");

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/sessions/{id}/metrics"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pages_processed"], 2);
    assert_eq!(
        body["vega_lite"]["trend"]["title"],
        "Performance Metrics Over Time"
    );
    assert!(body["vega_lite"]["comparison"]["data"]["values"].is_array());

    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .any(|r| r["Metric"] == "Accuracy" && r["Year"] == 2023 && r["Value"] == 94.5));
    assert!(rows.iter().any(|r| r["Metric"] == "F1" && r["Year"] == 2013));

    let (status, body) = send(
        &router,
        post_json(
            &format!("/api/sessions/{id}/metrics"),
            json!({"fallback_year": 2020}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["Metric"] == "F1" && r["Year"] == 2020));

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/sessions/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &router,
        Request::get(format!("/api/sessions/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
