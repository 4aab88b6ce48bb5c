//! Integration tests for `HttpChannelApi` against an in-process server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use chansync_core::{
    ApiSettings, BatchPhase, BatchRun, Channel, ChannelApi, ChansyncError, HttpChannelApi,
    UpdateMode,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Requests seen by the test server.
#[derive(Default)]
struct Recorded {
    auth: Vec<Option<String>>,
    user_ids: Vec<Option<String>>,
    updates: Vec<Value>,
}

type Shared = Arc<Mutex<Recorded>>;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn fetch_models(
    State(recorded): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    {
        let mut recorded = recorded.lock().unwrap();
        recorded.auth.push(header(&headers, "authorization"));
        recorded.user_ids.push(header(&headers, "new-api-user"));
    }

    match id {
        1 => (
            StatusCode::OK,
            Json(json!({"success": true, "message": "", "data": ["gpt-4", "gpt-4o"]})),
        ),
        2 => (
            StatusCode::OK,
            Json(json!({"success": false, "message": "upstream returned 401"})),
        ),
        3 => (
            StatusCode::OK,
            Json(json!({"success": true, "message": "", "data": null})),
        ),
        4 => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "message": "database is down"})),
        ),
        5 => (
            StatusCode::OK,
            Json(json!({"success": false, "message": "upstream key invalid", "data": ""})),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({})),
        ),
    }
}

async fn update_channel(
    State(recorded): State<Shared>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let rejected = body["id"] == 9;
    recorded.lock().unwrap().updates.push(body);
    if rejected {
        Json(json!({"success": false, "message": "channel is locked"}))
    } else {
        Json(json!({"success": true, "message": ""}))
    }
}

async fn slow_fetch() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({"success": true, "data": []}))
}

async fn spawn_server() -> (String, Shared) {
    let recorded = Shared::default();
    let app = Router::new()
        .route("/api/channel/fetch_models/:id", get(fetch_models))
        .route("/api/channel/", put(update_channel))
        .route("/slow/api/channel/fetch_models/:id", get(slow_fetch))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), recorded)
}

/// Server that sends headers and part of the body, then goes silent.
async fn spawn_stalling_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                          content-length: 100\r\n\r\n{\"success\":",
                    )
                    .await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(10)).await;
            });
        }
    });

    format!("http://{}", addr)
}

fn api(base_url: &str) -> HttpChannelApi {
    let settings = ApiSettings::new(base_url)
        .unwrap()
        .with_access_token("sk-test")
        .with_user_id("42");
    HttpChannelApi::new(settings).unwrap()
}

#[tokio::test]
async fn test_fetch_models_success() {
    let (base_url, recorded) = spawn_server().await;

    let models = api(&base_url).fetch_models(1).await.unwrap();
    assert_eq!(models, vec!["gpt-4".to_string(), "gpt-4o".to_string()]);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.auth, vec![Some("Bearer sk-test".to_string())]);
    assert_eq!(recorded.user_ids, vec![Some("42".to_string())]);
}

#[tokio::test]
async fn test_fetch_models_envelope_failure() {
    let (base_url, _) = spawn_server().await;

    let err = api(&base_url).fetch_models(2).await.unwrap_err();
    assert!(matches!(err, ChansyncError::Api { status_code: None, .. }));
    assert_eq!(err.to_string(), "upstream returned 401");
}

#[tokio::test]
async fn test_fetch_models_failure_keeps_message_despite_data_shape() {
    let (base_url, _) = spawn_server().await;

    let err = api(&base_url).fetch_models(5).await.unwrap_err();
    assert!(matches!(err, ChansyncError::Api { status_code: None, .. }));
    assert_eq!(err.to_string(), "upstream key invalid");
}

#[tokio::test]
async fn test_fetch_models_null_data() {
    let (base_url, _) = spawn_server().await;
    assert!(api(&base_url).fetch_models(3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_models_http_error() {
    let (base_url, _) = spawn_server().await;

    let err = api(&base_url).fetch_models(4).await.unwrap_err();
    match err {
        ChansyncError::Api {
            message,
            status_code,
        } => {
            assert_eq!(message, "database is down");
            assert_eq!(status_code, Some(500));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_models_not_found_without_message() {
    let (base_url, _) = spawn_server().await;

    let err = api(&base_url).fetch_models(77).await.unwrap_err();
    assert!(err.to_string().starts_with("HTTP 404"));
}

#[tokio::test]
async fn test_update_models_sends_joined_list() {
    let (base_url, recorded) = spawn_server().await;

    api(&base_url)
        .update_models(5, &["gpt-4".to_string(), "gpt-4o".to_string()])
        .await
        .unwrap();

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.updates, vec![json!({"id": 5, "models": "gpt-4,gpt-4o"})]);
}

#[tokio::test]
async fn test_update_models_envelope_failure() {
    let (base_url, _) = spawn_server().await;

    let err = api(&base_url)
        .update_models(9, &["gpt-4".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "channel is locked");
}

#[tokio::test]
async fn test_request_timeout() {
    let (base_url, _) = spawn_server().await;
    let settings = ApiSettings::new(&format!("{}/slow", base_url))
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let api = HttpChannelApi::new(settings).unwrap();

    let err = api.fetch_models(1).await.unwrap_err();
    assert!(matches!(err, ChansyncError::Timeout(d) if d == Duration::from_millis(200)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_stalled_body_reports_configured_timeout() {
    let base_url = spawn_stalling_server().await;
    let settings = ApiSettings::new(&base_url)
        .unwrap()
        .with_timeout(Duration::from_millis(300));
    let api = HttpChannelApi::new(settings).unwrap();

    let err = api.fetch_models(1).await.unwrap_err();
    assert!(
        matches!(err, ChansyncError::Timeout(d) if d == Duration::from_millis(300)),
        "unexpected error: {err:?}"
    );
    assert_eq!(err.to_string(), "Request timeout after 300ms");
}

#[tokio::test]
async fn test_batch_run_over_http() {
    let (base_url, recorded) = spawn_server().await;
    let api = api(&base_url);
    let channels = vec![
        Channel::new(1, "openai", &["gpt-4", "gpt-3.5-turbo"]),
        Channel::new(2, "broken", &["claude-2"]),
        Channel::new(5, "revoked", &["o3"]),
    ];

    let mut run = BatchRun::new(channels, UpdateMode::Full);
    assert_eq!(run.plan(&api).await.unwrap(), BatchPhase::PlanReview);
    let summary = run.execute(&api).await.unwrap();

    assert_eq!(summary.success, 1);
    assert_eq!(summary.plan_failures.len(), 2);
    assert_eq!(summary.plan_failures[0].error, "upstream returned 401");
    assert_eq!(summary.plan_failures[1].error, "upstream key invalid");

    let recorded = recorded.lock().unwrap();
    assert_eq!(
        recorded.updates,
        vec![json!({"id": 1, "models": "gpt-4,gpt-4o"})]
    );
}
