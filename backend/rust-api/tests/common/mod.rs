#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use microlearn_api::{
    config::Config, create_router, services::catalog_service::StaticCatalog, services::AppState,
};
use std::sync::Arc;
use tower::ServiceExt;

/// Results screen delay used by integration tests, short enough to wait out.
pub const TEST_RESULTS_DELAY_MS: u64 = 50;

pub async fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config {
        results_delay_ms: TEST_RESULTS_DELAY_MS,
        ..Config::default()
    };

    let app_state = Arc::new(AppState::with_catalog(
        config,
        Arc::new(StaticCatalog::builtin()),
    ));

    create_router(app_state)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, json)
}
