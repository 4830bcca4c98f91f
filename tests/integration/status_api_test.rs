//! Integration tests: aggregate status endpoints.

use std::sync::Arc;

use serde_json::Value;
use wiremock::MockServer;

use tropiscan::sidecar::SidecarTarget;

use crate::support::app::{chatbot_without_key, spawn_test_app, test_state};
use crate::support::sidecar::{mount_health, IdleLauncher};

#[tokio::test]
async fn test_status_reports_disconnected_sidecar() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let launcher = Arc::new(IdleLauncher::new());
    let state = test_state(
        SidecarTarget::resolve(&format!("http://{}", addr)),
        launcher.clone(),
        chatbot_without_key(),
        "http://127.0.0.1:9".to_string(),
    );
    let server = spawn_test_app(state).await;

    let body: Value = reqwest::get(format!("{}/status", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["ai_service"], "disconnected");
    assert_eq!(body["sidecar_process"], "not_started");
    assert!(body["version"].is_string());

    // A status check must never trigger a launch.
    assert_eq!(launcher.launches(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_status_reports_connected_sidecar() {
    let mock = MockServer::start().await;
    mount_health(&mock).await;

    let state = test_state(
        SidecarTarget::resolve(&mock.uri()),
        Arc::new(IdleLauncher::new()),
        chatbot_without_key(),
        "http://127.0.0.1:9".to_string(),
    );
    let server = spawn_test_app(state).await;

    let body: Value = reqwest::get(format!("{}/status", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["ai_service"], "connected");

    server.stop().await;
}

#[tokio::test]
async fn test_health_relays_sidecar_details() {
    let mock = MockServer::start().await;
    mount_health(&mock).await;

    let state = test_state(
        SidecarTarget::resolve(&mock.uri()),
        Arc::new(IdleLauncher::new()),
        chatbot_without_key(),
        "http://127.0.0.1:9".to_string(),
    );
    let server = spawn_test_app(state).await;

    let response = reqwest::get(format!("{}/api/health", server.url()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["components"]["ai_service"], true);
    assert_eq!(body["ai_details"]["status"], "healthy");
    assert!(body["pid"].is_number());

    server.stop().await;
}

#[tokio::test]
async fn test_health_omits_details_when_sidecar_down() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let state = test_state(
        SidecarTarget::resolve(&format!("http://{}", addr)),
        Arc::new(IdleLauncher::new()),
        chatbot_without_key(),
        "http://127.0.0.1:9".to_string(),
    );
    let server = spawn_test_app(state).await;

    let body: Value = reqwest::get(format!("{}/api/health", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["components"]["ai_service"], false);
    assert!(body.get("ai_details").is_none());

    server.stop().await;
}
