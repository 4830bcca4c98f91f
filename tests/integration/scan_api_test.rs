//! Integration tests: scan analysis proxy.
//!
//! The scan endpoint must degrade to 503 when the sidecar cannot be made
//! ready, and relay the sidecar's verdict verbatim when it is.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use wiremock::MockServer;

use tropiscan::sidecar::SidecarTarget;

use crate::support::app::{chatbot_without_key, spawn_test_app, test_state};
use crate::support::sidecar::{mount_detect, mount_health, IdleLauncher};

fn image_form() -> Form {
    // Minimal JPEG magic bytes; the mock sidecar never decodes them.
    let part = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
        .file_name("fruit.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    Form::new()
        .part("file", part)
        .text("batch_id", "batch-7")
        .text("lat", "14.5995")
}

#[tokio::test]
async fn test_scan_degrades_to_503_when_sidecar_never_ready() {
    // Closed port: probes fail, and the idle launcher starts nothing.
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

    let response = reqwest::Client::new()
        .post(format!("{}/api/scan/detect", server.url()))
        .multipart(image_form())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Service temporarily unavailable");
    assert_eq!(launcher.launches(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_scan_relays_sidecar_verdict_when_healthy() {
    let mock = MockServer::start().await;
    mount_health(&mock).await;
    mount_detect(&mock).await;

    let launcher = Arc::new(IdleLauncher::new());
    let state = test_state(
        SidecarTarget::resolve(&mock.uri()),
        launcher.clone(),
        chatbot_without_key(),
        "http://127.0.0.1:9".to_string(),
    );
    let server = spawn_test_app(state).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/scan/detect", server.url()))
        .multipart(image_form())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["grade"], "A");
    assert_eq!(body["detections"][0]["name"], "dragonfruit");

    // Already healthy: the fast path must not have touched the launcher.
    assert_eq!(launcher.launches(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_scan_requires_an_image_file() {
    let mock = MockServer::start().await;
    mount_health(&mock).await;

    let state = test_state(
        SidecarTarget::resolve(&mock.uri()),
        Arc::new(IdleLauncher::new()),
        chatbot_without_key(),
        "http://127.0.0.1:9".to_string(),
    );
    let server = spawn_test_app(state).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/scan/detect", server.url()))
        .multipart(Form::new().text("batch_id", "batch-7"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request");

    server.stop().await;
}
