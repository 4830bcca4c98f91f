//! Integration tests: full launch-and-recover flow over the HTTP API.
//!
//! These drive the handler -> supervisor -> launcher -> probe chain end to
//! end: the sidecar starts down, the first scan request triggers a launch,
//! the "process" warms up, and every concurrent caller gets the relayed
//! verdict from exactly one launch.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use wiremock::MockServer;

use tropiscan::sidecar::SidecarTarget;

use crate::support::app::{chatbot_without_key, spawn_test_app, test_state};
use crate::support::sidecar::MockSidecarLauncher;

fn image_form() -> Form {
    let part = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name("fruit.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    Form::new().part("file", part)
}

#[tokio::test]
async fn test_first_scan_launches_sidecar_and_succeeds() {
    let mock = Arc::new(MockServer::start().await);
    let launcher = Arc::new(MockSidecarLauncher::new(
        mock.clone(),
        Duration::from_millis(150),
    ));

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
    assert_eq!(launcher.launches(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_scans_share_one_launch() {
    let mock = Arc::new(MockServer::start().await);
    let launcher = Arc::new(MockSidecarLauncher::new(
        mock.clone(),
        Duration::from_millis(150),
    ));

    let state = test_state(
        SidecarTarget::resolve(&mock.uri()),
        launcher.clone(),
        chatbot_without_key(),
        "http://127.0.0.1:9".to_string(),
    );
    let server = spawn_test_app(state).await;

    let client = reqwest::Client::new();
    let mut calls = Vec::new();
    for _ in 0..5 {
        let client = client.clone();
        let url = format!("{}/api/scan/detect", server.url());
        calls.push(tokio::spawn(async move {
            client
                .post(&url)
                .multipart(image_form())
                .send()
                .await
                .unwrap()
        }));
    }

    for call in calls {
        let response = call.await.unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["grade"], "A");
    }

    assert_eq!(
        launcher.launches(),
        1,
        "concurrent scan requests must share a single sidecar launch"
    );

    server.stop().await;
}
