//! Sidecar fakes for integration tests.
//!
//! The production launcher spawns a real uvicorn process; these fakes let
//! the tests script the sidecar's behavior while still exercising the full
//! supervisor -> probe -> handler path over HTTP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tropiscan::common::error::SidecarError;
use tropiscan::sidecar::{ProcessState, SidecarLauncher, SidecarTarget};

/// Mount a healthy `/health` on the mock sidecar.
#[allow(dead_code)]
pub async fn mount_health(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "yolo_enabled": true,
            "weights_exists": true
        })))
        .mount(server)
        .await;
}

/// Mount a canned `/detect` verdict on the mock sidecar.
#[allow(dead_code)]
pub async fn mount_detect(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "grade": "A",
            "confidence": 0.93,
            "detections": [
                { "name": "dragonfruit", "conf": 0.93 }
            ]
        })))
        .mount(server)
        .await;
}

/// Launcher that never manages to start anything. The supervisor sees a
/// process that stays `NotStarted`, so readiness attempts run out the
/// deadline against a dead port.
#[allow(dead_code)]
pub struct IdleLauncher {
    launches: AtomicUsize,
}

#[allow(dead_code)]
impl IdleLauncher {
    pub fn new() -> Self {
        Self {
            launches: AtomicUsize::new(0),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SidecarLauncher for IdleLauncher {
    async fn launch(&self, _target: &SidecarTarget) -> Result<(), SidecarError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn state(&self) -> ProcessState {
        ProcessState::NotStarted
    }

    fn started_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Launcher that "starts" a wiremock sidecar: on launch it mounts the
/// health and detect endpoints after a configurable warmup delay,
/// simulating a process that takes a moment to begin answering.
#[allow(dead_code)]
pub struct MockSidecarLauncher {
    server: Arc<MockServer>,
    warmup: Duration,
    launches: AtomicUsize,
    state: Mutex<ProcessState>,
}

#[allow(dead_code)]
impl MockSidecarLauncher {
    pub fn new(server: Arc<MockServer>, warmup: Duration) -> Self {
        Self {
            server,
            warmup,
            launches: AtomicUsize::new(0),
            state: Mutex::new(ProcessState::NotStarted),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SidecarLauncher for MockSidecarLauncher {
    async fn launch(&self, _target: &SidecarTarget) -> Result<(), SidecarError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = ProcessState::Running;

        let server = self.server.clone();
        let warmup = self.warmup;
        tokio::spawn(async move {
            tokio::time::sleep(warmup).await;
            mount_health(&server).await;
            mount_detect(&server).await;
        });

        Ok(())
    }

    fn state(&self) -> ProcessState {
        *self.state.lock().unwrap()
    }

    fn started_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}
