//! Sidecar readiness coordination
//!
//! `ensure_ready` is the public entry point the route handlers call before
//! forwarding work to the AI service. It probes health first; if the target
//! is local and unhealthy it triggers a launch and polls until the service
//! answers or the deadline elapses. Concurrent callers arriving while an
//! attempt is in flight attach to that attempt instead of starting another,
//! so N simultaneous requests during startup produce exactly one launch.
//!
//! Everything is absorbed into a boolean at this boundary: a `false` means
//! the caller should degrade ("temporarily unavailable"), never crash. A
//! crash of the sidecar after a successful `ensure_ready` is only detected
//! by the next call. There is no background watchdog; the result means
//! "ready as of last check", nothing stronger.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::common::error::SidecarError;
use crate::config::SupervisorConfig;

use super::launcher::{ProcessState, SidecarLauncher};
use super::probe::{probe_health, HealthStatus};
use super::target::SidecarTarget;

/// The shared in-flight coordination token: at most one exists at a time.
/// Waiters observe the outcome through the watch channel; the slot is
/// cleared when the attempt resolves so a later call can retry from scratch.
struct ReadinessAttempt {
    outcome: watch::Receiver<Option<bool>>,
}

struct SupervisorInner {
    target: SidecarTarget,
    client: reqwest::Client,
    launcher: Arc<dyn SidecarLauncher>,
    config: SupervisorConfig,
    // Single coordinating lock for the one-slot attempt registry. Launch
    // preconditions are checked only by the attempt driver, so the
    // check-then-act sequences on the process handle stay single-writer.
    attempt: Mutex<Option<ReadinessAttempt>>,
}

/// Readiness coordinator for the AI sidecar. Cheap to clone; all clones
/// share the same attempt slot and launcher.
#[derive(Clone)]
pub struct SidecarSupervisor {
    inner: Arc<SupervisorInner>,
}

impl SidecarSupervisor {
    /// Create a supervisor for `target`, launching through `launcher`.
    pub fn new(
        target: SidecarTarget,
        client: reqwest::Client,
        launcher: Arc<dyn SidecarLauncher>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SupervisorInner {
                target,
                client,
                launcher,
                config,
                attempt: Mutex::new(None),
            }),
        }
    }

    /// The resolved sidecar target.
    pub fn target(&self) -> &SidecarTarget {
        &self.inner.target
    }

    /// Lifecycle state of the supervised process.
    pub fn process_state(&self) -> ProcessState {
        self.inner.launcher.state()
    }

    /// When the most recent launch began, if any.
    pub fn process_started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.launcher.started_at()
    }

    /// One direct health probe, without triggering a launch.
    ///
    /// Used by status endpoints that report connectivity rather than
    /// demanding it.
    pub async fn probe_once(&self) -> HealthStatus {
        probe_health(
            &self.inner.client,
            &self.inner.target,
            self.inner.config.probe_timeout,
        )
        .await
    }

    /// Fetch the sidecar's raw health document for status reporting,
    /// without triggering a launch. `None` when unreachable or non-2xx.
    pub async fn fetch_health_details(&self) -> Option<serde_json::Value> {
        super::probe::fetch_health_details(
            &self.inner.client,
            &self.inner.target,
            self.inner.config.probe_timeout,
        )
        .await
    }

    /// `ensure_ready` with the configured default deadline.
    pub async fn ensure_ready_default(&self) -> bool {
        self.ensure_ready(self.inner.config.startup_deadline).await
    }

    /// Ensure the AI service is ready, returning whether it is.
    ///
    /// - Already healthy: returns `true` immediately, no coordination
    ///   overhead (the common case once the sidecar is warm).
    /// - Unhealthy and non-local: returns `false`; a remote service's
    ///   lifecycle is outside this supervisor's authority.
    /// - Unhealthy and local: joins the in-flight launch attempt if one
    ///   exists, otherwise starts one, then reports its outcome.
    ///
    /// Never panics or errors; launch failure and deadline expiry both
    /// surface as `false`. The spawned process is not killed on timeout:
    /// it may still be initializing, and the next call will probe it
    /// directly.
    pub async fn ensure_ready(&self, deadline: Duration) -> bool {
        if self.probe_once().await.is_healthy() {
            return true;
        }

        if !self.inner.target.is_local {
            debug!(
                host = %self.inner.target.host,
                "AI service is unhealthy but remote; not eligible for launch"
            );
            return false;
        }

        let mut outcome = {
            let mut slot = self.inner.attempt.lock().await;
            if let Some(attempt) = slot.as_ref() {
                debug!("Readiness attempt already in flight; attaching to it");
                attempt.outcome.clone()
            } else {
                let (tx, rx) = watch::channel(None);
                *slot = Some(ReadinessAttempt {
                    outcome: rx.clone(),
                });

                let supervisor = self.clone();
                tokio::spawn(async move {
                    let ready = supervisor.drive_attempt(deadline).await;
                    // Clear the slot before publishing so a caller that
                    // arrives after resolution starts a fresh attempt.
                    *supervisor.inner.attempt.lock().await = None;
                    let _ = tx.send(Some(ready));
                });

                rx
            }
        };

        let resolved = match outcome.wait_for(Option::is_some).await {
            Ok(ready) => (*ready).unwrap_or(false),
            // The driver task died without resolving; report unavailable.
            Err(_) => false,
        };
        resolved
    }

    /// Drive a single launch-and-poll sequence to a boolean outcome.
    async fn drive_attempt(&self, deadline: Duration) -> bool {
        let inner = &self.inner;

        info!(
            target = %inner.target.base_url(),
            deadline_ms = deadline.as_millis() as u64,
            "AI service is not responding; launching sidecar"
        );

        if let Err(err) = inner.launcher.launch(&inner.target).await {
            match err {
                SidecarError::RuntimeUnavailable(_) => {
                    // Configuration defect: report once, no retry in this
                    // attempt. The next ensure_ready call re-runs detection.
                    warn!(error = %err, "Cannot launch AI sidecar");
                }
                _ => warn!(error = %err, "AI sidecar launch failed"),
            }
            return false;
        }

        let started = Instant::now();
        loop {
            if probe_health(&inner.client, &inner.target, inner.config.probe_timeout)
                .await
                .is_healthy()
            {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "AI sidecar is healthy"
                );
                return true;
            }

            if let ProcessState::Exited(code) = inner.launcher.state() {
                warn!(
                    error = %SidecarError::LaunchFailure(code),
                    "AI sidecar launch attempt failed"
                );
                return false;
            }

            if started.elapsed() >= deadline {
                warn!(
                    error = %SidecarError::DeadlineExceeded(deadline.as_millis()),
                    "AI sidecar readiness attempt timed out; leaving process running"
                );
                return false;
            }

            tokio::time::sleep(inner.config.poll_interval).await;
        }
    }
}
