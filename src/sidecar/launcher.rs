//! Sidecar process launching
//!
//! Owns starting, naming, and observing the lifecycle of the local AI
//! service process. The lifecycle is an explicit state machine driven by
//! two events (`Started`, `Terminated`) rather than scattered callbacks, so
//! the supervisor can make restart decisions from observable state.
//!
//! Exactly one live process may exist per launcher, and ownership is
//! exclusive: nothing else terminates or reparents it. A crashed process is
//! not restarted here; the supervisor relaunches on the next readiness
//! request, once the handle has reached [`ProcessState::Exited`].

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::common::error::SidecarError;
use crate::config::get_env_with_fallback_or;

use super::target::SidecarTarget;

/// Timeout for a single interpreter `--version` check.
const PYTHON_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Lifecycle state of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    /// No launch has been attempted yet.
    #[default]
    NotStarted,
    /// A launch is in progress; the spawn call has not completed.
    Starting,
    /// The spawn call succeeded and the process has not terminated.
    Running,
    /// The process terminated (crash, external kill, or normal exit), or
    /// the spawn itself failed (`None` exit code sentinel).
    Exited(Option<i32>),
}

impl ProcessState {
    /// A new launch is only permitted from `NotStarted` or `Exited`.
    pub fn can_launch(&self) -> bool {
        matches!(self, ProcessState::NotStarted | ProcessState::Exited(_))
    }

    /// Stable label for status endpoints and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::NotStarted => "not_started",
            ProcessState::Starting => "starting",
            ProcessState::Running => "running",
            ProcessState::Exited(_) => "exited",
        }
    }

    fn next(self, event: &ProcessEvent) -> ProcessState {
        match (self, event) {
            // Termination wins from any state; it is also the spawn-error
            // transition (sentinel code None).
            (_, ProcessEvent::Terminated(code)) => ProcessState::Exited(*code),
            (ProcessState::Starting, ProcessEvent::Started) => ProcessState::Running,
            // A started signal for a process we no longer track is stale.
            (state, ProcessEvent::Started) => state,
        }
    }
}

/// Lifecycle events. These are the only way state leaves
/// `Starting`/`Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEvent {
    /// The launch call reported success.
    Started,
    /// The process terminated with the given exit code, or failed to spawn
    /// (`None`).
    Terminated(Option<i32>),
}

/// Shared ownership record for the launched process.
#[derive(Debug, Clone, Default)]
pub struct ProcessHandle {
    inner: Arc<Mutex<HandleInner>>,
}

#[derive(Debug, Default)]
struct HandleInner {
    state: ProcessState,
    started_at: Option<DateTime<Utc>>,
}

impl ProcessHandle {
    /// Current lifecycle state.
    pub fn state(&self) -> ProcessState {
        self.inner.lock().expect("process handle lock poisoned").state
    }

    /// When the most recent launch began, if any.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.inner
            .lock()
            .expect("process handle lock poisoned")
            .started_at
    }

    fn begin_start(&self) {
        let mut inner = self.inner.lock().expect("process handle lock poisoned");
        inner.state = ProcessState::Starting;
        inner.started_at = Some(Utc::now());
    }

    fn apply(&self, event: ProcessEvent) {
        let mut inner = self.inner.lock().expect("process handle lock poisoned");
        let next = inner.state.next(&event);
        debug!(from = inner.state.as_str(), to = next.as_str(), "Sidecar process state transition");
        inner.state = next;
    }
}

/// Seam between the readiness coordinator and process creation.
///
/// The production implementation spawns uvicorn; tests substitute counting
/// fakes to verify the exactly-once launch guarantee in isolation.
#[async_trait]
pub trait SidecarLauncher: Send + Sync {
    /// Start the local AI service bound to `target`.
    ///
    /// Returns `Ok(())` if a process is live afterwards (including the case
    /// where one already was). Fails with
    /// [`SidecarError::RuntimeUnavailable`] when no usable execution
    /// environment exists, or [`SidecarError::Spawn`] when the OS rejects
    /// the spawn.
    async fn launch(&self, target: &SidecarTarget) -> Result<(), SidecarError>;

    /// Current lifecycle state of the owned process.
    fn state(&self) -> ProcessState;

    /// When the most recent launch began, if any.
    fn started_at(&self) -> Option<DateTime<Utc>>;
}

/// A detected Python interpreter.
#[derive(Debug, Clone)]
struct PythonRuntime {
    command: String,
    base_args: Vec<String>,
}

/// Locate a usable Python interpreter by running `--version`.
///
/// Windows installs often only ship the `py` launcher, so it is probed with
/// `-3` after plain `python`; elsewhere `python3` is preferred.
async fn detect_python() -> Option<PythonRuntime> {
    let candidates: &[(&str, &[&str])] = if cfg!(windows) {
        &[("python", &[]), ("py", &["-3"])]
    } else {
        &[("python3", &[]), ("python", &[])]
    };

    for (command, base_args) in candidates {
        let mut check = Command::new(command);
        check
            .args(*base_args)
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());

        match tokio::time::timeout(PYTHON_CHECK_TIMEOUT, check.status()).await {
            Ok(Ok(status)) if status.success() => {
                debug!(command = %command, "Detected Python runtime");
                return Some(PythonRuntime {
                    command: command.to_string(),
                    base_args: base_args.iter().map(|a| a.to_string()).collect(),
                });
            }
            Ok(Ok(status)) => {
                debug!(command = %command, status = ?status.code(), "Python candidate check failed");
            }
            Ok(Err(err)) => {
                debug!(command = %command, error = %err, "Python candidate not runnable");
            }
            Err(_) => {
                warn!(command = %command, "Python candidate version check timed out");
            }
        }
    }

    None
}

/// Production launcher: runs the sidecar as `python -m uvicorn main:app`
/// inside the configured sidecar directory.
pub struct UvicornLauncher {
    sidecar_dir: PathBuf,
    command_override: Option<Vec<String>>,
    handle: ProcessHandle,
}

impl UvicornLauncher {
    /// Create a launcher running the sidecar from `sidecar_dir`.
    pub fn new(sidecar_dir: impl Into<PathBuf>) -> Self {
        Self {
            sidecar_dir: sidecar_dir.into(),
            command_override: None,
            handle: ProcessHandle::default(),
        }
    }

    /// Load launcher settings from environment variables
    /// (`TROPISCAN_SIDECAR_DIR`, `TROPISCAN_SIDECAR_COMMAND`).
    pub fn from_env() -> Self {
        let sidecar_dir =
            get_env_with_fallback_or("TROPISCAN_SIDECAR_DIR", "TROPISCAN_SIDECAR_DIR", ".");
        let command_override = std::env::var("TROPISCAN_SIDECAR_COMMAND")
            .ok()
            .map(|raw| raw.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|parts: &Vec<String>| !parts.is_empty());

        let mut launcher = Self::new(sidecar_dir);
        launcher.command_override = command_override;
        launcher
    }

    /// Replace the launch command line entirely (tests, exotic deploys).
    /// The resolved host and port are still appended as `--host`/`--port`.
    pub fn with_command_override(mut self, command: Vec<String>) -> Self {
        self.command_override = if command.is_empty() {
            None
        } else {
            Some(command)
        };
        self
    }

    /// Shared handle observing the launched process.
    pub fn handle(&self) -> ProcessHandle {
        self.handle.clone()
    }

    /// Resolve the program and argument list for this launch.
    async fn resolve_command(
        &self,
        target: &SidecarTarget,
    ) -> Result<(String, Vec<String>), SidecarError> {
        let bind_args = [
            "--host".to_string(),
            target.host.clone(),
            "--port".to_string(),
            target.port.to_string(),
        ];

        if let Some(parts) = &self.command_override {
            let mut args: Vec<String> = parts[1..].to_vec();
            args.extend(bind_args);
            return Ok((parts[0].clone(), args));
        }

        let python = detect_python().await.ok_or_else(|| {
            SidecarError::RuntimeUnavailable(
                "no python3/python interpreter answered a version check".to_string(),
            )
        })?;

        let mut args = python.base_args;
        args.extend([
            "-m".to_string(),
            "uvicorn".to_string(),
            "main:app".to_string(),
        ]);
        args.extend(bind_args);
        Ok((python.command, args))
    }
}

#[async_trait]
impl SidecarLauncher for UvicornLauncher {
    async fn launch(&self, target: &SidecarTarget) -> Result<(), SidecarError> {
        let state = self.handle.state();
        if !state.can_launch() {
            debug!(state = state.as_str(), "Sidecar process already live; skipping launch");
            return Ok(());
        }

        // RuntimeUnavailable is a configuration defect, not transient:
        // detect it before touching the handle so the state machine only
        // records real launch attempts.
        let (program, args) = self.resolve_command(target).await?;

        self.handle.begin_start();
        info!(
            program = %program,
            args = %args.join(" "),
            dir = %self.sidecar_dir.display(),
            "Starting AI sidecar"
        );

        let mut command = Command::new(&program);
        command
            .args(&args)
            .current_dir(&self.sidecar_dir)
            .env("PYTHONUNBUFFERED", "1");

        match command.spawn() {
            Ok(mut child) => {
                self.handle.apply(ProcessEvent::Started);

                // Exit watcher: the only path out of Running. The process is
                // deliberately never killed from here; it outlives readiness
                // deadlines and is expected to run for the host's lifetime.
                let handle = self.handle.clone();
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) => {
                            info!(exit_code = ?status.code(), "AI sidecar exited");
                            handle.apply(ProcessEvent::Terminated(status.code()));
                        }
                        Err(err) => {
                            error!(error = %err, "Failed to observe AI sidecar exit");
                            handle.apply(ProcessEvent::Terminated(None));
                        }
                    }
                });

                Ok(())
            }
            Err(err) => {
                self.handle.apply(ProcessEvent::Terminated(None));
                Err(SidecarError::Spawn(err.to_string()))
            }
        }
    }

    fn state(&self) -> ProcessState {
        self.handle.state()
    }

    fn started_at(&self) -> Option<DateTime<Utc>> {
        self.handle.started_at()
    }
}
