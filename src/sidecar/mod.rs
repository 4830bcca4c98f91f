//! Sidecar process supervision
//!
//! The backend depends on a local Python inference service (uvicorn/FastAPI)
//! for scan analysis. This module guarantees that service is running and
//! healthy before a request is forwarded to it, while deduplicating
//! concurrent launch triggers into a single in-flight attempt:
//!
//! - [`target`] resolves the configured address and decides whether the
//!   service is local (supervisable) or remote (externally managed).
//! - [`probe`] issues bounded-timeout health checks.
//! - [`launcher`] owns starting and observing the local process.
//! - [`supervisor`] coordinates the above behind `ensure_ready`.

pub mod launcher;
pub mod probe;
pub mod supervisor;
pub mod target;

pub use launcher::{ProcessState, SidecarLauncher, UvicornLauncher};
pub use probe::{probe_health, HealthStatus};
pub use supervisor::SidecarSupervisor;
pub use target::SidecarTarget;
