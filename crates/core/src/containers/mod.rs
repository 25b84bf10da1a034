//! Container liveness probing for auxiliary trainer services.
//!
//! Some pipelines delegate into dedicated containers (SuGaR, 2DGS). The
//! probe classifies each named service as running, built-but-idle, or
//! absent, so the panel can tell the operator what is actually available.
//! Status is re-derived from the live runtime on every query; nothing is
//! cached.

mod docker;

pub use docker::DockerCli;

use async_trait::async_trait;
use rk_protocol::ContainerStatus;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Errors from a container runtime query.
///
/// These never propagate past the probe: an unreachable or hung runtime
/// degrades to [`ContainerStatus::Absent`], a conservative default that
/// never claims readiness it cannot verify.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The runtime did not answer within the configured bound.
    #[error("Container runtime query timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The runtime binary could not be executed.
    #[error("Failed to invoke container runtime: {0}")]
    Io(#[from] std::io::Error),

    /// The runtime executed but reported an error of its own.
    #[error("Container runtime query failed: {stderr}")]
    CommandFailed { stderr: String },
}

/// Boundary to the external container runtime.
///
/// Split out as a trait so probe classification can be tested without a
/// daemon on the machine.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Whether a container named `name` is currently running.
    async fn is_running(&self, name: &str) -> Result<bool, ProbeError>;

    /// Whether any container or image record named `name` exists.
    async fn exists(&self, name: &str) -> Result<bool, ProbeError>;
}

/// Classify one named service.
///
/// Any query error is reported as `Absent`.
pub async fn status<R>(runtime: &R, name: &str) -> ContainerStatus
where
    R: ContainerRuntime + ?Sized,
{
    match runtime.is_running(name).await {
        Ok(true) => ContainerStatus::Running,
        Ok(false) => match runtime.exists(name).await {
            Ok(true) => ContainerStatus::BuiltNotRunning,
            Ok(false) => ContainerStatus::Absent,
            Err(e) => {
                warn!(container = name, "existence probe failed: {}", e);
                ContainerStatus::Absent
            }
        },
        Err(e) => {
            warn!(container = name, "liveness probe failed: {}", e);
            ContainerStatus::Absent
        }
    }
}

/// Classify every named service in one pass.
pub async fn probe_containers<R>(runtime: &R, names: &[String]) -> HashMap<String, ContainerStatus>
where
    R: ContainerRuntime + ?Sized,
{
    let mut statuses = HashMap::with_capacity(names.len());
    for name in names {
        statuses.insert(name.clone(), status(runtime, name).await);
    }
    statuses
}
