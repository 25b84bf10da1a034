//! Docker CLI implementation of the container runtime boundary.

use super::{ContainerRuntime, ProbeError};
use async_trait::async_trait;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Queries container state by shelling out to the `docker` binary.
///
/// Every query is bounded by the configured timeout so a hung daemon can
/// never block a panel refresh indefinitely.
pub struct DockerCli {
    binary: String,
    timeout: Duration,
}

impl DockerCli {
    /// Create a probe for the given runtime binary and per-query bound.
    pub fn new(binary: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output, ProbeError> {
        debug!(binary = %self.binary, ?args, "container runtime query");
        let output = Command::new(&self.binary).args(args).output();
        match timeout(self.timeout, output).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ProbeError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn is_running(&self, name: &str) -> Result<bool, ProbeError> {
        let filter = format!("name=^{}$", name);
        let output = self
            .run(&["ps", "--filter", &filter, "--format", "{{.Names}}"])
            .await?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.trim() == name))
    }

    async fn exists(&self, name: &str) -> Result<bool, ProbeError> {
        // `docker inspect` resolves containers and images alike; a
        // non-zero exit means no record of that name.
        let output = self
            .run(&["inspect", "--format", "{{.Id}}", name])
            .await?;
        Ok(output.status.success())
    }
}
