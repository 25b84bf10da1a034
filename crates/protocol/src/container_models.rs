//! Liveness classification of auxiliary service containers.
//!
//! Some pipelines delegate to tools that live inside dedicated containers
//! (the SuGaR and 2DGS trainers). The panel shows whether those services
//! are ready before offering to run them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Three-state liveness of a named auxiliary container.
///
/// Derived from the container runtime on every query and never cached;
/// a probe that errors or times out reports `Absent` rather than claim
/// readiness it cannot verify.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerStatus {
    /// The container is currently running.
    Running,

    /// A container or image record exists but nothing is running.
    BuiltNotRunning,

    /// No record of the container, or the runtime could not be queried.
    Absent,
}

impl ContainerStatus {
    /// `true` when the service can accept work right now.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Running)
    }
}
