//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between the control panel (user interface) and the Core (orchestration
//! engine).
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the panel to the Core
//! - `Event`: Status updates sent from the Core to the panel
//!
//! Communication is asynchronous and channel-based: a pipeline run is a
//! stream of `LogLine` and `ProgressUpdate` events terminated by a single
//! `PipelineFinished` carrying the result.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;
use uuid::Uuid;

use crate::container_models::ContainerStatus;
use crate::run_models::PipelineResult;

/// Operations sent from the UI (panel) to the Core logic.
///
/// These represent user commands and requests for information.
/// The core processes these operations and responds with Events.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "runPipeline",
///   "payload": {
///     "name": "process-video",
///     "params": { "project": "garden" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Start a pipeline run.
    ///
    /// Parameters are substituted into the catalog entry's command
    /// templates; workspace paths are filled in from the global config.
    RunPipeline {
        /// Name of the catalog pipeline to run.
        name: String,
        /// Placeholder values, e.g. project name or frame count.
        params: HashMap<String, String>,
    },

    /// Terminate the active job, aborting its pipeline run.
    CancelActive,

    /// Query liveness of the named auxiliary containers.
    ///
    /// An empty list probes the containers from the global config.
    ProbeContainers { names: Vec<String> },

    /// Request the last `n` lines of the active job's log.
    TailLog { n: usize },

    /// Shut down the engine gracefully.
    ///
    /// The active job, if any, is terminated first.
    Shutdown,
}

/// Events sent from the Core logic to the UI (panel).
///
/// Every event carries the id of the run it belongs to, so a panel that
/// missed the supersession of one run by another can discard stale events.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A pipeline run has been accepted and is about to start.
    PipelineStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        pipeline: String,
        stages_total: usize,
    },

    /// A stage's process is being launched.
    StageStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        stage_index: usize,
        description: String,
    },

    /// The active job produced one line of output.
    ///
    /// stdout and stderr are interleaved in arrival order.
    LogLine {
        #[ts(type = "string")]
        run_id: Uuid,
        line: String,
    },

    /// A new progress estimate was inferred from the output.
    ProgressUpdate {
        #[ts(type = "string")]
        run_id: Uuid,
        fraction: f64,
        label: String,
    },

    /// A stage's process exited.
    StageExited {
        #[ts(type = "string")]
        run_id: Uuid,
        stage_index: usize,
        exit_code: i32,
    },

    /// Terminal event of a run; no further events follow for this run.
    PipelineFinished {
        #[ts(type = "string")]
        run_id: Uuid,
        result: PipelineResult,
    },

    /// Response to a container probe.
    ContainerReport {
        statuses: HashMap<String, ContainerStatus>,
    },
}
