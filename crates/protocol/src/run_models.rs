//! Pipeline run results and the failure taxonomy.
//!
//! Every run terminates in exactly one [`RunOutcome`]. The distinctions
//! matter operationally: a non-zero exit points at the failing tool, while
//! a missing artifact after all-zero exits means the logs need reading
//! before anyone re-runs blindly.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Terminal classification of a pipeline run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunOutcome {
    /// Every stage exited 0 and the post-condition held.
    Completed,

    /// A stage's executable could not be launched at all. No output was
    /// captured for it; the reason is the spawn error text.
    SpawnFailed { stage: usize, reason: String },

    /// A stage ran but exited non-zero. Remaining stages were never started.
    StageFailed { stage: usize, exit_code: i32 },

    /// The active job was terminated on operator request (or superseded by
    /// a newer run) while this stage was running.
    Cancelled { stage: usize },

    /// All stages exited 0 but the expected artifact is absent. External
    /// tools can exit 0 while silently producing no usable output.
    ArtifactMissing { artifact: String },
}

/// Full report of one pipeline run.
///
/// `failed_stage` is 0-indexed and `None` on success. `exit_code` is the
/// last observed stage exit code, `None` when the failure happened before
/// any process exited (spawn failure).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PipelineResult {
    /// Name of the pipeline that ran.
    pub pipeline: String,

    /// Number of stages the pipeline declared.
    pub stages_total: usize,

    /// How many stages exited 0 before the run terminated.
    pub succeeded_stages: usize,

    /// 0-indexed failing stage, if any.
    pub failed_stage: Option<usize>,

    /// Description of the failing stage, for diagnosis without a catalog
    /// lookup.
    pub failed_stage_description: Option<String>,

    /// Exit code of the failing stage, if a process got far enough to exit.
    pub exit_code: Option<i32>,

    /// Whether the post-condition artifact existed after the last stage.
    /// `true` when the pipeline declares no post-condition.
    pub post_condition_met: bool,

    /// Terminal classification of the run.
    pub outcome: RunOutcome,
}

impl PipelineResult {
    /// `true` only for fully successful runs.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }
}
