//! Pipeline execution engine.
//!
//! The PipelineEngine executes a rendered pipeline's stages sequentially
//! through the process supervisor, streaming log and progress events to
//! the panel, and stopping at the first failure. Stages never overlap:
//! the line stream is drained to end-of-stream before the exit code is
//! taken and the next stage starts, because later stages consume earlier
//! stages' output files.

use crate::artifacts;
use crate::jobs::{ProcessSupervisor, SpawnError};
use crate::progress::ProgressTracker;
use rk_protocol::ipc::Event;
use rk_protocol::pipeline_models::{Pipeline, Stage};
use rk_protocol::run_models::{PipelineResult, RunOutcome};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tracing::{info, warn};
use uuid::Uuid;

/// The main pipeline execution engine.
///
/// Holds the supervisor so every stage it launches goes through the
/// single-active-job slot; an operator cancel or a superseding run
/// terminates whatever stage is currently live.
pub struct PipelineEngine {
    supervisor: Arc<ProcessSupervisor>,
}

impl PipelineEngine {
    /// Create an engine over the given supervisor.
    pub fn new(supervisor: Arc<ProcessSupervisor>) -> Self {
        Self { supervisor }
    }

    /// Execute a pipeline to completion and return its result.
    ///
    /// Emits `StageStarted`, `LogLine`, `ProgressUpdate`, and
    /// `StageExited` events as the run progresses, and always terminates
    /// the stream with a single `PipelineFinished` carrying the returned
    /// result. Fail-fast: the first stage that cannot spawn, exits
    /// non-zero, or is cancelled aborts the remaining stages. After a
    /// fully clean run the post-condition artifact is checked; external
    /// tools can exit 0 having produced nothing usable, and that case is
    /// reported distinctly.
    pub async fn run(
        &self,
        run_id: Uuid,
        pipeline: &Pipeline,
        events_tx: &Sender<Event>,
    ) -> PipelineResult {
        let stages_total = pipeline.stages.len();
        let mut succeeded = 0usize;

        info!(pipeline = %pipeline.name, stages = stages_total, "pipeline run starting");

        for (index, stage) in pipeline.stages.iter().enumerate() {
            let _ = events_tx
                .send(Event::StageStarted {
                    run_id,
                    stage_index: index,
                    description: stage.description.clone(),
                })
                .await;

            let mut handle = match self.supervisor.start(&stage.command).await {
                Ok(handle) => handle,
                Err(e) => {
                    warn!(pipeline = %pipeline.name, stage = index, "spawn failed: {}", e);
                    let result = spawn_failure(pipeline, succeeded, index, stage, &e);
                    return self.finish(run_id, events_tx, result).await;
                }
            };

            // A spec that failed catalog validation is silently dropped
            // here; progress is cosmetic and never aborts a stage.
            let mut tracker = stage
                .progress
                .as_ref()
                .and_then(|spec| ProgressTracker::compile(spec).ok());

            while let Some(line) = handle.next_line().await {
                if let Some(progress) = tracker.as_mut().and_then(|t| t.observe(&line)) {
                    let _ = events_tx
                        .send(Event::ProgressUpdate {
                            run_id,
                            fraction: progress.fraction,
                            label: progress.label,
                        })
                        .await;
                }
                let _ = events_tx.send(Event::LogLine { run_id, line }).await;
            }

            let exit_code = handle.wait().await;
            let _ = events_tx
                .send(Event::StageExited {
                    run_id,
                    stage_index: index,
                    exit_code,
                })
                .await;

            if handle.was_cancelled() {
                info!(pipeline = %pipeline.name, stage = index, "run cancelled");
                let result = stage_failure(
                    pipeline,
                    succeeded,
                    index,
                    stage,
                    exit_code,
                    RunOutcome::Cancelled { stage: index },
                );
                return self.finish(run_id, events_tx, result).await;
            }

            if exit_code != 0 {
                warn!(
                    pipeline = %pipeline.name,
                    stage = index,
                    exit_code,
                    "stage failed, aborting remaining stages"
                );
                let result = stage_failure(
                    pipeline,
                    succeeded,
                    index,
                    stage,
                    exit_code,
                    RunOutcome::StageFailed {
                        stage: index,
                        exit_code,
                    },
                );
                return self.finish(run_id, events_tx, result).await;
            }

            succeeded += 1;
        }

        let result = match &pipeline.post_condition {
            Some(condition) if !artifacts::check(condition) => {
                warn!(
                    pipeline = %pipeline.name,
                    artifact = %condition.describe(),
                    "all stages exited 0 but the expected artifact is missing"
                );
                PipelineResult {
                    pipeline: pipeline.name.clone(),
                    stages_total,
                    succeeded_stages: succeeded,
                    failed_stage: None,
                    failed_stage_description: None,
                    exit_code: Some(0),
                    post_condition_met: false,
                    outcome: RunOutcome::ArtifactMissing {
                        artifact: condition.describe(),
                    },
                }
            }
            _ => {
                info!(pipeline = %pipeline.name, "pipeline run completed");
                PipelineResult {
                    pipeline: pipeline.name.clone(),
                    stages_total,
                    succeeded_stages: succeeded,
                    failed_stage: None,
                    failed_stage_description: None,
                    exit_code: Some(0),
                    post_condition_met: true,
                    outcome: RunOutcome::Completed,
                }
            }
        };

        self.finish(run_id, events_tx, result).await
    }

    async fn finish(
        &self,
        run_id: Uuid,
        events_tx: &Sender<Event>,
        result: PipelineResult,
    ) -> PipelineResult {
        let _ = events_tx
            .send(Event::PipelineFinished {
                run_id,
                result: result.clone(),
            })
            .await;
        result
    }
}

fn spawn_failure(
    pipeline: &Pipeline,
    succeeded: usize,
    index: usize,
    stage: &Stage,
    error: &SpawnError,
) -> PipelineResult {
    PipelineResult {
        pipeline: pipeline.name.clone(),
        stages_total: pipeline.stages.len(),
        succeeded_stages: succeeded,
        failed_stage: Some(index),
        failed_stage_description: Some(stage.description.clone()),
        exit_code: None,
        post_condition_met: false,
        outcome: RunOutcome::SpawnFailed {
            stage: index,
            reason: error.to_string(),
        },
    }
}

fn stage_failure(
    pipeline: &Pipeline,
    succeeded: usize,
    index: usize,
    stage: &Stage,
    exit_code: i32,
    outcome: RunOutcome,
) -> PipelineResult {
    PipelineResult {
        pipeline: pipeline.name.clone(),
        stages_total: pipeline.stages.len(),
        succeeded_stages: succeeded,
        failed_stage: Some(index),
        failed_stage_description: Some(stage.description.clone()),
        exit_code: Some(exit_code),
        post_condition_met: false,
        outcome,
    }
}
