//! Test fixtures: shell-script pipelines standing in for the real tools.
//!
//! The external reconstruction tools are opaque executables as far as the
//! engine is concerned, so `sh -c` scripts that echo and exit are a full
//! stand-in for them in tests.

use rk_core::config::AppConfig;
use rk_core::state::{PipelineRun, SessionManager};
use rk_protocol::config_models::GlobalConfig;
use rk_protocol::ipc::Event;
use rk_protocol::pipeline_models::{ArtifactCheckSpec, PipelineSpec, StageSpec};
use rk_protocol::run_models::PipelineResult;
use std::time::Duration;
use tempfile::TempDir;

/// One `sh -c` stage.
pub fn sh_stage(description: &str, script: &str) -> StageSpec {
    StageSpec {
        description: description.to_string(),
        command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
        progress: None,
    }
}

/// A pipeline of `sh -c` scripts with an optional post-condition.
pub fn sh_pipeline(
    name: &str,
    scripts: &[&str],
    post_condition: Option<ArtifactCheckSpec>,
) -> PipelineSpec {
    PipelineSpec {
        name: name.to_string(),
        description: format!("test pipeline {}", name),
        stages: scripts
            .iter()
            .enumerate()
            .map(|(index, script)| sh_stage(&format!("stage {}", index), script))
            .collect(),
        post_condition,
    }
}

/// A session manager whose workspace roots live under a temp directory.
///
/// The returned TempDir must be kept alive for the test duration.
pub fn test_session(pipelines: Vec<PipelineSpec>) -> (TempDir, SessionManager) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let manager = session_in(&dir, pipelines);
    (dir, manager)
}

/// A session manager rooted in an existing workspace directory.
pub fn session_in(dir: &TempDir, pipelines: Vec<PipelineSpec>) -> SessionManager {
    let root = dir.path();
    let global = GlobalConfig {
        uploads_dir: root.join("uploads"),
        data_dir: root.join("data"),
        outputs_dir: root.join("outputs"),
        exports_dir: root.join("exports"),
        ..GlobalConfig::default()
    };
    SessionManager::new(AppConfig { global, pipelines })
}

/// Collect every event of a run until `PipelineFinished` or timeout.
pub async fn collect_events_until_finished(run: &mut PipelineRun, timeout: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    let start = tokio::time::Instant::now();

    while start.elapsed() < timeout {
        match tokio::time::timeout(Duration::from_millis(100), run.events.recv()).await {
            Ok(Some(event)) => {
                let is_terminal = matches!(&event, Event::PipelineFinished { .. });
                events.push(event);
                if is_terminal {
                    break;
                }
            }
            Ok(None) => break,  // Channel closed
            Err(_) => continue, // Timeout, keep waiting
        }
    }

    events
}

/// The result carried by the terminal event, if the run finished.
pub fn final_result(events: &[Event]) -> Option<PipelineResult> {
    events.iter().find_map(|event| match event {
        Event::PipelineFinished { result, .. } => Some(result.clone()),
        _ => None,
    })
}

/// Every captured log line, in order.
pub fn log_lines(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::LogLine { line, .. } => Some(line.clone()),
            _ => None,
        })
        .collect()
}
