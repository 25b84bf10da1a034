//! Pipeline definitions, both declarative templates and rendered commands.
//!
//! A [`PipelineSpec`] is what the catalog stores and what
//! `.recon-kit/pipelines/*.yaml` files contain: command argument vectors
//! with `${placeholder}` slots for project paths and numeric options, plus
//! an optional post-condition artifact template. Rendering a spec against a
//! concrete parameter set produces a [`Pipeline`] of runnable [`Stage`]s.

use crate::progress_models::ProgressSpec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;

/// Template form of a pipeline's expected output artifact.
///
/// Paths may contain `${placeholder}` slots; they are resolved together
/// with the stage commands when the pipeline is rendered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactCheckSpec {
    /// A single file that must exist after the last stage.
    File { path: String },

    /// At least one file with the given suffix must exist anywhere under
    /// the root directory. Covers tools that name their outputs themselves
    /// (ns-export writes `point_cloud.ply`, `splat.ply`, or similar,
    /// depending on the format).
    Within { root: String, suffix: String },
}

/// Rendered form of [`ArtifactCheckSpec`] with all placeholders resolved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactCheck {
    /// A single path that must exist.
    File { path: PathBuf },

    /// At least one `*{suffix}` file somewhere under `root`.
    Within { root: PathBuf, suffix: String },
}

impl ArtifactCheck {
    /// Human-readable description of what was expected, for failure reports.
    pub fn describe(&self) -> String {
        match self {
            Self::File { path } => path.display().to_string(),
            Self::Within { root, suffix } => {
                format!("*{} under {}", suffix, root.display())
            }
        }
    }
}

/// One step of a pipeline template: a command with placeholder slots.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StageSpec {
    /// What this stage does, shown to the operator while it runs.
    pub description: String,

    /// Argument vector template. The first element is the executable;
    /// any element may contain `${placeholder}` slots.
    pub command: Vec<String>,

    /// Optional progress inference rules for this stage's output.
    #[serde(default)]
    pub progress: Option<ProgressSpec>,
}

/// A named, ordered sequence of stage templates plus a post-condition.
///
/// # Example
///
/// ```yaml
/// name: process-video
/// description: Extract frames and solve camera poses from a video
/// stages:
///   - description: COLMAP processing
///     command:
///       - ns-process-data
///       - video
///       - --data
///       - "${input}"
///       - --output-dir
///       - "${output}"
/// post-condition:
///   type: file
///   path: "${output}/transforms.json"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineSpec {
    /// Unique name identifying this pipeline.
    pub name: String,

    /// Human-readable summary shown in pipeline listings.
    #[serde(default)]
    pub description: String,

    /// Ordered stage templates. Executed sequentially, fail-fast.
    pub stages: Vec<StageSpec>,

    /// Artifact that must exist after the last stage for the run to count
    /// as a success. Absent means exit codes alone decide.
    #[serde(default)]
    pub post_condition: Option<ArtifactCheckSpec>,
}

/// A rendered, runnable stage: concrete argument vector plus metadata.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Stage {
    /// What this stage does, shown to the operator while it runs.
    pub description: String,

    /// Concrete argument vector; the first element is the executable.
    pub command: Vec<String>,

    /// Progress inference rules, carried over from the template.
    pub progress: Option<ProgressSpec>,
}

/// A rendered pipeline, ready for the engine.
///
/// Stages have no existence outside their pipeline; the engine consumes
/// them in declared order and aborts at the first failure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Pipeline {
    /// Name of the catalog entry this was rendered from.
    pub name: String,

    /// Ordered, concrete stages.
    pub stages: Vec<Stage>,

    /// Resolved post-condition, if the template declared one.
    pub post_condition: Option<ArtifactCheck>,
}
