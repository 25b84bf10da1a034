//! Pipeline catalog: declarative pipeline templates and their rendering.
//!
//! The catalog owns every pipeline the engine can run: the built-in
//! reconstruction/training/export entries plus any user-defined pipelines
//! loaded from `.recon-kit/pipelines/*.yaml`. Rendering resolves the
//! `${placeholder}` slots of one entry against a concrete parameter map
//! and validates the progress patterns, producing a runnable
//! [`Pipeline`].

mod builtin;
pub mod template;

pub use builtin::builtin_pipelines;
pub use template::UnboundPlaceholder;

use crate::progress::{ProgressSpecError, ProgressTracker};
use rk_protocol::pipeline_models::{
    ArtifactCheck, ArtifactCheckSpec, Pipeline, PipelineSpec, Stage,
};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from catalog lookup and rendering.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No pipeline with the requested name.
    #[error("Unknown pipeline '{0}'")]
    UnknownPipeline(String),

    /// A stage template referenced a placeholder with no binding.
    ///
    /// For built-in pipelines this usually means a required parameter
    /// (project, checkpoint config) was not supplied and could not be
    /// derived.
    #[error("Pipeline '{pipeline}' stage {stage}: {source}")]
    MissingParam {
        pipeline: String,
        stage: usize,
        source: UnboundPlaceholder,
    },

    /// The post-condition template referenced an unbound placeholder.
    #[error("Pipeline '{pipeline}' post-condition: {source}")]
    MissingPostConditionParam {
        pipeline: String,
        source: UnboundPlaceholder,
    },

    /// A stage declared an invalid progress spec.
    #[error("Pipeline '{pipeline}' stage {stage} progress: {source}")]
    InvalidProgress {
        pipeline: String,
        stage: usize,
        source: ProgressSpecError,
    },
}

/// All pipelines available to this session, by name.
///
/// User-defined entries shadow built-ins of the same name, so a
/// deployment can tweak a shipped pipeline without forking the engine.
pub struct PipelineCatalog {
    pipelines: Vec<PipelineSpec>,
}

impl PipelineCatalog {
    /// A catalog of only the built-in pipelines.
    pub fn builtin() -> Self {
        Self {
            pipelines: builtin_pipelines(),
        }
    }

    /// Extend the catalog with user pipelines, shadowing by name.
    pub fn with_user_pipelines(mut self, user: Vec<PipelineSpec>) -> Self {
        for spec in user {
            if let Some(existing) = self
                .pipelines
                .iter_mut()
                .find(|existing| existing.name == spec.name)
            {
                *existing = spec;
            } else {
                self.pipelines.push(spec);
            }
        }
        self
    }

    /// Names of every available pipeline, in catalog order.
    pub fn names(&self) -> Vec<String> {
        self.pipelines.iter().map(|spec| spec.name.clone()).collect()
    }

    /// Look up one pipeline template.
    pub fn get(&self, name: &str) -> Option<&PipelineSpec> {
        self.pipelines.iter().find(|spec| spec.name == name)
    }

    /// Every pipeline template, for listings.
    pub fn specs(&self) -> &[PipelineSpec] {
        &self.pipelines
    }

    /// Render a pipeline against a parameter map.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the name is unknown, a placeholder
    /// has no binding, or a progress pattern fails to compile. Rendering
    /// validates everything up front so a run never discovers a broken
    /// template halfway through.
    pub fn render(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Pipeline, CatalogError> {
        let spec = self
            .get(name)
            .ok_or_else(|| CatalogError::UnknownPipeline(name.to_string()))?;

        let mut stages = Vec::with_capacity(spec.stages.len());
        for (index, stage_spec) in spec.stages.iter().enumerate() {
            let command = stage_spec
                .command
                .iter()
                .map(|arg| template::render(arg, params))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| CatalogError::MissingParam {
                    pipeline: spec.name.clone(),
                    stage: index,
                    source,
                })?;

            if let Some(progress) = &stage_spec.progress {
                ProgressTracker::compile(progress).map_err(|source| {
                    CatalogError::InvalidProgress {
                        pipeline: spec.name.clone(),
                        stage: index,
                        source,
                    }
                })?;
            }

            stages.push(Stage {
                description: stage_spec.description.clone(),
                command,
                progress: stage_spec.progress.clone(),
            });
        }

        let post_condition = spec
            .post_condition
            .as_ref()
            .map(|check| render_check(check, params))
            .transpose()
            .map_err(|source| CatalogError::MissingPostConditionParam {
                pipeline: spec.name.clone(),
                source,
            })?;

        Ok(Pipeline {
            name: spec.name.clone(),
            stages,
            post_condition,
        })
    }
}

fn render_check(
    check: &ArtifactCheckSpec,
    params: &HashMap<String, String>,
) -> Result<ArtifactCheck, UnboundPlaceholder> {
    Ok(match check {
        ArtifactCheckSpec::File { path } => ArtifactCheck::File {
            path: PathBuf::from(template::render(path, params)?),
        },
        ArtifactCheckSpec::Within { root, suffix } => ArtifactCheck::Within {
            root: PathBuf::from(template::render(root, params)?),
            suffix: suffix.clone(),
        },
    })
}
