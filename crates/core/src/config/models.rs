//! Aggregated configuration loaded from the `.recon-kit/` directory.

use rk_protocol::config_models::GlobalConfig;
use rk_protocol::pipeline_models::PipelineSpec;

/// Everything `.recon-kit/` contributes to a session.
///
/// A missing directory yields the defaults: built-in pipelines only and
/// the standard workspace layout.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// User-defined pipelines from `pipelines/*.yaml`.
    pub pipelines: Vec<PipelineSpec>,
}
