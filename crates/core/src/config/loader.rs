//! Configuration file loader for the `.recon-kit/` directory structure.
//!
//! This module provides functionality to load and parse all configuration
//! files from the `.recon-kit/` directory, including:
//! - `config.toml`: Global settings (workspace layout, container names)
//! - `pipelines/*.yaml`: User-defined pipeline templates

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use rk_protocol::config_models::GlobalConfig;
use rk_protocol::pipeline_models::PipelineSpec;
use std::path::Path;
use walkdir::WalkDir;

/// Loads all configuration from the `.recon-kit/` directory.
///
/// This function scans the `.recon-kit/` directory and loads:
/// - Global configuration from `config.toml`
/// - Pipeline definitions from `pipelines/*.yaml` files
///
/// # Arguments
///
/// * `root` - Root directory containing the `.recon-kit/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. If directories or
/// files are missing (but the root exists), returns a default
/// configuration rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid syntax (TOML or YAML)
/// - Required fields are missing in configuration files
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let rk_dir = root.join(".recon-kit");

    // If .recon-kit doesn't exist, return default config
    if !rk_dir.exists() {
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&rk_dir)?;
    let pipelines = load_pipelines(&rk_dir)?;

    Ok(AppConfig { global, pipelines })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(rk_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = rk_dir.join("config.toml");

    // If config.toml doesn't exist, return default
    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path,
            source,
        })?;

    Ok(config)
}

/// Loads all pipeline definitions from `pipelines/*.yaml`.
fn load_pipelines(rk_dir: &Path) -> ConfigResult<Vec<PipelineSpec>> {
    let pipelines_dir = rk_dir.join("pipelines");

    // If pipelines directory doesn't exist, return empty vector
    if !pipelines_dir.exists() {
        return Ok(Vec::new());
    }

    let mut pipelines = Vec::new();

    // Walk through all .yaml and .yml files in the pipelines directory
    for entry in WalkDir::new(&pipelines_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: pipelines_dir.clone(),
            source,
        })?;

        let path = entry.path();

        // Only process .yaml and .yml files
        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let pipeline: PipelineSpec =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?;

        if pipeline.stages.is_empty() {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: format!("pipeline '{}' declares no stages", pipeline.name),
            });
        }

        pipelines.push(pipeline);
    }

    Ok(pipelines)
}
