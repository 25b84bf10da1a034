//! Global configuration models for `.recon-kit/config.toml`.
//!
//! This module defines the structure of the global configuration file that
//! controls workspace layout and container settings for recon-kit.

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use ts_rs::TS;

/// Represents global settings from `.recon-kit/config.toml`.
///
/// The directory layout mirrors the reconstruction workspace convention:
/// raw uploads, processed camera data, training outputs, and exports each
/// live under their own root. Every field has a default, so a missing or
/// partial config file is never an error.
///
/// # Example
///
/// ```toml
/// # .recon-kit/config.toml
/// uploads-dir = "/workspace/data/uploads"
/// data-dir = "/workspace/data/nerfstudio"
/// outputs-dir = "/workspace/outputs"
/// exports-dir = "/workspace/exports"
/// sugar-container = "sugar"
/// dgs-container = "2dgs"
/// docker-binary = "docker"
/// probe-timeout-secs = 3
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    /// Where raw videos and image folders are uploaded.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    /// Where processed datasets (transforms.json and friends) are written.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where training runs place their checkpoints and configs.
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: PathBuf,

    /// Where exported point clouds and meshes are written.
    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,

    /// Name of the SuGaR trainer container.
    #[serde(default = "default_sugar_container")]
    pub sugar_container: String,

    /// Name of the 2DGS trainer container.
    #[serde(default = "default_dgs_container")]
    pub dgs_container: String,

    /// Container runtime binary used for probing and `docker exec` stages.
    #[serde(default = "default_docker_binary")]
    pub docker_binary: String,

    /// Upper bound on a single container runtime query, in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl GlobalConfig {
    /// The auxiliary container names this deployment probes.
    pub fn probe_names(&self) -> Vec<String> {
        vec![self.sugar_container.clone(), self.dgs_container.clone()]
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            data_dir: default_data_dir(),
            outputs_dir: default_outputs_dir(),
            exports_dir: default_exports_dir(),
            sugar_container: default_sugar_container(),
            dgs_container: default_dgs_container(),
            docker_binary: default_docker_binary(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("/workspace/data/uploads")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/workspace/data/nerfstudio")
}

fn default_outputs_dir() -> PathBuf {
    PathBuf::from("/workspace/outputs")
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from("/workspace/exports")
}

fn default_sugar_container() -> String {
    "sugar".to_string()
}

fn default_dgs_container() -> String {
    "2dgs".to_string()
}

fn default_docker_binary() -> String {
    "docker".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    3
}
