//! Embedded template files for .recon-kit initialization.
//!
//! This module uses `rust-embed` to embed template files from the project
//! root `templates/` directory into the binary at compile time. This
//! allows the CLI to generate `.recon-kit/` structures without external
//! file dependencies.

use rust_embed::RustEmbed;

/// Embedded template files from the `templates/` directory.
///
/// At compile time, all files in the project root `templates/` directory
/// are embedded into the binary. The path is calculated relative to the
/// crate root:
/// - `CARGO_MANIFEST_DIR` = `crates/core`
/// - `../../templates` = project root `templates/`
///
/// During development with the `debug-embed` feature, files are read from
/// the filesystem at runtime, allowing for quick iteration without
/// recompilation.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Get template file content by path.
///
/// # Arguments
/// * `path` - Relative path from templates root (e.g., "config.toml",
///   "pipelines/extract-frames.yaml")
///
/// # Returns
/// The file content as a String, or None if the file doesn't exist.
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// List all template files in a directory.
///
/// # Arguments
/// * `prefix` - Directory prefix (e.g., "pipelines/")
///
/// # Returns
/// A vector of file paths that match the prefix.
pub fn list_templates(prefix: &str) -> Vec<String> {
    TemplateAssets::iter()
        .map(|path| path.to_string())
        .filter(|path| path.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_template_exists() {
        let config = get_template("config.toml").expect("config.toml template should exist");
        assert!(config.contains("data-dir"));
    }

    #[test]
    fn test_pipeline_templates_exist() {
        let pipelines = list_templates("pipelines/");
        assert!(!pipelines.is_empty());
    }

    #[test]
    fn test_missing_template_is_none() {
        assert!(get_template("does-not-exist.toml").is_none());
    }
}
