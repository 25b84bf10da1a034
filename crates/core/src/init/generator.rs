//! Directory structure and file generation for .recon-kit initialization.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use std::fs;
use std::path::{Path, PathBuf};

/// Options for initializing a .recon-kit directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Target directory where .recon-kit will be created.
    pub target_dir: PathBuf,

    /// Overwrite existing .recon-kit directory if it exists.
    pub force: bool,

    /// Create minimal structure (config.toml only, no sample pipelines).
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate a complete .recon-kit directory structure with templates.
///
/// This function creates the following structure:
/// ```text
/// .recon-kit/
/// ├── config.toml
/// └── pipelines/
///     └── extract-frames.yaml (unless minimal)
/// ```
///
/// # Arguments
/// * `options` - Configuration for the initialization process
///
/// # Returns
/// `Ok(())` if successful, or an `InitError` if:
/// - The .recon-kit directory already exists (without force flag)
/// - A template file cannot be found
/// - File system operations fail
pub async fn generate_recon_kit_structure(options: InitOptions) -> InitResult<()> {
    let rk_dir = options.target_dir.join(".recon-kit");

    // Check if directory exists
    if rk_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(rk_dir));
    }

    // Create directory structure
    fs::create_dir_all(rk_dir.join("pipelines")).map_err(|source| InitError::DirectoryCreate {
        path: rk_dir.join("pipelines"),
        source,
    })?;

    // Generate config.toml
    write_template_file(&rk_dir, "config.toml")?;

    // Generate sample pipeline templates
    if !options.minimal {
        for pipeline_path in list_templates("pipelines/") {
            write_template_file(&rk_dir, &pipeline_path)?;
        }
    }

    Ok(())
}

/// Helper function to write a template file to the target directory.
fn write_template_file(rk_dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = rk_dir.join(template_path);

    // Ensure parent directory exists
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path,
        source,
    })?;

    Ok(())
}
