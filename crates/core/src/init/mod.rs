//! Initialization module for creating .recon-kit directory structures.
//!
//! This module provides functionality to initialize a new recon-kit
//! deployment by generating a `.recon-kit/` directory with pre-configured
//! templates for:
//! - Global configuration (`config.toml`)
//! - Sample pipeline definitions (`pipelines/*.yaml`)

pub mod error;
pub mod generator;
pub mod templates;

// Re-export commonly used types for convenience
pub use error::{InitError, InitResult};
pub use generator::{generate_recon_kit_structure, InitOptions};
pub use templates::{get_template, list_templates};
