//! # rk-protocol
//!
//! Core protocol definitions and data models for recon-kit.
//!
//! This crate defines all shared data structures used for:
//! - Pipeline catalog definitions (built-in and `.recon-kit/pipelines/*.yaml`)
//! - Progress inference configuration and reported progress data
//! - Pipeline run results and failure taxonomy
//! - Inter-process communication between the control panel and the Core
//!
//! ## Modules
//!
//! - [`config_models`]: Global configuration from `.recon-kit/config.toml`
//! - [`container_models`]: Liveness classification of auxiliary containers
//! - [`pipeline_models`]: Pipeline/stage definitions and rendered commands
//! - [`progress_models`]: Declarative progress specs and progress snapshots
//! - [`run_models`]: Pipeline run outcomes and results
//! - [`ipc`]: Operations and Events for panel-Core communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, and uuid
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other recon-kit crates

pub mod config_models;
pub mod container_models;
pub mod ipc;
pub mod pipeline_models;
pub mod progress_models;
pub mod run_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use container_models::*;
pub use ipc::*;
pub use pipeline_models::*;
pub use progress_models::*;
pub use run_models::*;
