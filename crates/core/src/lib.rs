//! # rk-core
//!
//! Core pipeline engine and process supervision for recon-kit.
//!
//! This crate provides:
//! - Supervision of a single external job with bounded log capture
//! - Progress inference from unstructured tool output
//! - Sequential, fail-fast pipeline execution with artifact verification
//! - Container liveness probing for auxiliary trainer services
//! - A pipeline catalog with parameterized command templates
//! - Configuration loading from the `.recon-kit/` directory
//!
//! ## Modules
//!
//! - [`jobs`]: Process supervisor, job handles, and the bounded log buffer
//! - [`progress`]: Output-line to completion-fraction inference
//! - [`containers`]: Container runtime probing
//! - [`engine`]: Pipeline execution engine
//! - [`catalog`]: Built-in and user-defined pipeline templates
//! - [`artifacts`]: Post-condition checks and artifact discovery
//! - [`config`]: Configuration loading and management
//! - [`state`]: Session facade tying the pieces together
//! - [`init`]: Scaffolding for new `.recon-kit/` directories

pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod containers;
pub mod engine;
pub mod init;
pub mod jobs;
pub mod progress;
pub mod state;
