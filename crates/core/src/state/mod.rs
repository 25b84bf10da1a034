//! Session state: the facade the presentation layer drives.

pub mod manager;

pub use manager::{PipelineRun, SessionManager};
