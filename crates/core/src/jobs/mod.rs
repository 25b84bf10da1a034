//! Job supervision and bounded output capture.
//!
//! A Job is one external process invocation: created on dispatch, running
//! immediately, exited on termination, then discarded. At most one job is
//! active system-wide at any instant.

pub mod log_buffer;
pub mod supervisor;

pub use log_buffer::{LogBuffer, SharedLogBuffer, LOG_CAPACITY};
pub use supervisor::{JobHandle, ProcessSupervisor, SpawnError};
