//! Bounded, append-only ring of output lines from the active job.
//!
//! External reconstruction tools can emit hundreds of thousands of lines
//! over a multi-hour run; the buffer keeps only the most recent 1000 so
//! memory stays bounded regardless of job length. The buffer belongs to
//! the active job: it is reset whenever a new job starts and is never
//! shared across jobs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Maximum number of retained lines.
pub const LOG_CAPACITY: usize = 1000;

/// A FIFO ring of output lines with a fixed capacity.
///
/// A single writer (the job's read loop) appends; readers take
/// point-in-time snapshots. Once full, each append evicts the oldest
/// line, preserving the relative order of the survivors.
#[derive(Debug)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    /// Create an empty buffer with the standard capacity.
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    /// Create an empty buffer with a custom capacity (used by tests).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(LOG_CAPACITY)),
            capacity,
        }
    }

    /// Append one line, evicting the oldest if the buffer is full.
    pub fn append(&mut self, line: String) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// The last `n` lines in arrival order, or fewer if the buffer is
    /// shorter.
    pub fn snapshot(&self, n: usize) -> Vec<String> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).cloned().collect()
    }

    /// Discard all lines.
    pub fn reset(&mut self) {
        self.lines.clear();
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` if no lines are retained.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle shared between the supervisor's read loop and snapshot readers.
pub type SharedLogBuffer = Arc<Mutex<LogBuffer>>;

/// Create a new shared buffer with the standard capacity.
pub fn shared() -> SharedLogBuffer {
    Arc::new(Mutex::new(LogBuffer::new()))
}
