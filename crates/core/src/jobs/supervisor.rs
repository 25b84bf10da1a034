//! Process supervision: at most one live external job at a time.
//!
//! The supervisor owns a single mutex-guarded slot for the active job.
//! Replacing the slot's contents is the only way to start a job, so the
//! single-active-job invariant holds structurally: `start` terminates the
//! previous job before the new process is spawned. This is a deliberate
//! "last request wins" policy, not a queue.

use crate::jobs::log_buffer::{self, SharedLogBuffer};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors that prevent a job from being launched at all.
///
/// A spawn failure is reported immediately and never surfaces as a
/// captured output line.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The command vector was empty.
    #[error("Cannot start a job with an empty command")]
    EmptyCommand,

    /// The executable was not found on PATH.
    #[error("Executable not found: {command}")]
    NotFound { command: String },

    /// The operating system refused to launch the process.
    #[error("Failed to spawn '{command}': {source}")]
    Io {
        command: String,
        source: std::io::Error,
    },
}

/// Cancellation/termination plumbing shared between the supervisor's slot
/// and the job's handle.
struct ActiveJob {
    id: Uuid,
    kill_tx: mpsc::Sender<()>,
    cancelled: Arc<AtomicBool>,
}

/// Handle to one supervised external process.
///
/// Exposes the interleaved stdout/stderr line stream, a waitable exit
/// code, and termination. A handle maps 1:1 to one process invocation and
/// is discarded after the process exits; it is never reused.
pub struct JobHandle {
    id: Uuid,
    pid: Option<u32>,
    lines: mpsc::Receiver<String>,
    exit: oneshot::Receiver<i32>,
    kill_tx: mpsc::Sender<()>,
    cancelled: Arc<AtomicBool>,
}

impl JobHandle {
    /// Unique id of this job.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// OS process id, if the process is (or was) alive.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Receive the next output line, stdout and stderr interleaved in
    /// arrival order. Returns `None` at end of stream.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Wait for the process to exit and return its exit code.
    ///
    /// A process killed by a signal reports the negated signal number;
    /// callers treat any non-zero value as failure.
    pub async fn wait(&mut self) -> i32 {
        (&mut self.exit).await.unwrap_or(-1)
    }

    /// Request graceful termination of the process.
    ///
    /// The read loop observes end-of-stream once the process dies; `wait`
    /// then reports the signal exit code.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.kill_tx.try_send(());
    }

    /// `true` once the job has been cancelled or superseded by a newer
    /// job. Lets callers distinguish an operator stop from an ordinary
    /// tool failure.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Supervises at most one external process at a time.
///
/// Starting a new job first sends a termination signal to the previous
/// one and resets the shared log buffer, so prior output is not
/// preserved across jobs.
pub struct ProcessSupervisor {
    active: Mutex<Option<ActiveJob>>,
    log: SharedLogBuffer,
}

impl ProcessSupervisor {
    /// Create a supervisor with a fresh log buffer.
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
            log: log_buffer::shared(),
        }
    }

    /// Launch `argv` as the new active job.
    ///
    /// If a job is already active it is terminated before the new process
    /// spawns. Every line the process writes to stdout or stderr is
    /// appended to the log buffer and delivered through the returned
    /// handle, in the order the operating system hands them over.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] when the command vector is empty, the
    /// executable cannot be found, or the OS refuses to launch it. The
    /// previous job is terminated even when the new spawn fails.
    pub async fn start(&self, argv: &[String]) -> Result<JobHandle, SpawnError> {
        let command = argv.first().ok_or(SpawnError::EmptyCommand)?.clone();

        // Hold the slot lock for the whole start so concurrent starts
        // cannot leave two processes alive.
        let mut active = self.active.lock().await;

        if let Some(prev) = active.take() {
            debug!(job = %prev.id, "terminating superseded job");
            prev.cancelled.store(true, Ordering::SeqCst);
            let _ = prev.kill_tx.try_send(());
        }

        which::which(&command).map_err(|_| SpawnError::NotFound {
            command: command.clone(),
        })?;

        let mut cmd = Command::new(&command);
        cmd.args(&argv[1..]);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| SpawnError::Io {
            command: command.clone(),
            source,
        })?;

        let id = Uuid::new_v4();
        let pid = child.id();
        debug!(job = %id, pid, command = %command, "job started");

        // Fresh buffer for the new job; prior output is gone by design.
        if let Ok(mut log) = self.log.lock() {
            log.reset();
        }

        let (line_tx, line_rx) = mpsc::channel(256);
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, Arc::clone(&self.log), line_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, Arc::clone(&self.log), line_tx);
        }

        let (exit_tx, exit_rx) = oneshot::channel();
        let (kill_tx, mut kill_rx) = mpsc::channel::<()>(1);
        let cancelled = Arc::new(AtomicBool::new(false));

        tokio::spawn(async move {
            let status = loop {
                tokio::select! {
                    status = child.wait() => break status,
                    request = kill_rx.recv() => match request {
                        Some(()) => {
                            if let Err(e) = child.start_kill() {
                                warn!(job = %id, "failed to deliver kill: {}", e);
                            }
                        }
                        // All termination handles dropped; nothing left to
                        // do but wait for the natural exit.
                        None => break child.wait().await,
                    },
                }
            };
            let code = match status {
                Ok(status) => exit_code(&status),
                Err(e) => {
                    warn!(job = %id, "failed to reap job: {}", e);
                    -1
                }
            };
            debug!(job = %id, code, "job exited");
            let _ = exit_tx.send(code);
        });

        *active = Some(ActiveJob {
            id,
            kill_tx: kill_tx.clone(),
            cancelled: Arc::clone(&cancelled),
        });

        Ok(JobHandle {
            id,
            pid,
            lines: line_rx,
            exit: exit_rx,
            kill_tx,
            cancelled,
        })
    }

    /// Terminate the active job, if one is still running.
    ///
    /// Returns `true` when a termination request was delivered.
    pub async fn cancel_active(&self) -> bool {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(job) if !job.kill_tx.is_closed() => {
                debug!(job = %job.id, "cancelling active job");
                job.cancelled.store(true, Ordering::SeqCst);
                let _ = job.kill_tx.try_send(());
                true
            }
            _ => false,
        }
    }

    /// The last `n` lines of the active job's log.
    pub fn tail(&self, n: usize) -> Vec<String> {
        self.log
            .lock()
            .map(|log| log.snapshot(n))
            .unwrap_or_default()
    }

    /// Shared handle to the active job's log buffer.
    pub fn log(&self) -> SharedLogBuffer {
        Arc::clone(&self.log)
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward lines from one pipe into the log buffer and the line channel.
fn spawn_line_reader<R>(reader: R, log: SharedLogBuffer, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Ok(mut log) = log.lock() {
                log.append(line.clone());
            }
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
}

#[cfg(unix)]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    async fn drain(handle: &mut JobHandle) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = handle.next_line().await {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_start_captures_output_and_exit_code() {
        let supervisor = ProcessSupervisor::new();
        let mut handle = supervisor
            .start(&sh("echo one; echo two"))
            .await
            .expect("spawn should succeed");

        let lines = drain(&mut handle).await;
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(handle.wait().await, 0);
        assert!(!handle.was_cancelled());
    }

    #[tokio::test]
    async fn test_stderr_is_interleaved_into_the_stream() {
        let supervisor = ProcessSupervisor::new();
        let mut handle = supervisor
            .start(&sh("echo out; echo err 1>&2"))
            .await
            .expect("spawn should succeed");

        let mut lines = drain(&mut handle).await;
        lines.sort();
        assert_eq!(lines, vec!["err", "out"]);
        assert_eq!(handle.wait().await, 0);
    }

    #[tokio::test]
    async fn test_nonzero_exit_code_is_reported() {
        let supervisor = ProcessSupervisor::new();
        let mut handle = supervisor
            .start(&sh("exit 3"))
            .await
            .expect("spawn should succeed");

        drain(&mut handle).await;
        assert_eq!(handle.wait().await, 3);
    }

    #[tokio::test]
    async fn test_missing_executable_is_a_spawn_error() {
        let supervisor = ProcessSupervisor::new();
        let result = supervisor
            .start(&["definitely-not-a-real-binary-xyz".to_string()])
            .await;

        assert!(matches!(result, Err(SpawnError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        let supervisor = ProcessSupervisor::new();
        assert!(matches!(
            supervisor.start(&[]).await,
            Err(SpawnError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn test_cancel_terminates_and_is_flagged() {
        let supervisor = ProcessSupervisor::new();
        let mut handle = supervisor
            .start(&sh("sleep 30"))
            .await
            .expect("spawn should succeed");

        assert!(supervisor.cancel_active().await);

        drain(&mut handle).await;
        let code = handle.wait().await;
        assert_ne!(code, 0);
        assert!(handle.was_cancelled());
    }

    #[tokio::test]
    async fn test_new_start_terminates_the_previous_job() {
        let supervisor = ProcessSupervisor::new();
        let mut first = supervisor
            .start(&sh("sleep 30"))
            .await
            .expect("first spawn should succeed");

        let mut second = supervisor
            .start(&sh("echo fresh"))
            .await
            .expect("second spawn should succeed");

        // The superseded job dies with a signal exit and the cancel flag.
        drain(&mut first).await;
        assert_ne!(first.wait().await, 0);
        assert!(first.was_cancelled());

        let lines = drain(&mut second).await;
        assert_eq!(lines, vec!["fresh"]);
        assert_eq!(second.wait().await, 0);
        assert!(!second.was_cancelled());
    }

    #[tokio::test]
    async fn test_log_buffer_is_reset_per_job() {
        let supervisor = ProcessSupervisor::new();

        let mut first = supervisor
            .start(&sh("echo old"))
            .await
            .expect("spawn should succeed");
        drain(&mut first).await;
        first.wait().await;
        assert_eq!(supervisor.tail(10), vec!["old"]);

        let mut second = supervisor
            .start(&sh("echo new"))
            .await
            .expect("spawn should succeed");
        drain(&mut second).await;
        second.wait().await;
        assert_eq!(supervisor.tail(10), vec!["new"]);
    }

    #[tokio::test]
    async fn test_cancel_with_no_active_job_is_a_noop() {
        let supervisor = ProcessSupervisor::new();
        assert!(!supervisor.cancel_active().await);
    }
}
