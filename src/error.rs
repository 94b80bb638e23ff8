//! Error types for process operations.

use std::borrow::Cow;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when terminating a process.
#[derive(Debug, Error)]
pub enum TerminationError {
    /// Failed to send a signal to the process.
    #[error("Failed to send '{signal}' signal to process '{process_name}': {source}")]
    SignallingFailed {
        /// The name of the process.
        process_name: Cow<'static, str>,
        /// The underlying IO error.
        source: io::Error,
        /// The signal that could not be sent.
        signal: &'static str,
    },

    /// The signal was delivered, but the process did not exit in time.
    #[error("Process '{process_name}' did not exit within {timeout:?} after receiving '{signal}'")]
    NotExited {
        /// The name of the process.
        process_name: Cow<'static, str>,
        /// The signal the process did not react to.
        signal: &'static str,
        /// The grace period that was exceeded.
        timeout: Duration,
    },

    /// Waiting for the process to exit after signalling it failed.
    #[error("Failed to wait for process '{process_name}' after sending '{signal}': {source}")]
    WaitFailed {
        /// The name of the process.
        process_name: Cow<'static, str>,
        /// The signal sent before waiting.
        signal: &'static str,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Failed to terminate the process after trying all escalation steps.
    #[error(
        "Failed to terminate process '{process_name}'. Interrupt failed: {interrupt_error}. Terminate failed: {terminate_error}. Kill failed: {kill_error}"
    )]
    TerminationFailed {
        /// The name of the process.
        process_name: Cow<'static, str>,
        /// Error from the interrupt attempt.
        interrupt_error: String,
        /// Error from the terminate attempt.
        terminate_error: String,
        /// Error from the kill attempt.
        #[source]
        kill_error: io::Error,
    },
}

/// Errors raised while draining the `stdout` or `stderr` stream of a process.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Reading from the stream failed.
    #[error("Failed to read {stream_name} of process '{process_name}': {source}")]
    ReadFailed {
        /// The name of the process.
        process_name: Cow<'static, str>,
        /// The name of the stream.
        stream_name: &'static str,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The collector task could not be joined.
    #[error("The collector task for {stream_name} could not be joined: {source}")]
    TaskJoin {
        /// The name of the stream.
        stream_name: &'static str,
        /// The underlying join error.
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Errors that can occur when waiting for a process.
#[derive(Debug, Error)]
pub enum WaitError {
    /// A general IO error occurred.
    #[error("IO error occurred while waiting for process '{process_name}': {source}")]
    IoError {
        /// The name of the process.
        process_name: Cow<'static, str>,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The process did not complete within the deadline.
    #[error("Process '{process_name}' did not complete within {timeout:?}")]
    Timeout {
        /// The name of the process.
        process_name: Cow<'static, str>,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Collector failed to collect output.
    #[error("Collector failed to collect output: {0}")]
    CollectorFailed(#[from] CollectorError),
}

/// Errors that can occur when spawning a process.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// Failed to spawn the process.
    #[error("Failed to spawn process '{process_name}': {source}")]
    SpawnFailed {
        /// The name or description of the process being spawned.
        process_name: Cow<'static, str>,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Errors of a complete run: spawning a process and waiting for its output.
#[derive(Debug, Error)]
pub enum RunError {
    /// The process could not be started.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// The process was started, but no result could be obtained from it.
    #[error(transparent)]
    Wait(#[from] WaitError),

    /// A blocking run was requested from within an async runtime.
    #[error(
        "Cannot block on process '{process_name}' from within an async runtime, use `run` instead"
    )]
    InsideRuntime {
        /// The name of the process.
        process_name: Cow<'static, str>,
    },

    /// The runtime driving a blocking run could not be created.
    #[error("Failed to create runtime for blocking run: {0}")]
    Runtime(#[source] io::Error),
}

impl RunError {
    /// Whether the process was abandoned because it exceeded its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunError::Wait(WaitError::Timeout { .. }))
    }
}
