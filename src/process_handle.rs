use crate::collector::Collector;
use crate::signal::{self, ShutdownSignal};
use crate::{ProcessResult, SpawnError, TerminationError, WaitError};
use std::borrow::Cow;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};

/// Time a killed process is given to be reaped.
const KILL_REAP_TIMEOUT: Duration = Duration::from_secs(1);

/// Represents the running state of a process.
#[derive(Debug)]
pub enum RunningState {
    /// The process is still running.
    Running,

    /// The process has terminated with the given exit status.
    Terminated(ExitStatus),

    /// Failed to determine process state.
    Uncertain(io::Error),
}

impl RunningState {
    pub fn as_bool(&self) -> bool {
        match self {
            RunningState::Running => true,
            RunningState::Terminated(_) | RunningState::Uncertain(_) => false,
        }
    }
}

impl From<RunningState> for bool {
    fn from(is_running: RunningState) -> Self {
        is_running.as_bool()
    }
}

/// A spawned child process whose `stdout` and `stderr` streams are captured in the background.
///
/// Output is collected from the moment of spawning, regardless of whether or when the process is
/// awaited.
///
/// The child is killed when this handle is dropped while the process is still running.
/// Prefer waiting for completion or calling [ProcessHandle::terminate] explicitly.
#[derive(Debug)]
pub struct ProcessHandle {
    pub(crate) name: Cow<'static, str>,
    child: Child,
    stdout: Collector,
    stderr: Collector,
}

impl ProcessHandle {
    /// Spawns `cmd`, capturing its `stdout` and `stderr`. The process does not inherit `stdin`.
    pub fn spawn(
        name: impl Into<Cow<'static, str>>,
        mut cmd: Command,
    ) -> Result<ProcessHandle, SpawnError> {
        let process_name = name.into();

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| SpawnError::SpawnFailed {
            process_name: process_name.clone(),
            source,
        })?;

        // Both were configured as piped above. They are only absent if taken before.
        let stdout = child.stdout.take().ok_or_else(|| SpawnError::SpawnFailed {
            process_name: process_name.clone(),
            source: io::Error::other("stdout was not captured"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| SpawnError::SpawnFailed {
            process_name: process_name.clone(),
            source: io::Error::other("stderr was not captured"),
        })?;

        tracing::debug!(process = %process_name, pid = ?child.id(), "Spawned process");

        Ok(Self {
            stdout: Collector::spawn(process_name.clone(), "stdout", stdout),
            stderr: Collector::spawn(process_name.clone(), "stderr", stderr),
            name: process_name,
            child,
        })
    }

    /// The name used for this process in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the OS-assigned process identifier, or `None` once the process was awaited.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    //noinspection RsSelfConvention
    pub fn is_running(&mut self) -> RunningState {
        match self.child.try_wait() {
            Ok(None) => RunningState::Running,
            Ok(Some(exit_status)) => RunningState::Terminated(exit_status),
            Err(err) => RunningState::Uncertain(err),
        }
    }

    /// Waits for the process to exit, without touching its output.
    ///
    /// When `timeout` elapses, the process is left running and [WaitError::Timeout] is returned.
    pub async fn wait_for_completion(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<ExitStatus, WaitError> {
        match timeout {
            None => self.wait_for_exit().await,
            Some(timeout) => match tokio::time::timeout(timeout, self.wait_for_exit()).await {
                Ok(result) => result,
                Err(_elapsed) => Err(WaitError::Timeout {
                    process_name: self.name.clone(),
                    timeout,
                }),
            },
        }
    }

    /// Waits for the process to exit and both output streams to be closed, all within
    /// `wait_timeout`.
    ///
    /// When the deadline passes, [WaitError::Timeout] is returned right away. The process is
    /// terminated in a background task (see [ProcessHandle::terminate]). Failing to terminate it
    /// is logged. Should the runtime shut down before termination completes, the process is
    /// killed when the background task is dropped.
    pub async fn wait_for_completion_with_output_or_terminate(
        mut self,
        wait_timeout: Duration,
        interrupt_timeout: Duration,
        terminate_timeout: Duration,
    ) -> Result<ProcessResult, WaitError> {
        let outcome = tokio::time::timeout(wait_timeout, self.collect_until_exit()).await;
        match outcome {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(
                    process = %self.name,
                    timeout = ?wait_timeout,
                    "Process did not complete in time, terminating it"
                );

                let process_name = self.name.clone();
                tokio::spawn(async move {
                    if let Err(err) = self.terminate(interrupt_timeout, terminate_timeout).await {
                        tracing::error!(
                            process = %self.name,
                            error = %err,
                            "Could not terminate timed out process"
                        );
                    }

                    // Processes spawned by the child may keep the pipes open.
                    let _partial_stdout = self.stdout.abort().await;
                    let _partial_stderr = self.stderr.abort().await;
                });

                Err(WaitError::Timeout {
                    process_name,
                    timeout: wait_timeout,
                })
            }
        }
    }

    /// Terminates this process, escalating until it is gone:
    ///
    /// 1. Send an interrupt signal and wait up to `interrupt_timeout`.
    /// 2. Send a terminate signal and wait up to `terminate_timeout`.
    /// 3. Kill the process and wait up to one more second for it to be reaped.
    pub async fn terminate(
        &mut self,
        interrupt_timeout: Duration,
        terminate_timeout: Duration,
    ) -> Result<ExitStatus, TerminationError> {
        let interrupt_error = match self
            .signal_and_await(ShutdownSignal::Interrupt, interrupt_timeout)
            .await
        {
            Ok(exit_status) => return Ok(exit_status),
            Err(err) => {
                tracing::warn!(
                    process = %self.name,
                    error = %err,
                    "Graceful interrupt failed, sending terminate signal"
                );
                err
            }
        };

        let terminate_error = match self
            .signal_and_await(ShutdownSignal::Terminate, terminate_timeout)
            .await
        {
            Ok(exit_status) => return Ok(exit_status),
            Err(err) => {
                tracing::warn!(
                    process = %self.name,
                    error = %err,
                    "Terminate signal failed, killing process"
                );
                err
            }
        };

        if let Err(kill_error) = self.child.start_kill() {
            return Err(TerminationError::TerminationFailed {
                process_name: self.name.clone(),
                interrupt_error: interrupt_error.to_string(),
                terminate_error: terminate_error.to_string(),
                kill_error,
            });
        }
        self.await_exit(signal::KILL_NAME, KILL_REAP_TIMEOUT).await
    }

    async fn collect_until_exit(&mut self) -> Result<ProcessResult, WaitError> {
        let status = self.wait_for_exit().await?;
        let stdout = self.stdout.wait().await?;
        let stderr = self.stderr.wait().await?;
        Ok(ProcessResult::from_raw(status, &stdout, &stderr))
    }

    async fn wait_for_exit(&mut self) -> Result<ExitStatus, WaitError> {
        let exit_status = self
            .child
            .wait()
            .await
            .map_err(|source| WaitError::IoError {
                process_name: self.name.clone(),
                source,
            })?;
        tracing::debug!(process = %self.name, ?exit_status, "Process exited");
        Ok(exit_status)
    }

    async fn signal_and_await(
        &mut self,
        shutdown_signal: ShutdownSignal,
        timeout: Duration,
    ) -> Result<ExitStatus, TerminationError> {
        signal::send(&self.child, shutdown_signal).map_err(|source| {
            TerminationError::SignallingFailed {
                process_name: self.name.clone(),
                source,
                signal: shutdown_signal.name(),
            }
        })?;
        self.await_exit(shutdown_signal.name(), timeout).await
    }

    async fn await_exit(
        &mut self,
        signal: &'static str,
        timeout: Duration,
    ) -> Result<ExitStatus, TerminationError> {
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(result) => result.map_err(|source| TerminationError::WaitFailed {
                process_name: self.name.clone(),
                signal,
                source,
            }),
            Err(_elapsed) => Err(TerminationError::NotExited {
                process_name: self.name.clone(),
                signal,
                timeout,
            }),
        }
    }
}
