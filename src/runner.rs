//! Builder API for running a command to completion under a deadline.

use crate::{ProcessHandle, ProcessResult, RunError, SpawnError};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Maximum time a process run through [run_shell] may take, including collection of its output.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Time an overdue process is given to react to an interrupt signal.
pub const DEFAULT_INTERRUPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Time an overdue process is given to react to a terminate signal, before being killed.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs `program` with `args` and captures its outcome, allowing at most [DEFAULT_TIMEOUT].
///
/// A process exceeding the deadline is terminated and a timeout error is returned instead of a
/// result. Use [RunError::is_timeout] to tell this apart from other failures.
///
/// # Examples
///
/// ```no_run
/// use tokio_process_expect::{ProcessResult, assert_matches, run_shell};
///
/// # async fn example() -> Result<(), tokio_process_expect::RunError> {
/// let actual = run_shell("echo", ["hello"]).await?;
/// assert_matches(&ProcessResult::new("hello\n", "", 0), &actual);
/// # Ok(())
/// # }
/// ```
pub async fn run_shell<I, S>(
    program: impl AsRef<OsStr>,
    args: I,
) -> Result<ProcessResult, RunError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Runner::new(program).args(args).run().await
}

/// A builder for configuring and running a process.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use tokio_process_expect::Runner;
///
/// # async fn example() -> Result<(), tokio_process_expect::RunError> {
/// let result = Runner::new("cargo")
///     .arg("--version")
///     .name("cargo-version")
///     .timeout(Duration::from_secs(5))
///     .run()
///     .await?;
/// assert!(result.success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Runner {
    cmd: Command,
    name: Option<Cow<'static, str>>,
    timeout: Duration,
    interrupt_timeout: Duration,
    terminate_timeout: Duration,
}

impl Runner {
    /// Creates a runner for `program`, using the default timeouts.
    ///
    /// If no name is explicitly set via [Runner::name], the name is derived from the program
    /// and its arguments.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            cmd: Command::new(program),
            name: None,
            timeout: DEFAULT_TIMEOUT,
            interrupt_timeout: DEFAULT_INTERRUPT_TIMEOUT,
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.cmd.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cmd.current_dir(dir);
        self
    }

    /// Sets the name used for the process in logs and errors.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the deadline for the process to exit and close its output streams.
    ///
    /// Default is [DEFAULT_TIMEOUT].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default is [DEFAULT_INTERRUPT_TIMEOUT].
    pub fn interrupt_timeout(mut self, timeout: Duration) -> Self {
        self.interrupt_timeout = timeout;
        self
    }

    /// Default is [DEFAULT_TERMINATE_TIMEOUT].
    pub fn terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }

    /// Spawns the process without waiting for it.
    pub fn spawn(self) -> Result<ProcessHandle, SpawnError> {
        let name = self.generate_name();
        ProcessHandle::spawn(name, self.cmd)
    }

    /// Spawns the process and waits for its outcome, terminating it when the deadline passes.
    pub async fn run(self) -> Result<ProcessResult, RunError> {
        let timeout = self.timeout;
        let interrupt_timeout = self.interrupt_timeout;
        let terminate_timeout = self.terminate_timeout;

        let process = self.spawn()?;
        let result = process
            .wait_for_completion_with_output_or_terminate(
                timeout,
                interrupt_timeout,
                terminate_timeout,
            )
            .await?;
        Ok(result)
    }

    /// Like [Runner::run], but blocks the calling thread until the process completed or the
    /// deadline passed.
    ///
    /// A private single-threaded runtime drives the process. Called from within an async runtime,
    /// [RunError::InsideRuntime] is returned without spawning the process.
    ///
    /// On timeout, the process is killed when the private runtime shuts down.
    pub fn run_blocking(self) -> Result<ProcessResult, RunError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(RunError::InsideRuntime {
                process_name: self.generate_name(),
            });
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RunError::Runtime)?;
        runtime.block_on(self.run())
    }

    /// Generates a name like `ls "-la"` from the program and its arguments.
    fn generate_name(&self) -> Cow<'static, str> {
        if let Some(name) = &self.name {
            return name.clone();
        }

        let cmd = self.cmd.as_std();
        let mut name = cmd.get_program().to_string_lossy().into_owned();
        for arg in cmd.get_args() {
            name.push_str(" \"");
            name.push_str(arg.to_string_lossy().as_ref());
            name.push('"');
        }
        name.into()
    }
}
