use std::process::ExitStatus;

/// Return code reported when the process neither exited with a code nor was killed by a signal.
const UNKNOWN_RETURN_CODE: i32 = -1;

/// Captured outcome of a process that ran to completion.
///
/// Both output streams are always present. A process not writing anything to a stream is
/// represented by an empty string, never by an absent value.
///
/// Use [ProcessResult::new] to describe an expected outcome, e.g. from a fixture or a prior
/// trusted run, and compare it with an actual one using [crate::perform_checks].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessResult {
    stdout: String,
    stderr: String,
    returncode: i32,
}

impl ProcessResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, returncode: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            returncode,
        }
    }

    /// Builds a result from raw process output.
    ///
    /// Output is decoded as UTF-8. Invalid byte sequences are replaced with `U+FFFD`.
    /// No other normalization takes place: line endings and trailing whitespace are kept.
    pub fn from_raw(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
            returncode: returncode_of(status),
        }
    }

    /// The entire text the process wrote to its `stdout` stream.
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// The entire text the process wrote to its `stderr` stream.
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// The exit code of the process.
    ///
    /// A process killed by signal `N` reports `-N` (unix only).
    pub fn returncode(&self) -> i32 {
        self.returncode
    }

    pub fn success(&self) -> bool {
        self.returncode == 0
    }
}

impl From<std::process::Output> for ProcessResult {
    fn from(output: std::process::Output) -> Self {
        Self::from_raw(output.status, &output.stdout, &output.stderr)
    }
}

fn returncode_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    UNKNOWN_RETURN_CODE
}
