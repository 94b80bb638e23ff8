//! Run processes with a hard deadline and check their outcome against an expectation.
//!
//! A [ProcessResult] captures everything a finished process produced: its `stdout` and `stderr`
//! text and its return code. [run_shell] and [Runner] produce actual results, while
//! [perform_checks] and [assert_matches] compare them against expected ones, reporting
//! differences in `stdout` as a unified diff.

mod collector;
mod comparator;
mod diff;
mod error;
mod process_handle;
mod process_result;
mod runner;
mod signal;

pub use comparator::{Mismatch, assert_matches, perform_checks};
pub use diff::unified_diff;
pub use error::{CollectorError, RunError, SpawnError, TerminationError, WaitError};
pub use process_handle::{ProcessHandle, RunningState};
pub use process_result::ProcessResult;
pub use runner::{
    DEFAULT_INTERRUPT_TIMEOUT, DEFAULT_TERMINATE_TIMEOUT, DEFAULT_TIMEOUT, Runner, run_shell,
};
