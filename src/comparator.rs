//! Comparing an actual process outcome against an expected one.

use crate::ProcessResult;
use crate::diff::unified_diff;
use thiserror::Error;

/// The first difference found between an expected and an actual [ProcessResult].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    /// Output on `stderr` was expected, but the process wrote nothing there.
    ///
    /// Only the presence of output is compared, never its content.
    #[error("Something was expected on stderr")]
    MissingStderr,

    /// The process exited with a different return code.
    #[error("Exited with {actual} expected {expected}")]
    ReturnCode { expected: i32, actual: i32 },

    /// The process wrote different text to `stdout`.
    #[error("stdout differ\n{diff}")]
    Stdout {
        /// Unified diff from the expected to the actual text.
        diff: String,
    },
}

/// Checks that `actual` matches `expected`.
///
/// The checks run in the following order, stopping at the first failing one:
///
/// 1. If `expected` has anything on `stderr`, `actual` must have something on `stderr` as well.
///    When `expected` has no `stderr` output, whatever `actual` wrote there is accepted.
/// 2. Both return codes must be equal.
/// 3. Both `stdout` texts must be exactly equal.
pub fn perform_checks(expected: &ProcessResult, actual: &ProcessResult) -> Result<(), Mismatch> {
    if !expected.stderr().is_empty() && actual.stderr().is_empty() {
        return Err(Mismatch::MissingStderr);
    }

    if expected.returncode() != actual.returncode() {
        return Err(Mismatch::ReturnCode {
            expected: expected.returncode(),
            actual: actual.returncode(),
        });
    }

    if expected.stdout() != actual.stdout() {
        return Err(Mismatch::Stdout {
            diff: unified_diff(expected.stdout(), actual.stdout()),
        });
    }

    tracing::debug!(returncode = actual.returncode(), "Process outcome matches expectation");
    Ok(())
}

/// Like [perform_checks], but panics with the mismatch description.
///
/// Meant to be used from within tests, in place of `assert_eq!`.
#[track_caller]
pub fn assert_matches(expected: &ProcessResult, actual: &ProcessResult) {
    if let Err(mismatch) = perform_checks(expected, actual) {
        panic!("{mismatch}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    #[test]
    fn identical_results_match() {
        let result = ProcessResult::new("hello\n", "", 0);

        assert_that(perform_checks(&result, &result.clone())).is_ok();
    }

    #[test]
    fn unexpected_stderr_is_accepted() {
        let expected = ProcessResult::new("out\n", "", 0);
        let actual = ProcessResult::new("out\n", "warning: something\n", 0);

        assert_that(perform_checks(&expected, &actual)).is_ok();
    }

    #[test]
    fn stderr_content_is_not_compared() {
        let expected = ProcessResult::new("", "parse error at 1:1\n", 1);
        let actual = ProcessResult::new("", "totally different\n", 1);

        assert_that(perform_checks(&expected, &actual)).is_ok();
    }

    #[test]
    fn missing_stderr_is_reported_before_anything_else() {
        let expected = ProcessResult::new("a\n", "error\n", 1);
        let actual = ProcessResult::new("b\n", "", 0);

        let mismatch = perform_checks(&expected, &actual).unwrap_err();

        assert_that(mismatch.clone()).is_equal_to(Mismatch::MissingStderr);
        assert_that(mismatch.to_string()).is_equal_to("Something was expected on stderr");
    }

    #[test]
    fn returncode_mismatch_names_both_codes() {
        let expected = ProcessResult::new("a\n", "", 0);
        let actual = ProcessResult::new("a\n", "", 1);

        let mismatch = perform_checks(&expected, &actual).unwrap_err();

        assert_that(mismatch.clone()).is_equal_to(Mismatch::ReturnCode {
            expected: 0,
            actual: 1,
        });
        assert_that(mismatch.to_string()).is_equal_to("Exited with 1 expected 0");
    }

    #[test]
    fn returncode_is_checked_before_stdout() {
        let expected = ProcessResult::new("a\n", "", 0);
        let actual = ProcessResult::new("b\n", "", 2);

        let mismatch = perform_checks(&expected, &actual).unwrap_err();

        assert_that(matches!(mismatch, Mismatch::ReturnCode { .. })).is_true();
    }

    #[test]
    fn stdout_mismatch_carries_a_diff() {
        let expected = ProcessResult::new("a\nb\n", "", 0);
        let actual = ProcessResult::new("a\nc\n", "", 0);

        let mismatch = perform_checks(&expected, &actual).unwrap_err();
        let message = mismatch.to_string();

        assert_that(message.starts_with("stdout differ\n")).is_true();
        assert_that(message.as_str()).contains("\n-b\n");
        assert_that(message.as_str()).contains("\n+c\n");
    }

    #[test]
    fn stdout_is_compared_without_normalization() {
        let expected = ProcessResult::new("a\n", "", 0);
        let actual = ProcessResult::new("a\r\n", "", 0);

        let mismatch = perform_checks(&expected, &actual).unwrap_err();

        assert_that(matches!(mismatch, Mismatch::Stdout { .. })).is_true();
    }

    #[test]
    fn checks_are_repeatable() {
        let expected = ProcessResult::new("a\nb\n", "", 0);
        let actual = ProcessResult::new("a\nc\n", "", 0);

        let first = perform_checks(&expected, &actual);
        let second = perform_checks(&expected, &actual);

        assert_that(first).is_equal_to(second);
    }

    #[test]
    fn assert_matches_passes_silently() {
        let result = ProcessResult::new("hello\n", "", 0);

        assert_matches(&result, &result);
    }

    #[test]
    #[should_panic(expected = "Exited with 3 expected 0")]
    fn assert_matches_panics_with_mismatch_description() {
        assert_matches(
            &ProcessResult::new("", "", 0),
            &ProcessResult::new("", "", 3),
        );
    }
}
