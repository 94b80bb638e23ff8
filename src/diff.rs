use similar::TextDiff;

/// Number of unchanged lines shown around every change.
const CONTEXT_RADIUS: usize = 3;

/// Renders a line-oriented unified diff turning `expected` into `actual`.
///
/// Removed lines are prefixed with `-`, added lines with `+`. A missing trailing newline is
/// marked with `\ No newline at end of file`. Returns an empty string if both texts are equal.
pub fn unified_diff(expected: &str, actual: &str) -> String {
    TextDiff::from_lines(expected, actual)
        .unified_diff()
        .context_radius(CONTEXT_RADIUS)
        .header("expected", "actual")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    #[test]
    fn marks_removed_and_added_lines() {
        let diff = unified_diff("a\nb\n", "a\nc\n");

        assert_that(diff.as_str()).is_equal_to(
            "--- expected\n\
             +++ actual\n\
             @@ -1,2 +1,2 @@\n \
             a\n\
             -b\n\
             +c\n",
        );
    }

    #[test]
    fn equal_texts_produce_no_diff() {
        assert_that(unified_diff("same\n", "same\n").as_str()).is_equal_to("");
    }

    #[test]
    fn hints_at_missing_trailing_newline() {
        let diff = unified_diff("a\n", "a");

        assert_that(diff.as_str()).contains("\\ No newline at end of file");
    }

    #[test]
    fn distant_changes_only_show_their_context() {
        let expected: String = (1..=20).map(|i| format!("line {i}\n")).collect();
        let actual = expected.replace("line 2\n", "line two\n");

        let diff = unified_diff(&expected, &actual);

        assert_that(diff.as_str()).contains("-line 2\n+line two\n");
        assert_that(diff.as_str()).contains(" line 5\n");
        assert_that(diff.contains(" line 6\n")).is_false();
    }
}
