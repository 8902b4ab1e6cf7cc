//! Literal substring counting over a batch of lines.

/// Counts non-overlapping occurrences of `pattern` in each line and sums them.
///
/// Scanning is left to right and each match consumes its span, so `"aa"` is
/// found twice in `"aaaa"`. Lines are searched independently; a match never
/// spans two lines. `pattern` must not be empty.
pub fn count<S: AsRef<str>>(pattern: &str, lines: &[S]) -> u64 {
    debug_assert!(!pattern.is_empty(), "empty patterns are rejected upstream");
    lines
        .iter()
        .map(|line| count_in_line(pattern, line.as_ref()))
        .sum()
}

/// Counts non-overlapping occurrences of `pattern` within one line
pub fn count_in_line(pattern: &str, line: &str) -> u64 {
    // Fast reject before the searcher is built
    if line.len() < pattern.len() {
        return 0;
    }
    line.matches(pattern).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_across_lines() {
        let lines = ["foo bar foo", "bar foo bar bar"];
        assert_eq!(count("foo", &lines), 3);
        assert_eq!(count("bar", &lines), 4);
        assert_eq!(count("baz", &lines), 0);
    }

    #[test]
    fn test_non_overlapping() {
        assert_eq!(count("aa", &["aaaa"]), 2);
        assert_eq!(count("aa", &["aaa"]), 1);
        assert_eq!(count("aba", &["ababa"]), 1);
    }

    #[test]
    fn test_never_spans_lines() {
        let lines = vec!["xa".to_string(), "ay".to_string()];
        assert_eq!(count("aa", &lines), 0);
        assert_eq!(count("xa", &lines), 1);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(count("error", &["ERROR Error error"]), 1);
    }

    #[test]
    fn test_multibyte_patterns() {
        assert_eq!(count("é", &["café é", "ée"]), 3);
        assert_eq!(count("日本", &["日本語と日本"]), 2);
    }

    #[test]
    fn test_empty_batch_and_short_lines() {
        let empty: [&str; 0] = [];
        assert_eq!(count("x", &empty), 0);
        assert_eq!(count("long pattern", &["short", ""]), 0);
    }
}
