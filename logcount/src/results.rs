//! Outcome types handed back to the caller of a run.
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Lifecycle of the run controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One filter with its final count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCount<'a> {
    pub pattern: &'a str,
    pub count: u64,
}

/// Work statistics for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub total_bytes: u64,
    pub bytes_consumed: u64,
    pub lines_consumed: u64,
    pub batches: u64,
    #[serde(skip)]
    pub duration: Duration,
}

/// Terminal outcome of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub status: RunStatus,
    /// Filter patterns, in filter order
    pub patterns: Vec<String>,
    /// Per-filter counts, parallel to `patterns`. All zero unless `Completed`
    /// or `Failed` mid-read.
    pub counts: Vec<u64>,
    /// Human-readable reason for `Failed` and `Cancelled`
    pub reason: Option<String>,
    pub stats: RunStats,
}

impl RunResult {
    pub(crate) fn failed(patterns: Vec<String>, counts: Vec<u64>, reason: impl fmt::Display) -> Self {
        Self {
            status: RunStatus::Failed,
            patterns,
            counts,
            reason: Some(reason.to_string()),
            stats: RunStats::default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Pairs each pattern with its count
    pub fn pattern_counts(&self) -> impl Iterator<Item = PatternCount<'_>> {
        self.patterns
            .iter()
            .zip(&self.counts)
            .map(|(pattern, &count)| PatternCount { pattern, count })
    }

    /// Sum of all per-filter counts
    pub fn total_matches(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(RunStatus::default(), RunStatus::Idle);
        assert_eq!(RunStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_pattern_counts() {
        let result = RunResult {
            status: RunStatus::Completed,
            patterns: vec!["foo".to_string(), "bar".to_string()],
            counts: vec![3, 1],
            reason: None,
            stats: RunStats::default(),
        };
        let pairs: Vec<_> = result.pattern_counts().collect();
        assert_eq!(pairs[0], PatternCount { pattern: "foo", count: 3 });
        assert_eq!(pairs[1], PatternCount { pattern: "bar", count: 1 });
        assert_eq!(result.total_matches(), 4);
        assert!(result.is_completed());
    }

    #[test]
    fn test_failed_result() {
        let result = RunResult::failed(vec![], vec![], crate::CountError::NoFilters);
        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.reason.as_deref(), Some("Nothing to do: no filters defined"));
        assert!(!result.is_completed());
    }

    #[test]
    fn test_serializes_to_json() {
        let result = RunResult {
            status: RunStatus::Completed,
            patterns: vec!["a".to_string()],
            counts: vec![2],
            reason: None,
            stats: RunStats::default(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["counts"][0], 2);
    }
}
