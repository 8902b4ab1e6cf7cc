//! The ordered set of literal filters and their running totals.
//!
//! Insertion order is significant: it is the order counts are reported in and
//! the order the dispatcher applies batch results in. Duplicate patterns are
//! allowed and counted independently.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::errors::{CountError, CountResult};

/// A single literal filter with its running occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEntry {
    /// The literal substring to count. Never empty.
    pub pattern: String,
    /// Occurrences counted so far in the current run
    pub count: u64,
}

/// Ordered collection of filter entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    entries: Vec<FilterEntry>,
}

impl FilterSet {
    /// Creates an empty filter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter set from patterns, failing on the first empty one
    pub fn from_patterns<I, S>(patterns: I) -> CountResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for pattern in patterns {
            set.add(pattern)?;
        }
        Ok(set)
    }

    /// Appends a filter with a zero count
    pub fn add(&mut self, pattern: impl Into<String>) -> CountResult<&FilterEntry> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(CountError::invalid_pattern(pattern));
        }
        debug!("Adding filter {:?} at index {}", pattern, self.entries.len());
        self.entries.push(FilterEntry { pattern, count: 0 });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Removes the entries at the given positions. Out-of-range indices are ignored.
    pub fn remove_at(&mut self, indices: impl IntoIterator<Item = usize>) {
        let doomed: BTreeSet<usize> = indices
            .into_iter()
            .filter(|&i| i < self.entries.len())
            .collect();
        // Highest index first so earlier positions stay valid
        for index in doomed.into_iter().rev() {
            let removed = self.entries.remove(index);
            debug!("Removed filter {:?} at index {}", removed.pattern, index);
        }
    }

    /// Sets every count back to zero
    pub fn reset_counts(&mut self) {
        for entry in &mut self.entries {
            entry.count = 0;
        }
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// Owned snapshot of the patterns, in filter order
    pub fn patterns(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.pattern.clone()).collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.count).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds one batch worth of results to the running totals, in filter order.
    ///
    /// `found` must hold exactly one value per entry.
    pub(crate) fn add_counts(&mut self, found: &[u64]) {
        debug_assert_eq!(found.len(), self.entries.len());
        for (entry, n) in self.entries.iter_mut().zip(found) {
            entry.count += n;
        }
    }
}
