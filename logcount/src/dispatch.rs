//! Fan-out/fan-in of counting work for one batch.
//!
//! Each filter gets its own counting task on the dispatcher's rayon pool. The
//! tasks share the batch's lines read-only and hand back plain integers; the
//! filter set is only touched after every task for the batch has joined.
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use tracing::{debug, trace};

use crate::counter;
use crate::errors::{CountError, CountResult};
use crate::filters::FilterSet;
use crate::metrics::RunMetrics;
use crate::reader::Batch;

/// Runs the per-filter counting tasks for each batch
#[derive(Debug)]
pub struct Dispatcher {
    pool: ThreadPool,
    metrics: RunMetrics,
}

impl Dispatcher {
    /// Creates a dispatcher with its own pool of `threads` workers
    pub fn new(threads: NonZeroUsize) -> CountResult<Self> {
        Self::with_metrics(threads, RunMetrics::new())
    }

    pub fn with_metrics(threads: NonZeroUsize, metrics: RunMetrics) -> CountResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.get())
            .thread_name(|i| format!("logcount-worker-{}", i))
            .build()
            .map_err(|e| CountError::config_error(format!("thread pool: {}", e)))?;
        debug!("Dispatcher pool started with {} threads", threads);
        Ok(Self { pool, metrics })
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Counts every filter against `batch` and adds the results to `filters`.
    ///
    /// Returns once all tasks for the batch have completed and their results
    /// have been applied in filter order.
    pub fn process_batch(&self, batch: &Batch, filters: &mut FilterSet) {
        let found = self.count_batch(batch, &filters.patterns());
        filters.add_counts(&found);
    }

    /// Fan-out step: one task per pattern, results in pattern order
    pub fn count_batch(&self, batch: &Batch, patterns: &[String]) -> Vec<u64> {
        trace!(
            "Dispatching {} tasks over {} lines",
            patterns.len(),
            batch.lines.len()
        );
        let lines = &batch.lines;
        let metrics = &self.metrics;
        self.pool.install(|| {
            patterns
                .par_iter()
                .with_max_len(1)
                .map(|pattern| {
                    let found = counter::count(pattern, lines);
                    metrics.record_task(found);
                    found
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(lines: &[&str]) -> Batch {
        Batch {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            end_offset: 0,
        }
    }

    #[test]
    fn test_process_batch_accumulates() {
        let dispatcher = Dispatcher::new(NonZeroUsize::new(4).unwrap()).unwrap();
        let mut filters = FilterSet::from_patterns(["foo", "bar", "baz"]).unwrap();

        dispatcher.process_batch(&batch(&["foo bar foo"]), &mut filters);
        dispatcher.process_batch(&batch(&["bar foo bar bar"]), &mut filters);

        assert_eq!(filters.counts(), vec![3, 4, 0]);
        let stats = dispatcher.metrics().get_stats();
        assert_eq!(stats.tasks, 6);
        assert_eq!(stats.matches, 7);
    }

    #[test]
    fn test_duplicate_filters_counted_independently() {
        let dispatcher = Dispatcher::new(NonZeroUsize::new(2).unwrap()).unwrap();
        let mut filters = FilterSet::from_patterns(["x", "x"]).unwrap();
        dispatcher.process_batch(&batch(&["xx", "x"]), &mut filters);
        assert_eq!(filters.counts(), vec![3, 3]);
    }

    #[test]
    fn test_results_keep_filter_order() {
        let dispatcher = Dispatcher::new(NonZeroUsize::new(8).unwrap()).unwrap();
        let patterns: Vec<String> = (0..50).map(|i| format!("p{}", i)).collect();
        let lines: Vec<String> = (0..50)
            .map(|i| format!("p{} ", i).repeat(i + 1))
            .collect();
        let batch = Batch {
            lines,
            end_offset: 0,
        };

        let found = dispatcher.count_batch(&batch, &patterns);
        // "p1" also matches inside "p10".."p19", so compare with the sequential count
        let expected: Vec<u64> = patterns
            .iter()
            .map(|p| counter::count(p, &batch.lines))
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_single_thread_pool() {
        let dispatcher = Dispatcher::new(NonZeroUsize::MIN).unwrap();
        let mut filters = FilterSet::from_patterns(["a"]).unwrap();
        dispatcher.process_batch(&batch(&["aaa", "a"]), &mut filters);
        assert_eq!(filters.counts(), vec![4]);
    }
}
