use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Tracks work done by a run.
///
/// Clones share the same counters, so the dispatcher's worker threads and the
/// controller can record into one instance.
#[derive(Debug, Clone)]
pub struct RunMetrics {
    batches_processed: Arc<AtomicU64>,
    lines_processed: Arc<AtomicU64>,
    bytes_processed: Arc<AtomicU64>,
    tasks_spawned: Arc<AtomicU64>,
    peak_batch_lines: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,
}

impl RunMetrics {
    /// Creates a new RunMetrics instance
    pub fn new() -> Self {
        Self {
            batches_processed: Arc::new(AtomicU64::new(0)),
            lines_processed: Arc::new(AtomicU64::new(0)),
            bytes_processed: Arc::new(AtomicU64::new(0)),
            tasks_spawned: Arc::new(AtomicU64::new(0)),
            peak_batch_lines: Arc::new(AtomicU64::new(0)),
            matches_found: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a batch that has been read and is about to be dispatched
    pub fn record_batch(&self, lines: u64, end_offset: u64) {
        let batches = self.batches_processed.fetch_add(1, Ordering::Relaxed) + 1;
        self.lines_processed.fetch_add(lines, Ordering::Relaxed);
        self.bytes_processed.store(end_offset, Ordering::Relaxed);

        let mut peak = self.peak_batch_lines.load(Ordering::Relaxed);
        while lines > peak {
            match self.peak_batch_lines.compare_exchange_weak(
                peak,
                lines,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => peak = current,
            }
        }
        debug!("Batch {}: {} lines, {} bytes read", batches, lines, end_offset);
    }

    /// Records one counting task and what it found
    pub fn record_task(&self, found: u64) {
        self.tasks_spawned.fetch_add(1, Ordering::Relaxed);
        self.matches_found.fetch_add(found, Ordering::Relaxed);
    }

    /// Clears every counter for a new run
    pub fn reset(&self) {
        for counter in [
            &self.batches_processed,
            &self.lines_processed,
            &self.bytes_processed,
            &self.tasks_spawned,
            &self.peak_batch_lines,
            &self.matches_found,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn get_stats(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches: self.batches_processed.load(Ordering::Relaxed),
            lines: self.lines_processed.load(Ordering::Relaxed),
            bytes: self.bytes_processed.load(Ordering::Relaxed),
            tasks: self.tasks_spawned.load(Ordering::Relaxed),
            peak_batch_lines: self.peak_batch_lines.load(Ordering::Relaxed),
            matches: self.matches_found.load(Ordering::Relaxed),
        }
    }

    /// Logs current run statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Run stats:\n\
             Batches: {}\n\
             Lines: {}\n\
             Bytes: {}\n\
             Counting tasks: {}\n\
             Largest batch: {} lines\n\
             Matches: {}",
            stats.batches,
            stats.lines,
            stats.bytes,
            stats.tasks,
            stats.peak_batch_lines,
            stats.matches
        );
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`RunMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches: u64,
    pub lines: u64,
    pub bytes: u64,
    pub tasks: u64,
    pub peak_batch_lines: u64,
    pub matches: u64,
}
