//! Progress reporting out of a run and cancellation requests into it.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared cancel flag.
///
/// Clones observe the same flag, so one copy can be handed to a signal handler
/// or another thread while the run polls [`is_cancelled`](Self::is_cancelled)
/// at every batch boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            debug!("Cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns the token as a cancel predicate for [`run_analysis`](crate::run_analysis)
    pub fn as_predicate(&self) -> impl Fn() -> bool + '_ {
        move || self.is_cancelled()
    }
}

/// Percentage of `total` covered by `consumed`, clamped to `0..=100`.
///
/// An empty source counts as fully consumed.
pub fn percent(consumed: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (consumed as u128 * 100) / total as u128;
    pct.min(100) as u8
}

/// Turns byte positions into monotonic percent updates.
///
/// The callback fires only when the integer percentage grows, so a caller never
/// sees progress go backwards or the same value twice.
pub struct ProgressTracker<F: FnMut(u8)> {
    callback: F,
    total_bytes: u64,
    last: Option<u8>,
}

impl<F: FnMut(u8)> ProgressTracker<F> {
    pub fn new(total_bytes: u64, callback: F) -> Self {
        Self {
            callback,
            total_bytes,
            last: None,
        }
    }

    /// Reports progress for `bytes_consumed`
    pub fn update(&mut self, bytes_consumed: u64) {
        let pct = if self.total_bytes == 0 {
            0
        } else {
            percent(bytes_consumed, self.total_bytes)
        };
        self.emit(pct);
    }

    /// Reports 100%
    pub fn finish(&mut self) {
        self.emit(100);
    }

    fn emit(&mut self, pct: u8) {
        if self.last.map_or(true, |last| pct > last) {
            self.last = Some(pct);
            (self.callback)(pct);
        }
    }
}
