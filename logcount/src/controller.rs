//! Drives one analysis run from precondition checks to a terminal status.
//!
//! A run moves `Idle -> Running -> {Completed, Cancelled, Failed}`. The batch
//! loop is sequential on the caller's thread; parallelism lives entirely inside
//! [`Dispatcher::process_batch`]. The controller only talks to its caller
//! through the injected progress callback and cancel predicate.
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::dispatch::Dispatcher;
use crate::errors::{CountError, CountResult};
use crate::filters::FilterSet;
use crate::metrics::RunMetrics;
use crate::progress::ProgressTracker;
use crate::reader::ChunkReader;
use crate::results::{RunResult, RunStats, RunStatus};

/// Book-keeping for the current or most recent run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub filename: PathBuf,
    pub total_bytes: u64,
    pub bytes_consumed: u64,
    pub lines_consumed: u64,
    pub cancelled: bool,
    pub status: RunStatus,
}

/// Owns a filter set and runs analyses over it
#[derive(Debug)]
pub struct RunController {
    config: AnalysisConfig,
    filters: FilterSet,
    dispatcher: Dispatcher,
    state: RunState,
}

impl RunController {
    /// Creates a controller with an empty filter set
    pub fn new(config: AnalysisConfig) -> CountResult<Self> {
        Self::with_filters(config, FilterSet::new())
    }

    pub fn with_filters(config: AnalysisConfig, filters: FilterSet) -> CountResult<Self> {
        config.validate()?;
        let dispatcher = Dispatcher::with_metrics(config.thread_count, RunMetrics::new())?;
        Ok(Self {
            config,
            filters,
            dispatcher,
            state: RunState::default(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Mutable access for adding and removing filters between runs
    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn metrics(&self) -> &RunMetrics {
        self.dispatcher.metrics()
    }

    /// Runs one analysis of `path` over the current filters.
    ///
    /// `progress` receives percentages in `0..=100`, never decreasing.
    /// `cancel` is polled once per batch boundary; once it returns `true`, no
    /// further batches are read and all counts are reset to zero.
    pub fn run<P, F, C>(&mut self, path: P, progress: F, cancel: C) -> RunResult
    where
        P: AsRef<Path>,
        F: FnMut(u8),
        C: Fn() -> bool,
    {
        let path = path.as_ref();
        self.state = RunState {
            filename: path.to_path_buf(),
            ..RunState::default()
        };

        let reader = match self.check_preconditions(path) {
            Ok(reader) => reader,
            Err(e) => {
                warn!("Analysis not started: {}", e);
                self.state.status = RunStatus::Failed;
                return RunResult::failed(self.filters.patterns(), vec![0; self.filters.len()], e);
            }
        };

        self.execute(reader, progress, cancel)
    }

    /// Precondition checks, in order: filters, filename, existence, regular
    /// file, readability. Nothing is mutated until they all pass.
    fn check_preconditions(&self, path: &Path) -> CountResult<ChunkReader> {
        if self.filters.is_empty() {
            return Err(CountError::NoFilters);
        }
        if path.as_os_str().is_empty() {
            return Err(CountError::NoFile);
        }
        ChunkReader::open(path, self.config.buffer_size, self.config.encoding_mode)
    }

    fn execute<F, C>(&mut self, mut reader: ChunkReader, progress: F, cancel: C) -> RunResult
    where
        F: FnMut(u8),
        C: Fn() -> bool,
    {
        info!(
            "Running analysis of {} with {} filters",
            self.state.filename.display(),
            self.filters.len()
        );
        let start = Instant::now();
        self.state.status = RunStatus::Running;
        self.state.total_bytes = reader.total_bytes();
        self.filters.reset_counts();
        self.dispatcher.metrics().reset();

        let mut tracker = ProgressTracker::new(reader.total_bytes(), progress);
        let mut failure = None;

        loop {
            if cancel() {
                self.state.cancelled = true;
                break;
            }
            match reader.next() {
                Some(Ok(batch)) => {
                    self.dispatcher
                        .metrics()
                        .record_batch(batch.lines.len() as u64, batch.end_offset);
                    self.dispatcher.process_batch(&batch, &mut self.filters);
                    self.state.bytes_consumed = reader.bytes_consumed();
                    self.state.lines_consumed = reader.lines_consumed();
                    tracker.update(reader.bytes_consumed());
                }
                Some(Err(e)) => {
                    failure = Some(e);
                    break;
                }
                None => break,
            }
        }
        // Release the file before reporting
        drop(reader);

        let stats = RunStats {
            total_bytes: self.state.total_bytes,
            bytes_consumed: self.state.bytes_consumed,
            lines_consumed: self.state.lines_consumed,
            batches: self.dispatcher.metrics().get_stats().batches,
            duration: start.elapsed(),
        };
        self.dispatcher.metrics().log_stats();

        let (status, reason) = if self.state.cancelled {
            self.filters.reset_counts();
            info!("Analysis cancelled after {} lines", stats.lines_consumed);
            (RunStatus::Cancelled, Some(CountError::Cancelled.to_string()))
        } else if let Some(e) = failure {
            warn!("Analysis failed after {} lines: {}", stats.lines_consumed, e);
            (RunStatus::Failed, Some(e.to_string()))
        } else {
            tracker.finish();
            info!(
                "Analysis complete: {} lines in {:.3}s",
                stats.lines_consumed,
                stats.duration.as_secs_f64()
            );
            (RunStatus::Completed, None)
        };
        debug!("Run finished with status {}", status);
        self.state.status = status;

        RunResult {
            status,
            patterns: self.filters.patterns(),
            counts: self.filters.counts(),
            reason,
            stats,
        }
    }
}

/// Counts `patterns` in `file_path` with the default configuration.
///
/// # Example
///
/// ```rust,no_run
/// let result = logcount::run_analysis(
///     "server.log",
///     ["ERROR", "WARN"],
///     |pct| eprintln!("{}%", pct),
///     || false,
/// );
/// for pc in result.pattern_counts() {
///     println!("{}: {}", pc.pattern, pc.count);
/// }
/// ```
pub fn run_analysis<P, I, S, F, C>(file_path: P, patterns: I, progress: F, cancel: C) -> RunResult
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: FnMut(u8),
    C: Fn() -> bool,
{
    run_analysis_with(&AnalysisConfig::default(), file_path, patterns, progress, cancel)
}

/// [`run_analysis`] with an explicit configuration
pub fn run_analysis_with<P, I, S, F, C>(
    config: &AnalysisConfig,
    file_path: P,
    patterns: I,
    progress: F,
    cancel: C,
) -> RunResult
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: FnMut(u8),
    C: Fn() -> bool,
{
    let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
    let filters = match FilterSet::from_patterns(patterns.iter().cloned()) {
        Ok(filters) => filters,
        Err(e) => return RunResult::failed(patterns.clone(), vec![0; patterns.len()], e),
    };
    match RunController::with_filters(config.clone(), filters) {
        Ok(mut controller) => controller.run(file_path, progress, cancel),
        Err(e) => RunResult::failed(patterns.clone(), vec![0; patterns.len()], e),
    }
}
