//! Streaming multi-pattern occurrence counter.
//!
//! Reads a text file in batches of lines and counts, for every filter in an
//! ordered [`FilterSet`], the non-overlapping literal occurrences across all
//! lines. Each batch is counted in parallel (one task per filter) and fully
//! joined before the next batch is read, so memory stays bounded by one batch.
pub mod config;
pub mod controller;
pub mod counter;
pub mod dispatch;
pub mod errors;
pub mod filter_file;
pub mod filters;
pub mod metrics;
pub mod progress;
pub mod reader;
pub mod results;

pub use config::{AnalysisConfig, EncodingMode};
pub use controller::{run_analysis, run_analysis_with, RunController, RunState};
pub use errors::{CountError, CountResult};
pub use filter_file::FilterDocument;
pub use filters::{FilterEntry, FilterSet};
pub use progress::CancellationToken;
pub use results::{PatternCount, RunResult, RunStats, RunStatus};
