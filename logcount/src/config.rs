use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{CountError, CountResult};

/// Default number of lines grouped into one batch
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// How to handle invalid UTF-8 in the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Replace invalid sequences with U+FFFD and keep counting
    #[default]
    Lossy,
    /// Stop the run at the first invalid line
    FailFast,
}

/// Tuning knobs for an analysis run.
///
/// # Configuration Locations
///
/// Loaded from these locations, later ones overriding earlier ones:
/// 1. Global `$HOME/.config/logcount/config.yaml`
/// 2. Local `.logcount.yaml` in the current directory
/// 3. Custom config file specified via `--config`
///
/// # Configuration Format
///
/// ```yaml
/// # Lines per batch
/// buffer_size: 100
///
/// # Counting threads (default: CPU cores)
/// thread_count: 4
///
/// # Invalid UTF-8 handling (lossy, failfast)
/// encoding_mode: "lossy"
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// Command-line arguments take precedence over file values, see
/// [`merge_with_cli`](AnalysisConfig::merge_with_cli).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum number of lines per batch
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Number of threads the dispatcher counts on
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            thread_count: default_thread_count(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl AnalysisConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("logcount/config.yaml")),
            Some(PathBuf::from(".logcount.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }

    /// Applies command-line overrides on top of file values
    pub fn merge_with_cli(
        mut self,
        buffer_size: Option<usize>,
        thread_count: Option<NonZeroUsize>,
        encoding_mode: Option<EncodingMode>,
        log_level: Option<String>,
    ) -> Self {
        if let Some(size) = buffer_size {
            self.buffer_size = size;
        }
        if let Some(threads) = thread_count {
            self.thread_count = threads;
        }
        if let Some(mode) = encoding_mode {
            self.encoding_mode = mode;
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self
    }

    pub fn validate(&self) -> CountResult<()> {
        if self.buffer_size == 0 {
            return Err(CountError::config_error("buffer_size must be at least 1"));
        }
        Ok(())
    }
}
