//! Saved filter lists.
//!
//! A filter list is a small JSON document:
//!
//! ```json
//! {
//!   "format": "logcount-filters",
//!   "version": 1,
//!   "filters": ["ERROR", "WARN", "timeout"]
//! }
//! ```
//!
//! The counting core only ever sees the ordered `filters` strings.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::errors::{CountError, CountResult};
use crate::filters::FilterSet;

pub const FORMAT_TAG: &str = "logcount-filters";
pub const CURRENT_VERSION: u32 = 1;

fn default_version() -> u32 {
    CURRENT_VERSION
}

/// On-disk representation of an ordered filter list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDocument {
    pub format: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub filters: Vec<String>,
}

impl Default for FilterDocument {
    fn default() -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            version: CURRENT_VERSION,
            filters: Vec::new(),
        }
    }
}

impl FilterDocument {
    pub fn new(filters: Vec<String>) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn from_filter_set(set: &FilterSet) -> Self {
        Self::new(set.patterns())
    }

    /// Builds a filter set, rejecting empty entries
    pub fn into_filter_set(self) -> CountResult<FilterSet> {
        FilterSet::from_patterns(self.filters)
    }

    /// Parses and checks the format tag and version
    pub fn from_json(json: &str) -> CountResult<Self> {
        let doc: Self = serde_json::from_str(json)?;
        if doc.format != FORMAT_TAG {
            return Err(CountError::config_error(format!(
                "unknown filter list format {:?}",
                doc.format
            )));
        }
        if doc.version > CURRENT_VERSION {
            return Err(CountError::config_error(format!(
                "filter list version {} is newer than supported version {}",
                doc.version, CURRENT_VERSION
            )));
        }
        Ok(doc)
    }

    pub fn load(path: &Path) -> CountResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| CountError::from_open_error(path, e))?;
        let doc = Self::from_json(&json)?;
        debug!("Loaded {} filters from {}", doc.filters.len(), path.display());
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> CountResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!("Saved {} filters to {}", self.filters.len(), path.display());
        Ok(())
    }
}
