//! Types for the merge module.

use crate::core::actions::HOLDING_DIR_NAME;
use crate::error::ActionError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the merge log written at the destination root
pub const MERGE_LOG_NAME: &str = "merge_log.txt";

/// Configuration for one merge run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Tree that receives everything
    pub destination: PathBuf,
    /// Tree that is emptied into `destination`
    pub source: PathBuf,
    /// Holding folder created under `destination` for identical files
    #[serde(default = "default_holding_dir")]
    pub holding_dir_name: String,
    /// Log file name under `destination`
    #[serde(default = "default_log_name")]
    pub log_name: String,
}

fn default_holding_dir() -> String {
    HOLDING_DIR_NAME.to_string()
}

fn default_log_name() -> String {
    MERGE_LOG_NAME.to_string()
}

impl MergeConfig {
    pub fn new(destination: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            source: source.into(),
            holding_dir_name: default_holding_dir(),
            log_name: default_log_name(),
        }
    }

    pub fn holding_dir_name(mut self, name: impl Into<String>) -> Self {
        self.holding_dir_name = name.into();
        self
    }

    pub fn log_name(mut self, name: impl Into<String>) -> Self {
        self.log_name = name.into();
        self
    }

    pub fn holding_root(&self) -> PathBuf {
        self.destination.join(&self.holding_dir_name)
    }

    pub fn log_path(&self) -> PathBuf {
        self.destination.join(&self.log_name)
    }

    pub(crate) fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.source).ok()
    }
}

/// Counters for one merge run
#[derive(Debug, Default)]
pub struct MergeStats {
    /// Files placed in the destination, under their own or a suffixed name
    pub moved: usize,
    /// Byte-identical files set aside into the holding area
    pub duplicates: usize,
    /// Destination directories that did not exist before the run
    pub folders_created: usize,
    /// Per-file failures; the merge continued past each one
    pub errors: Vec<ActionError>,
}

impl MergeStats {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Files the merge touched successfully
    pub fn files_handled(&self) -> usize {
        self.moved + self.duplicates
    }
}
