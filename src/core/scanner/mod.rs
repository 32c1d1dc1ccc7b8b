//! # Scanner Module
//!
//! Enumerates regular files and directories under a root.
//!
//! ## Behavior
//! - Traversal is depth-first, children sorted by file name, so a
//!   given snapshot of the tree always yields the same order.
//! - Unreadable entries (permissions, races with deletion, broken
//!   symlinks) are skipped and reported through tracing and events.
//! - Paths listed in [`ScanConfig::excluded`] are pruned along with
//!   everything beneath them.
//!
//! ## Example
//! ```rust,ignore
//! let scanner = FileScanner::new(ScanConfig::default());
//! for file in scanner.scan(Path::new("/mnt/backup"), &null_sender())? {
//!     println!("{} ({} bytes)", file.path.display(), file.size);
//! }
//! ```

mod walker;

pub use walker::{DirIter, FileScanner, ScanIter};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// A regular file found by the scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
}

/// Configuration for the directory scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include entries whose name starts with `.`
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Paths pruned from the walk (holding area, log files)
    pub excluded: Vec<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            excluded: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Prune `path` and its subtree from the walk.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }
}
