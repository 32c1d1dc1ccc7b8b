//! Types for the actions module.

use crate::error::{ActionError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with a duplicate file group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePolicy {
    /// Leave every copy where it is
    #[default]
    KeepAll,
    /// Keep the first-discovered copy, set the rest aside
    KeepFirst,
    /// Keep the copy at this index, set the rest aside
    KeepSelected(usize),
    /// Copy every member into the holding area, originals untouched
    DuplicateAll,
}

impl FilePolicy {
    /// Index of the copy that stays in place, if any member moves
    pub fn kept_index(&self) -> Option<usize> {
        match self {
            FilePolicy::KeepFirst => Some(0),
            FilePolicy::KeepSelected(index) => Some(*index),
            FilePolicy::KeepAll | FilePolicy::DuplicateAll => None,
        }
    }
}

impl std::fmt::Display for FilePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilePolicy::KeepAll => write!(f, "keep all"),
            FilePolicy::KeepFirst => write!(f, "keep first"),
            FilePolicy::KeepSelected(i) => write!(f, "keep #{}", i + 1),
            FilePolicy::DuplicateAll => write!(f, "copy all to holding area"),
        }
    }
}

/// What to do with a pair of same-named folders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderPolicy {
    /// Leave both folders
    #[default]
    KeepBoth,
    /// Delete the second folder
    KeepFirst,
    /// Delete the first folder
    KeepSecond,
    /// Move the second folder's entries into the first, then remove it
    Merge,
}

impl std::fmt::Display for FolderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FolderPolicy::KeepBoth => write!(f, "keep both"),
            FolderPolicy::KeepFirst => write!(f, "keep first"),
            FolderPolicy::KeepSecond => write!(f, "keep second"),
            FolderPolicy::Merge => write!(f, "merge"),
        }
    }
}

/// Stored decisions for unattended runs.
///
/// `None` means "ask for each group / pair".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchPolicy {
    pub files: Option<FilePolicy>,
    pub folders: Option<FolderPolicy>,
}

impl BatchPolicy {
    /// Load a policy document from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Tally of what a disposition did
#[derive(Debug, Default)]
pub struct ActionOutcome {
    /// Files moved into the holding area
    pub set_aside: usize,
    /// Files copied into the holding area
    pub copied: usize,
    /// Entries moved between folders during a folder merge
    pub moved: usize,
    /// Folders (or redundant identical files) deleted
    pub removed: usize,
    /// Per-item failures; processing continued past each one
    pub errors: Vec<ActionError>,
}

impl ActionOutcome {
    /// Fold another outcome into this one.
    pub fn absorb(&mut self, other: ActionOutcome) {
        self.set_aside += other.set_aside;
        self.copied += other.copied;
        self.moved += other.moved;
        self.removed += other.removed;
        self.errors.extend(other.errors);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
