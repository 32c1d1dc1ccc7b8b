//! # Error Module
//!
//! Error types for the drive deduplication and merge engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Fatal vs. per-item** - only precondition failures abort a run;
//!   everything else is collected and reported alongside the results

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DriveDedupError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that occur while walking a directory tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan was cancelled")]
    Cancelled,
}

/// Errors that occur while hashing file contents
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hashing was cancelled")]
    Cancelled,
}

/// Errors from a single filesystem mutation.
///
/// These are collected per item and never abort the surrounding run.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Failed to move {from} -> {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} -> {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compare {left} with {right}: {source}")]
    Compare {
        left: PathBuf,
        right: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot keep entry {index}: group only has {len} files")]
    InvalidSelection { index: usize, len: usize },

    #[error("Path no longer exists: {path}")]
    Missing { path: PathBuf },

    #[error("{inner} lies inside {outer}; refusing to act on nested folders")]
    NestedFolders { outer: PathBuf, inner: PathBuf },

    #[error("Failed to write action log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation was cancelled")]
    Cancelled,
}

/// Errors that abort a merge before (or while) it runs
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Merge root does not exist: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Source and destination are the same directory: {path}")]
    SameRoot { path: PathBuf },

    #[error("{inner} lies inside {outer}; merge roots must not be nested")]
    NestedRoots { outer: PathBuf, inner: PathBuf },

    #[error("Failed to open action log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] ScanError),

    #[error("Merge was cancelled")]
    Cancelled,
}

/// Errors loading stored configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DriveDedupError>;
