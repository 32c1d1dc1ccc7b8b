//! # Core Module
//!
//! The UI-agnostic deduplication and merge engine.
//!
//! ## Modules
//! - `classify` - Maps file extensions to holding-area categories
//! - `hasher` - Streaming SHA-256 content hashes
//! - `scanner` - Walks directory trees
//! - `duplicates` - Groups files by size, then by content hash
//! - `folders` - Compares same-named directories
//! - `rename` - Collision-free destination names
//! - `actions` - Applies file and folder policies
//! - `merge` - Moves one tree into another
//! - `organize` - Deduplicates a single volume
//! - `log` - Append-only action log
//! - `pipeline` - Cancellation

pub mod actions;
pub mod classify;
pub mod duplicates;
pub mod folders;
pub mod fs_ops;
pub mod hasher;
pub mod log;
pub mod merge;
pub mod organize;
pub mod pipeline;
pub mod rename;
pub mod scanner;

// Re-export commonly used types
pub use actions::{ActionOutcome, ActionProcessor, BatchPolicy, FilePolicy, FolderPolicy};
pub use classify::Category;
pub use duplicates::{DuplicateGroup, DuplicateIndex, FileEntry};
pub use folders::{FolderCompareMode, FolderComparator, FolderPair};
pub use merge::{MergeConfig, MergeEngine, MergeStats};
pub use organize::{DecisionProvider, Discovery, OrganizeConfig, OrganizeReport, Organizer};
pub use pipeline::CancellationToken;
pub use scanner::{FileScanner, ScanConfig, ScannedFile};
