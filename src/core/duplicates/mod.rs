//! # Duplicates Module
//!
//! Finds byte-identical files.
//!
//! ## How It Works
//! 1. Bucket every scanned file by exact size; singleton buckets are
//!    dropped since a file with a unique size cannot have a twin.
//! 2. Hash only the files in buckets of two or more and split each
//!    bucket again by content hash.
//! 3. Keep the hash buckets that still hold two or more files.
//!
//! Hashing is the expensive step, so it is limited to files that
//! already collide on size.

mod index;

pub use index::DuplicateIndex;

use crate::core::hasher::{ContentHash, ContentHasher};
use crate::core::scanner::ScannedFile;
use crate::error::HashError;
use serde::Serialize;
use std::cell::OnceCell;
use std::path::PathBuf;
use std::time::SystemTime;
use uuid::Uuid;

/// A scanned file whose content hash is computed on first use
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Absolute path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
    #[serde(skip)]
    hash: OnceCell<ContentHash>,
    #[serde(skip)]
    seq: usize,
}

impl FileEntry {
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
            hash: OnceCell::new(),
            seq: 0,
        }
    }

    fn from_scan(file: ScannedFile, seq: usize) -> Self {
        Self {
            path: file.path,
            size: file.size,
            modified: file.modified,
            hash: OnceCell::new(),
            seq,
        }
    }

    /// Content hash, computed at most once per entry.
    pub fn hash(&self, hasher: &ContentHasher) -> Result<&str, HashError> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        let computed = hasher.hash_file(&self.path)?;
        Ok(self.hash.get_or_init(|| computed))
    }

    /// Hash if it has already been computed
    pub fn cached_hash(&self) -> Option<&str> {
        self.hash.get().map(String::as_str)
    }
}

/// Two or more files with the same size and content hash
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    /// Unique identifier for this group
    pub id: Uuid,
    /// Shared content hash
    pub hash: ContentHash,
    /// Shared size in bytes
    pub size: u64,
    /// Members in discovery order
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    pub fn new(hash: ContentHash, size: u64, files: Vec<FileEntry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            hash,
            size,
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of redundant copies (all but one)
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes reclaimable by keeping a single copy
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter().map(|f| &f.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn hash_is_computed_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "first").unwrap();

        let entry = FileEntry::new(path.clone(), 5, SystemTime::UNIX_EPOCH);
        assert!(entry.cached_hash().is_none());

        let hasher = ContentHasher::new();
        let first = entry.hash(&hasher).unwrap().to_string();

        // Changing the file afterwards does not change the memoized hash.
        fs::write(&path, "other").unwrap();
        assert_eq!(entry.hash(&hasher).unwrap(), first);
        assert_eq!(entry.cached_hash(), Some(first.as_str()));
    }

    #[test]
    fn group_counts_exclude_one_copy() {
        let files = vec![
            FileEntry::new(PathBuf::from("/a"), 10, SystemTime::UNIX_EPOCH),
            FileEntry::new(PathBuf::from("/b"), 10, SystemTime::UNIX_EPOCH),
            FileEntry::new(PathBuf::from("/c"), 10, SystemTime::UNIX_EPOCH),
        ];
        let group = DuplicateGroup::new("abc".to_string(), 10, files);

        assert_eq!(group.duplicate_count(), 2);
        assert_eq!(group.reclaimable_bytes(), 20);
    }
}
