//! # Folders Module
//!
//! Finds directories that share a base name (case-insensitively) and
//! checks whether each such pair has the same immediate contents.
//!
//! ## Equality
//! Two directories are identical when their direct children have the
//! same names and kinds, and every same-named file matches under the
//! configured [`FolderCompareMode`]. Subdirectories are only matched by
//! name; their contents are not compared here (they show up as their
//! own candidates when a same-named twin exists elsewhere).

use crate::core::hasher::files_identical;
use crate::core::pipeline::CancellationToken;
use crate::core::scanner::{FileScanner, ScanConfig};
use crate::error::ScanError;
use crate::events::{CompareEvent, Event, EventSender, Progress};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// How same-named files inside two folders are judged equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderCompareMode {
    /// Equal size and modification time count as equal; otherwise the
    /// bytes are compared. Fast, but two files with matching size and
    /// mtime and different bytes are reported equal.
    Metadata,
    /// Byte-for-byte comparison of every same-named file.
    #[default]
    Content,
}

/// Outcome of comparing a folder pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderVerdict {
    Identical,
    Different,
}

/// Two same-named directories and their comparison verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderPair {
    /// Lowercased shared base name
    pub name: String,
    pub first: PathBuf,
    pub second: PathBuf,
    pub verdict: FolderVerdict,
}

impl FolderPair {
    pub fn is_identical(&self) -> bool {
        self.verdict == FolderVerdict::Identical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File { size: u64, modified: SystemTime },
    Dir,
    Other,
}

/// Compares same-named directories under a root
#[derive(Debug, Clone)]
pub struct FolderComparator {
    mode: FolderCompareMode,
    scanner: FileScanner,
}

impl FolderComparator {
    pub fn new(mode: FolderCompareMode, scan_config: ScanConfig) -> Self {
        Self {
            mode,
            scanner: FileScanner::new(scan_config),
        }
    }

    pub fn mode(&self) -> FolderCompareMode {
        self.mode
    }

    /// Directories under `root` grouped by lowercase name, keeping only
    /// names that occur more than once. Paths keep traversal order.
    pub fn index_by_name(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<BTreeMap<String, Vec<PathBuf>>, ScanError> {
        let mut by_name: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

        for dir in self.scanner.directories(root, events)? {
            if let Some(name) = dir.file_name() {
                let key = name.to_string_lossy().to_lowercase();
                by_name.entry(key).or_default().push(dir);
            }
        }

        by_name.retain(|_, paths| paths.len() > 1);
        Ok(by_name)
    }

    /// Compare every unordered same-named pair under `root` once.
    pub fn find_pairs(
        &self,
        root: &Path,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<Vec<FolderPair>, ScanError> {
        let index = self.index_by_name(root, events)?;
        self.compare_index(&index, events, cancel)
    }

    /// Compare every unordered pair within each name group of `index`.
    pub fn compare_index(
        &self,
        index: &BTreeMap<String, Vec<PathBuf>>,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<Vec<FolderPair>, ScanError> {
        let total: usize = index
            .values()
            .map(|paths| paths.len() * (paths.len() - 1) / 2)
            .sum();

        events.send(Event::Compare(CompareEvent::Started { total_pairs: total }));

        let mut pairs = Vec::with_capacity(total);
        let mut processed = 0usize;

        for (name, paths) in index {
            for i in 0..paths.len() {
                for j in (i + 1)..paths.len() {
                    if cancel.is_cancelled() {
                        return Err(ScanError::Cancelled);
                    }

                    let (first, second) = (&paths[i], &paths[j]);
                    let verdict = match self.compare(first, second) {
                        Ok(true) => FolderVerdict::Identical,
                        Ok(false) => FolderVerdict::Different,
                        Err(e) => {
                            tracing::warn!(
                                first = %first.display(),
                                second = %second.display(),
                                error = %e,
                                "could not compare folders"
                            );
                            FolderVerdict::Different
                        }
                    };

                    if verdict == FolderVerdict::Identical {
                        events.send(Event::Compare(CompareEvent::IdenticalFound {
                            first: first.clone(),
                            second: second.clone(),
                        }));
                    }

                    pairs.push(FolderPair {
                        name: name.clone(),
                        first: first.clone(),
                        second: second.clone(),
                        verdict,
                    });

                    processed += 1;
                    events.send(Event::Compare(CompareEvent::Progress(Progress::new(
                        processed, total,
                    ))));
                }
            }
        }

        events.send(Event::Compare(CompareEvent::Completed {
            identical_pairs: pairs.iter().filter(|p| p.is_identical()).count(),
        }));

        Ok(pairs)
    }

    /// Whether two directories have identical immediate contents.
    pub fn compare(&self, a: &Path, b: &Path) -> std::io::Result<bool> {
        let left = list_children(a)?;
        let right = list_children(b)?;

        if left.len() != right.len() || left.keys().any(|name| !right.contains_key(name)) {
            return Ok(false);
        }

        for (name, left_kind) in &left {
            let right_kind = right[name];
            match (*left_kind, right_kind) {
                (EntryKind::Dir, EntryKind::Dir) => {}
                (
                    EntryKind::File {
                        size: size_a,
                        modified: mtime_a,
                    },
                    EntryKind::File {
                        size: size_b,
                        modified: mtime_b,
                    },
                ) => {
                    if size_a != size_b {
                        return Ok(false);
                    }
                    let metadata_match = mtime_a == mtime_b;
                    let equal = match self.mode {
                        FolderCompareMode::Metadata if metadata_match => true,
                        _ => files_identical(&a.join(name), &b.join(name))?,
                    };
                    if !equal {
                        return Ok(false);
                    }
                }
                (EntryKind::Other, EntryKind::Other) => {}
                _ => return Ok(false),
            }
        }

        Ok(true)
    }
}

impl Default for FolderComparator {
    fn default() -> Self {
        Self::new(FolderCompareMode::default(), ScanConfig::default())
    }
}

fn list_children(dir: &Path) -> std::io::Result<HashMap<std::ffi::OsString, EntryKind>> {
    let mut children = HashMap::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let kind = if metadata.is_dir() {
            EntryKind::Dir
        } else if metadata.is_file() {
            EntryKind::File {
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            }
        } else {
            EntryKind::Other
        };
        children.insert(entry.file_name(), kind);
    }
    Ok(children)
}
