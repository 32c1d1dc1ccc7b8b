//! Two-phase size/hash grouping.

use super::{DuplicateGroup, FileEntry};
use crate::core::hasher::{ContentHash, ContentHasher};
use crate::core::pipeline::CancellationToken;
use crate::core::scanner::ScannedFile;
use crate::error::HashError;
use crate::events::{Event, EventSender, HashEvent, Progress};
use std::collections::HashMap;
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Duplicate groups found in one scan, keyed by content hash
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    groups: Vec<DuplicateGroup>,
    files_scanned: usize,
    files_hashed: usize,
}

impl DuplicateIndex {
    /// Build the index from a scan.
    ///
    /// Files that fail to hash are dropped from their bucket and reported;
    /// the rest of the bucket is still grouped. Only cancellation is fatal.
    pub fn build<I>(
        files: I,
        hasher: &ContentHasher,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<Self, HashError>
    where
        I: IntoIterator<Item = ScannedFile>,
    {
        // Phase 1: size buckets, in order of first appearance.
        let mut by_size: HashMap<u64, Vec<FileEntry>> = HashMap::new();
        let mut size_order: Vec<u64> = Vec::new();
        let mut files_scanned = 0usize;

        for (seq, file) in files.into_iter().enumerate() {
            files_scanned += 1;
            let bucket = by_size.entry(file.size).or_insert_with(|| {
                size_order.push(file.size);
                Vec::new()
            });
            bucket.push(FileEntry::from_scan(file, seq));
        }

        let candidates: Vec<(u64, Vec<FileEntry>)> = size_order
            .into_iter()
            .filter_map(|size| by_size.remove(&size).map(|bucket| (size, bucket)))
            .filter(|(_, bucket)| bucket.len() > 1)
            .collect();

        let candidate_files: usize = candidates.iter().map(|(_, b)| b.len()).sum();
        events.send(Event::Hash(HashEvent::Started { candidate_files }));

        // Phase 2: split each size bucket by content hash.
        let mut groups = Vec::new();
        let mut files_hashed = 0usize;
        let mut processed = 0usize;
        let mut last_progress = Instant::now();

        for (size, bucket) in candidates {
            let mut by_hash: HashMap<ContentHash, Vec<FileEntry>> = HashMap::new();
            let mut hash_order: Vec<ContentHash> = Vec::new();

            for entry in bucket {
                if cancel.is_cancelled() {
                    return Err(HashError::Cancelled);
                }

                let hashed = entry.hash(hasher).map(|hash| hash.to_string());
                processed += 1;
                let now = Instant::now();
                if processed % 100 == 0 || now.duration_since(last_progress) >= PROGRESS_INTERVAL {
                    events.send(Event::Hash(HashEvent::Progress(Progress::new(
                        processed,
                        candidate_files,
                    ))));
                    last_progress = now;
                }

                let hash = match hashed {
                    Ok(hash) => hash,
                    Err(e) => {
                        tracing::warn!(path = %entry.path.display(), error = %e, "skipping unhashable file");
                        events.send(Event::Hash(HashEvent::Skipped {
                            path: entry.path.clone(),
                            message: e.to_string(),
                        }));
                        continue;
                    }
                };
                files_hashed += 1;

                by_hash
                    .entry(hash.clone())
                    .or_insert_with(|| {
                        hash_order.push(hash);
                        Vec::new()
                    })
                    .push(entry);
            }

            for hash in hash_order {
                if let Some(members) = by_hash.remove(&hash) {
                    if members.len() > 1 {
                        groups.push(DuplicateGroup::new(hash, size, members));
                    }
                }
            }
        }

        events.send(Event::Hash(HashEvent::Progress(Progress::new(
            processed,
            candidate_files,
        ))));
        groups.sort_by_key(|g| g.files[0].seq);

        events.send(Event::Hash(HashEvent::Completed {
            files_hashed,
            groups: groups.len(),
        }));
        tracing::info!(
            files_scanned,
            files_hashed,
            groups = groups.len(),
            "duplicate index built"
        );

        Ok(Self {
            groups,
            files_scanned,
            files_hashed,
        })
    }

    /// Groups in order of their first member's discovery
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        self.groups
    }

    /// Look up a group by content hash
    pub fn get(&self, hash: &str) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.hash == hash)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Files fed into the size phase
    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    /// Files whose hash was actually computed
    pub fn files_hashed(&self) -> usize {
        self.files_hashed
    }

    /// Total bytes reclaimable across all groups
    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.reclaimable_bytes()).sum()
    }
}
