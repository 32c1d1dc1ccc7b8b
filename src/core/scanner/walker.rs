//! Directory walking implementation using walkdir.

use super::{ScanConfig, ScannedFile};
use crate::error::ScanError;
use crate::events::{Event, EventSender, Progress, ScanEvent};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use walkdir::{DirEntry, WalkDir};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

type EntryIter = Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + Send>;

/// Scanner implementation using the walkdir crate
#[derive(Debug, Clone, Default)]
pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Lazily enumerate every regular file under `root`.
    ///
    /// Files are counted up front so progress events carry a total.
    pub fn scan(&self, root: &Path, events: &EventSender) -> Result<ScanIter, ScanError> {
        let total = self.count_files(root)?;
        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
            total_files: total,
        }));

        Ok(ScanIter {
            inner: self.entries(root),
            events: events.clone(),
            found: 0,
            total,
            last_progress: Instant::now(),
            finished: false,
        })
    }

    /// Lazily enumerate every directory strictly below `root`.
    pub fn directories(&self, root: &Path, events: &EventSender) -> Result<DirIter, ScanError> {
        check_root(root)?;
        Ok(DirIter {
            inner: self.entries(root),
            events: events.clone(),
        })
    }

    /// Count the regular files `scan` would visit, without reading metadata.
    pub fn count_files(&self, root: &Path) -> Result<usize, ScanError> {
        check_root(root)?;
        Ok(self
            .entries(root)
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count())
    }

    fn entries(&self, root: &Path) -> EntryIter {
        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let excluded = self.config.excluded.clone();

        Box::new(walker.into_iter().filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            if excluded.iter().any(|p| p.as_path() == entry.path()) {
                return false;
            }
            if !include_hidden {
                let hidden = entry
                    .file_name()
                    .to_str()
                    .map(|n| n.starts_with('.'))
                    .unwrap_or(false);
                if hidden {
                    return false;
                }
            }
            true
        }))
    }
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    if !root.is_dir() {
        return Err(ScanError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

fn walk_error(e: walkdir::Error) -> ScanError {
    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
    if e.io_error().map(|e| e.kind()) == Some(std::io::ErrorKind::PermissionDenied) {
        ScanError::PermissionDenied { path }
    } else {
        ScanError::ReadEntry {
            path,
            source: std::io::Error::other(e.to_string()),
        }
    }
}

fn report_skip(events: &EventSender, path: PathBuf, error: &ScanError) {
    tracing::warn!(path = %path.display(), error = %error, "skipping unreadable entry");
    events.send(Event::Scan(ScanEvent::Skipped {
        path,
        message: error.to_string(),
    }));
}

/// Single-pass iterator over the regular files below a root.
pub struct ScanIter {
    inner: EntryIter,
    events: EventSender,
    found: usize,
    total: usize,
    last_progress: Instant,
    finished: bool,
}

impl ScanIter {
    /// Number of files the up-front count saw
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for ScanIter {
    type Item = ScannedFile;

    fn next(&mut self) -> Option<ScannedFile> {
        loop {
            let entry = match self.inner.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    report_skip(&self.events, path, &walk_error(e));
                    continue;
                }
                None => {
                    if !self.finished {
                        self.finished = true;
                        self.events.send(Event::Scan(ScanEvent::Progress(Progress::new(
                            self.found, self.total,
                        ))));
                        self.events.send(Event::Scan(ScanEvent::Completed {
                            files_found: self.found,
                        }));
                    }
                    return None;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    let path = entry.path().to_path_buf();
                    report_skip(&self.events, path, &walk_error(e));
                    continue;
                }
            };

            self.found += 1;
            let now = Instant::now();
            if self.found % 100 == 0 || now.duration_since(self.last_progress) >= PROGRESS_INTERVAL
            {
                self.events.send(Event::Scan(ScanEvent::Progress(Progress::new(
                    self.found, self.total,
                ))));
                self.last_progress = now;
            }

            return Some(ScannedFile {
                path: entry.into_path(),
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
    }
}

/// Single-pass iterator over directories below a root (root excluded).
pub struct DirIter {
    inner: EntryIter,
    events: EventSender,
}

impl Iterator for DirIter {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.inner.next()? {
                Ok(entry) if entry.depth() > 0 && entry.file_type().is_dir() => {
                    return Some(entry.into_path());
                }
                Ok(_) => continue,
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    report_skip(&self.events, path, &walk_error(e));
                }
            }
        }
    }
}
