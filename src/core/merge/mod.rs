//! # Merge Module
//!
//! Moves everything under a source tree into a destination tree.
//!
//! ## Placement rules
//! For each source file at relative path `p`:
//! - nothing at `dest/p`: the file is moved there
//! - a byte-identical file at `dest/p`: the source copy goes to the
//!   holding area, `dest/Duplicate Files/<Category>/`
//! - a different file (or a directory) at `dest/p`: the file is moved
//!   next to it under a suffixed name (`name_1.ext`)
//!
//! Directories are mirrored first, and emptied source directories are
//! removed afterwards. The source root itself is left in place, so a
//! second run against the same pair does nothing.

mod types;

pub use types::*;

use crate::core::actions::HoldingArea;
use crate::core::fs_ops;
use crate::core::hasher::files_identical;
use crate::core::log::ActionLog;
use crate::core::pipeline::CancellationToken;
use crate::core::rename::resolve_collision;
use crate::error::{ActionError, MergeError, ScanError};
use crate::events::{Event, EventSender, MergeEvent, Progress};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const MERGE_MODE: &str = "set-aside-identical";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Moved,
    Duplicate,
    Renamed,
}

impl Placement {
    fn label(self) -> &'static str {
        match self {
            Placement::Moved => "moved",
            Placement::Duplicate => "duplicate",
            Placement::Renamed => "renamed",
        }
    }
}

/// Merges one directory tree into another
pub struct MergeEngine {
    config: MergeConfig,
}

impl MergeEngine {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Verify both roots exist, differ, and do not contain each other.
    pub fn check(&self) -> Result<(), MergeError> {
        let dest = canonical_root(&self.config.destination)?;
        let source = canonical_root(&self.config.source)?;

        if dest == source {
            return Err(MergeError::SameRoot { path: dest });
        }
        if source.starts_with(&dest) {
            return Err(MergeError::NestedRoots {
                outer: dest,
                inner: source,
            });
        }
        if dest.starts_with(&source) {
            return Err(MergeError::NestedRoots {
                outer: source,
                inner: dest,
            });
        }
        Ok(())
    }

    /// Run the merge.
    ///
    /// Fails only on a broken precondition, an unopenable log, or
    /// cancellation. Per-file failures land in [`MergeStats::errors`].
    pub fn run(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<MergeStats, MergeError> {
        self.check()?;

        let source = &self.config.source;
        let dest = &self.config.destination;
        let (entries, skipped) = self.collect_source()?;
        let total_files = entries.iter().filter(|e| !e.file_type().is_dir()).count();

        events.send(Event::Merge(MergeEvent::Started {
            destination: dest.clone(),
            source: source.clone(),
            total_files,
        }));

        let mut stats = MergeStats::default();

        if entries.is_empty() && skipped.is_empty() {
            tracing::info!(source = %source.display(), "nothing to merge");
            events.message(format!("Nothing to merge in {}", source.display()));
            self.complete(events, &stats);
            return Ok(stats);
        }

        let log_path = self.config.log_path();
        let log_err = |source| MergeError::Log {
            path: log_path.clone(),
            source,
        };
        let mut log = ActionLog::open(&log_path).map_err(log_err)?;
        log.header("merge", source, dest, MERGE_MODE).map_err(log_err)?;
        events.message(format!(
            "Merging {} files from {} into {}",
            total_files,
            source.display(),
            dest.display()
        ));

        for (path, message) in &skipped {
            log.line(&format!("skipped: {} ({})", path.display(), message));
            events.send(Event::Merge(MergeEvent::FileFailed {
                path: path.clone(),
                message: message.clone(),
            }));
        }

        let holding = HoldingArea::new(self.config.holding_root());
        let mut processed = 0usize;

        for entry in &entries {
            if cancel.is_cancelled() {
                log.line("merge cancelled");
                tracing::info!(processed, total_files, "merge cancelled");
                return Err(MergeError::Cancelled);
            }

            let Some(relative) = self.config.relative(entry.path()) else {
                continue;
            };
            let target = dest.join(relative);

            if entry.file_type().is_dir() {
                match fs_ops::ensure_dir(&target) {
                    Ok(true) => {
                        log.line(&format!("created folder: {}", target.display()));
                        stats.folders_created += 1;
                    }
                    Ok(false) => {}
                    Err(e) => file_failed(&mut log, events, &mut stats, entry.path(), e),
                }
                continue;
            }

            match self.place_file(entry.path(), &target, &holding) {
                Ok((placement, landed)) => {
                    match placement {
                        Placement::Duplicate => stats.duplicates += 1,
                        Placement::Moved | Placement::Renamed => stats.moved += 1,
                    }
                    let line = log.action(placement.label(), entry.path(), &landed);
                    tracing::debug!("{}", line);
                    events.send(Event::Merge(MergeEvent::FileHandled { line }));
                }
                Err(e) => file_failed(&mut log, events, &mut stats, entry.path(), e),
            }

            processed += 1;
            events.send(Event::Merge(MergeEvent::Progress(Progress::new(
                processed,
                total_files,
            ))));
        }

        events.message("Removing emptied source folders");
        self.remove_empty_dirs(&mut log);

        log.line(&format!(
            "=== merge finished | moved: {} | duplicates: {} | folders created: {} | errors: {} ===",
            stats.moved,
            stats.duplicates,
            stats.folders_created,
            stats.errors.len()
        ));
        tracing::info!(
            moved = stats.moved,
            duplicates = stats.duplicates,
            folders_created = stats.folders_created,
            errors = stats.errors.len(),
            "merge finished"
        );
        events.message(format!(
            "Merge finished: {} moved, {} duplicates set aside, {} errors",
            stats.moved,
            stats.duplicates,
            stats.errors.len()
        ));
        self.complete(events, &stats);
        Ok(stats)
    }

    // Walk the source tree up front so the total is known before any move.
    fn collect_source(&self) -> Result<(Vec<DirEntry>, Vec<(PathBuf, String)>), MergeError> {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        let walker = WalkDir::new(&self.config.source)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for result in walker {
            match result {
                Ok(entry) => entries.push(entry),
                Err(e) if e.depth() == 0 => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    return Err(MergeError::Walk(ScanError::ReadEntry {
                        path,
                        source: e.into(),
                    }));
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    skipped.push((path, e.to_string()));
                }
            }
        }

        Ok((entries, skipped))
    }

    fn place_file(
        &self,
        file: &Path,
        target: &Path,
        holding: &HoldingArea,
    ) -> Result<(Placement, PathBuf), ActionError> {
        let existing = match target.symlink_metadata() {
            Err(_) => {
                fs_ops::move_file(file, target)?;
                return Ok((Placement::Moved, target.to_path_buf()));
            }
            Ok(meta) => meta,
        };

        if existing.is_file() {
            let identical = files_identical(file, target).map_err(|source| ActionError::Compare {
                left: file.to_path_buf(),
                right: target.to_path_buf(),
                source,
            })?;
            if identical {
                let landed = holding.relocate(file)?;
                return Ok((Placement::Duplicate, landed));
            }
        }

        let dir = target.parent().unwrap_or(&self.config.destination);
        let name = file.file_name().ok_or_else(|| ActionError::Missing {
            path: file.to_path_buf(),
        })?;
        let renamed = resolve_collision(dir, name);
        fs_ops::move_file(file, &renamed)?;
        Ok((Placement::Renamed, renamed))
    }

    fn remove_empty_dirs(&self, log: &mut ActionLog) {
        let dirs: Vec<PathBuf> = WalkDir::new(&self.config.source)
            .min_depth(1)
            .contents_first(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect();

        for dir in dirs {
            match fs::remove_dir(&dir) {
                Ok(()) => log.line(&format!("removed empty folder: {}", dir.display())),
                Err(e) => tracing::debug!(path = %dir.display(), error = %e, "folder left in place"),
            }
        }
    }

    fn complete(&self, events: &EventSender, stats: &MergeStats) {
        events.send(Event::Merge(MergeEvent::Completed {
            moved: stats.moved,
            duplicates: stats.duplicates,
            folders_created: stats.folders_created,
        }));
    }
}

fn canonical_root(path: &Path) -> Result<PathBuf, MergeError> {
    if !path.is_dir() {
        return Err(MergeError::RootNotFound {
            path: path.to_path_buf(),
        });
    }
    path.canonicalize().map_err(|_| MergeError::RootNotFound {
        path: path.to_path_buf(),
    })
}

fn file_failed(
    log: &mut ActionLog,
    events: &EventSender,
    stats: &mut MergeStats,
    path: &Path,
    error: ActionError,
) {
    let message = error.to_string();
    tracing::warn!("{}", message);
    log.line(&format!("error: {}", message));
    events.send(Event::Merge(MergeEvent::FileFailed {
        path: path.to_path_buf(),
        message,
    }));
    stats.errors.push(error);
}
