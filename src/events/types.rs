//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Hashing phase events
    Hash(HashEvent),
    /// Folder comparison events
    Compare(CompareEvent),
    /// Disposition of duplicate groups and folder pairs
    Action(ActionEvent),
    /// Drive merge events
    Merge(MergeEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
    /// Human-readable status line
    Message { text: String },
}

/// Progress counter shared by every phase.
///
/// `total` may be zero when there is nothing to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(processed: usize, total: usize) -> Self {
        Self { processed, total }
    }

    /// Completion ratio in `0.0..=1.0`; an empty phase counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.processed as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf, total_files: usize },
    /// Progress update during scanning
    Progress(Progress),
    /// A file could not be read and was skipped
    Skipped { path: PathBuf, message: String },
    /// Scanning completed
    Completed { files_found: usize },
}

/// Events during the hashing phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Hashing has started over the size-colliding buckets
    Started { candidate_files: usize },
    /// Candidate files hashed so far, throttled
    Progress(Progress),
    /// A file could not be hashed and was dropped from its bucket
    Skipped { path: PathBuf, message: String },
    /// Hashing completed
    Completed { files_hashed: usize, groups: usize },
}

/// Events during folder comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started { total_pairs: usize },
    /// Progress update during comparison
    Progress(Progress),
    /// A pair of identical folders was found
    IdenticalFound { first: PathBuf, second: PathBuf },
    /// Comparison completed
    Completed { identical_pairs: usize },
}

/// Events emitted while applying dispositions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionEvent {
    /// A file or directory was mutated
    Applied { line: String },
    /// A single mutation failed; processing continues
    Failed { message: String },
    /// Progress across groups or pairs
    Progress(Progress),
}

/// Events emitted by the merge engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MergeEvent {
    /// Merge has started
    Started {
        destination: PathBuf,
        source: PathBuf,
        total_files: usize,
    },
    /// Progress after each file
    Progress(Progress),
    /// A file was placed; `line` matches the action log entry
    FileHandled { line: String },
    /// A file could not be placed; the merge continues
    FileFailed { path: PathBuf, message: String },
    /// Merge completed
    Completed {
        moved: usize,
        duplicates: usize,
        folders_created: usize,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed,
    /// Pipeline was cancelled
    Cancelled,
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    IndexingFolders,
    ComparingFolders,
    ResolvingFolders,
    Scanning,
    Hashing,
    ResolvingFiles,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::IndexingFolders => write!(f, "Indexing folders"),
            PipelinePhase::ComparingFolders => write!(f, "Comparing folders"),
            PipelinePhase::ResolvingFolders => write!(f, "Resolving folders"),
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Hashing => write!(f, "Hashing"),
            PipelinePhase::ResolvingFiles => write!(f, "Resolving duplicates"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Merge(MergeEvent::Progress(Progress::new(3, 10)));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Merge(MergeEvent::Progress(p)) => {
                assert_eq!(p.processed, 3);
                assert_eq!(p.total, 10);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn progress_tolerates_zero_total() {
        assert_eq!(Progress::new(0, 0).fraction(), 1.0);
        assert_eq!(Progress::new(1, 4).fraction(), 0.25);
    }
}
