//! # Organize Module
//!
//! Deduplicates a single volume in place.
//!
//! ## Order of work
//! 1. Index directories by lowercase name and compare same-named pairs
//! 2. Apply a [`FolderPolicy`] to each identical pair
//! 3. Scan the volume again and group duplicate files
//! 4. Apply a [`FilePolicy`](crate::core::actions::FilePolicy) to each group
//!
//! Files are grouped after folder actions so groups never point at
//! folders that were just removed or merged. The holding area and the
//! log are never scanned.

mod types;

pub use types::*;

use crate::core::actions::{ActionOutcome, ActionProcessor, FolderPolicy, HoldingArea};
use crate::core::duplicates::DuplicateIndex;
use crate::core::folders::{FolderComparator, FolderPair};
use crate::core::hasher::ContentHasher;
use crate::core::log::ActionLog;
use crate::core::pipeline::CancellationToken;
use crate::core::scanner::{FileScanner, ScannedFile};
use crate::error::{ActionError, Result, ScanError};
use crate::events::{ActionEvent, Event, EventSender, PipelineEvent, PipelinePhase, Progress};

/// Runs discovery and disposition over one volume
pub struct Organizer {
    config: OrganizeConfig,
    hasher: ContentHasher,
}

impl Organizer {
    pub fn new(config: OrganizeConfig) -> Self {
        Self {
            config,
            hasher: ContentHasher::new(),
        }
    }

    pub fn config(&self) -> &OrganizeConfig {
        &self.config
    }

    /// Find identical folders and duplicate files without changing anything.
    pub fn find(&self, events: &EventSender, cancel: &CancellationToken) -> Result<Discovery> {
        events.send(Event::Pipeline(PipelineEvent::Started));
        let result = self.discover(events, cancel);
        finish(events, cancel, &result);
        result
    }

    /// Find and act, asking `decisions` for every identical folder pair
    /// and every duplicate group.
    pub fn run(
        &self,
        decisions: &mut dyn DecisionProvider,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<OrganizeReport> {
        events.send(Event::Pipeline(PipelineEvent::Started));
        let result = self.organize(decisions, events, cancel);
        finish(events, cancel, &result);
        result
    }

    fn discover(&self, events: &EventSender, cancel: &CancellationToken) -> Result<Discovery> {
        let folder_pairs = self.folder_pairs(events, cancel)?;
        let index = self.duplicate_index(events, cancel)?;

        Ok(Discovery {
            folder_pairs,
            files_scanned: index.files_scanned(),
            files_hashed: index.files_hashed(),
            groups: index.into_groups(),
        })
    }

    fn organize(
        &self,
        decisions: &mut dyn DecisionProvider,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<OrganizeReport> {
        let root = &self.config.root;
        let holding = HoldingArea::new(self.config.holding_root());
        let pairs = self.folder_pairs(events, cancel)?;

        let log_path = self.config.log_path();
        let log_err = |source| ActionError::Log {
            path: log_path.clone(),
            source,
        };
        let mut log = ActionLog::open(&log_path).map_err(log_err)?;
        log.header("organize", root, holding.root(), decisions.mode())
            .map_err(log_err)?;
        let mut processor = ActionProcessor::new(holding, log);

        let mut report = OrganizeReport {
            folder_pairs: pairs.len(),
            identical_folders: pairs.iter().filter(|p| p.is_identical()).count(),
            ..Default::default()
        };

        phase(events, PipelinePhase::ResolvingFolders);
        report.folders = self.resolve_folders(&pairs, decisions, &mut processor, events, cancel)?;

        let index = self.duplicate_index(events, cancel)?;
        report.groups = index.len();
        report.files_scanned = index.files_scanned();

        phase(events, PipelinePhase::ResolvingFiles);
        let total = index.len();
        for (i, group) in index.groups().iter().enumerate() {
            let policy = decisions.file_policy(group);
            let outcome = processor.apply_to_group(group, policy, events, cancel)?;
            report.files.absorb(outcome);
            events.send(Event::Action(ActionEvent::Progress(Progress::new(i + 1, total))));
        }

        processor.log_mut().line(&format!(
            "=== organize finished | folders removed: {} | entries merged: {} | set aside: {} | copied: {} | errors: {} ===",
            report.folders.removed,
            report.folders.moved,
            report.files.set_aside,
            report.files.copied,
            report.folders.errors.len() + report.files.errors.len()
        ));
        tracing::info!(
            identical_folders = report.identical_folders,
            groups = report.groups,
            set_aside = report.files.set_aside,
            copied = report.files.copied,
            "organize finished"
        );
        events.message(format!(
            "Organize finished: {} folders removed, {} files set aside, {} copied, {} errors",
            report.folders.removed,
            report.files.set_aside,
            report.files.copied,
            report.folders.errors.len() + report.files.errors.len()
        ));

        Ok(report)
    }

    fn resolve_folders(
        &self,
        pairs: &[FolderPair],
        decisions: &mut dyn DecisionProvider,
        processor: &mut ActionProcessor,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome> {
        let mut total = ActionOutcome::default();
        let identical: Vec<&FolderPair> = pairs.iter().filter(|p| p.is_identical()).collect();

        for (i, pair) in identical.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ActionError::Cancelled.into());
            }

            // An earlier decision may have removed or merged one side.
            if !pair.first.is_dir() || !pair.second.is_dir() {
                let line = format!(
                    "skipped: {} | {} (no longer present)",
                    pair.first.display(),
                    pair.second.display()
                );
                processor.log_mut().line(&line);
                events.message(line);
                continue;
            }

            let policy = decisions.folder_policy(pair);
            if policy != FolderPolicy::KeepBoth {
                tracing::debug!(
                    first = %pair.first.display(),
                    second = %pair.second.display(),
                    %policy,
                    "applying folder policy"
                );
            }
            total.absorb(processor.apply_to_folders(pair, policy, events, cancel)?);
            events.send(Event::Action(ActionEvent::Progress(Progress::new(
                i + 1,
                identical.len(),
            ))));
        }

        Ok(total)
    }

    fn folder_pairs(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<Vec<FolderPair>> {
        let comparator = FolderComparator::new(self.config.compare_mode, self.config.effective_scan());

        phase(events, PipelinePhase::IndexingFolders);
        let index = comparator.index_by_name(&self.config.root, events)?;

        phase(events, PipelinePhase::ComparingFolders);
        let pairs = comparator.compare_index(&index, events, cancel)?;
        events.message(format!(
            "{} of {} same-named folder pairs are identical",
            pairs.iter().filter(|p| p.is_identical()).count(),
            pairs.len()
        ));
        Ok(pairs)
    }

    fn duplicate_index(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<DuplicateIndex> {
        let scanner = FileScanner::new(self.config.effective_scan());

        phase(events, PipelinePhase::Scanning);
        let mut files: Vec<ScannedFile> = Vec::new();
        for file in scanner.scan(&self.config.root, events)? {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled.into());
            }
            files.push(file);
        }

        phase(events, PipelinePhase::Hashing);
        let index = DuplicateIndex::build(files, &self.hasher, events, cancel)?;
        events.message(format!(
            "{} duplicate groups among {} files",
            index.len(),
            index.files_scanned()
        ));
        Ok(index)
    }
}

fn phase(events: &EventSender, phase: PipelinePhase) {
    tracing::debug!(%phase, "phase");
    events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
}

fn finish<T>(events: &EventSender, cancel: &CancellationToken, result: &Result<T>) {
    let event = match result {
        Ok(_) => PipelineEvent::Completed,
        Err(_) if cancel.is_cancelled() => PipelineEvent::Cancelled,
        Err(e) => {
            tracing::error!(error = %e, "organize failed");
            PipelineEvent::Error {
                message: e.to_string(),
            }
        }
    };
    events.send(Event::Pipeline(event));
}
