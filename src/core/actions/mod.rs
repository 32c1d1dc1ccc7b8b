//! # Actions Module
//!
//! Applies a caller-chosen disposition to a duplicate group or to a pair
//! of same-named folders.
//!
//! Every mutation is best-effort per item: a failure is logged, recorded
//! in the [`ActionOutcome`], and processing moves on. Only cancellation
//! stops a call early.

mod holding;
mod types;

pub use holding::{HoldingArea, HOLDING_DIR_NAME};
pub use types::*;

use crate::core::duplicates::DuplicateGroup;
use crate::core::folders::FolderPair;
use crate::core::fs_ops;
use crate::core::hasher::files_identical;
use crate::core::log::ActionLog;
use crate::core::pipeline::CancellationToken;
use crate::core::rename::resolve_collision;
use crate::error::ActionError;
use crate::events::EventSender;
use std::fs;
use std::path::Path;

/// Applies file and folder policies, writing every step to an action log
pub struct ActionProcessor {
    holding: HoldingArea,
    log: ActionLog,
}

impl ActionProcessor {
    pub fn new(holding: HoldingArea, log: ActionLog) -> Self {
        Self { holding, log }
    }

    pub fn holding(&self) -> &HoldingArea {
        &self.holding
    }

    pub fn log_mut(&mut self) -> &mut ActionLog {
        &mut self.log
    }

    /// Apply `policy` to one duplicate group.
    pub fn apply_to_group(
        &mut self,
        group: &DuplicateGroup,
        policy: FilePolicy,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError> {
        let mut outcome = ActionOutcome::default();

        match policy {
            FilePolicy::KeepAll => {}
            FilePolicy::KeepFirst | FilePolicy::KeepSelected(_) => {
                let keep = policy.kept_index().unwrap_or(0);
                if keep >= group.len() {
                    let error = ActionError::InvalidSelection {
                        index: keep,
                        len: group.len(),
                    };
                    self.log.failure(events, &error.to_string());
                    outcome.errors.push(error);
                    return Ok(outcome);
                }

                for (i, file) in group.files.iter().enumerate() {
                    if i == keep {
                        continue;
                    }
                    checkpoint(cancel)?;
                    match self.present(&file.path).and_then(|p| self.holding.relocate(p)) {
                        Ok(target) => {
                            self.log.record(events, "set aside", &file.path, &target);
                            outcome.set_aside += 1;
                        }
                        Err(e) => self.fail(events, &mut outcome, e),
                    }
                }
            }
            FilePolicy::DuplicateAll => {
                for file in &group.files {
                    checkpoint(cancel)?;
                    match self.present(&file.path).and_then(|p| self.holding.copy_in(p)) {
                        Ok(target) => {
                            self.log.record(events, "copied", &file.path, &target);
                            outcome.copied += 1;
                        }
                        Err(e) => self.fail(events, &mut outcome, e),
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Apply `policy` to a folder pair.
    pub fn apply_to_folders(
        &mut self,
        pair: &FolderPair,
        policy: FolderPolicy,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError> {
        let mut outcome = ActionOutcome::default();
        checkpoint(cancel)?;

        if policy == FolderPolicy::KeepBoth {
            self.log.line(&format!(
                "kept both: {} | {}",
                pair.first.display(),
                pair.second.display()
            ));
            return Ok(outcome);
        }

        if let Err(e) = self.check_pair(pair) {
            self.fail(events, &mut outcome, e);
            return Ok(outcome);
        }

        match policy {
            FolderPolicy::KeepBoth => {}
            FolderPolicy::KeepFirst => self.remove_folder(&pair.second, events, &mut outcome),
            FolderPolicy::KeepSecond => self.remove_folder(&pair.first, events, &mut outcome),
            FolderPolicy::Merge => {
                self.merge_into(&pair.first, &pair.second, events, cancel, &mut outcome)?;
                match fs::remove_dir(&pair.second) {
                    Ok(()) => {
                        self.log.line(&format!(
                            "merged: {} -> {}",
                            pair.second.display(),
                            pair.first.display()
                        ));
                        outcome.removed += 1;
                    }
                    Err(source) => self.fail(
                        events,
                        &mut outcome,
                        ActionError::Remove {
                            path: pair.second.clone(),
                            source,
                        },
                    ),
                }
            }
        }

        Ok(outcome)
    }

    // Move every entry of `from` into `into`. Same-named entries are
    // never dropped silently: directories merge recursively, identical
    // files are removed from `from`, differing files get a suffixed name.
    fn merge_into(
        &mut self,
        into: &Path,
        from: &Path,
        events: &EventSender,
        cancel: &CancellationToken,
        outcome: &mut ActionOutcome,
    ) -> Result<(), ActionError> {
        let mut names: Vec<_> = match fs::read_dir(from) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.file_name()).collect(),
            Err(e) => {
                tracing::debug!(path = %from.display(), error = %e, "cannot list folder");
                self.fail(
                    events,
                    outcome,
                    ActionError::Missing {
                        path: from.to_path_buf(),
                    },
                );
                return Ok(());
            }
        };
        names.sort();

        for name in names {
            checkpoint(cancel)?;
            let src = from.join(&name);
            let dst = into.join(&name);

            let dst_meta = match dst.symlink_metadata() {
                Err(_) => {
                    match fs_ops::move_entry(&src, &dst) {
                        Ok(()) => {
                            self.log.record(events, "moved", &src, &dst);
                            outcome.moved += 1;
                        }
                        Err(e) => self.fail(events, outcome, e),
                    }
                    continue;
                }
                Ok(meta) => meta,
            };

            // Kinds come from the entries themselves; a symlink is never
            // followed into its target.
            let src_meta = match src.symlink_metadata() {
                Ok(meta) => meta,
                Err(_) => {
                    self.fail(events, outcome, ActionError::Missing { path: src });
                    continue;
                }
            };

            if dst_meta.is_dir() && src_meta.is_dir() {
                self.merge_into(&dst, &src, events, cancel, outcome)?;
                if let Err(source) = fs::remove_dir(&src) {
                    self.fail(events, outcome, ActionError::Remove { path: src, source });
                }
                continue;
            }

            if dst_meta.is_file() && src_meta.is_file() {
                match files_identical(&src, &dst) {
                    Ok(true) => {
                        match fs_ops::remove_file(&src) {
                            Ok(()) => {
                                self.log.record(events, "removed identical", &src, &dst);
                                outcome.removed += 1;
                            }
                            Err(e) => self.fail(events, outcome, e),
                        }
                        continue;
                    }
                    Ok(false) => {}
                    Err(source) => {
                        self.fail(
                            events,
                            outcome,
                            ActionError::Compare {
                                left: src,
                                right: dst,
                                source,
                            },
                        );
                        continue;
                    }
                }
            }

            let target = resolve_collision(into, &name);
            match fs_ops::move_entry(&src, &target) {
                Ok(()) => {
                    self.log.record(events, "renamed", &src, &target);
                    outcome.moved += 1;
                }
                Err(e) => self.fail(events, outcome, e),
            }
        }

        Ok(())
    }

    fn remove_folder(&mut self, path: &Path, events: &EventSender, outcome: &mut ActionOutcome) {
        match fs_ops::remove_tree(path) {
            Ok(()) => {
                self.log.line(&format!("removed folder: {}", path.display()));
                tracing::debug!(path = %path.display(), "removed folder");
                outcome.removed += 1;
            }
            Err(e) => self.fail(events, outcome, e),
        }
    }

    fn check_pair(&self, pair: &FolderPair) -> Result<(), ActionError> {
        for path in [&pair.first, &pair.second] {
            if !path.is_dir() {
                return Err(ActionError::Missing { path: path.clone() });
            }
        }
        for (outer, inner) in [(&pair.first, &pair.second), (&pair.second, &pair.first)] {
            if inner.starts_with(outer) {
                return Err(ActionError::NestedFolders {
                    outer: outer.clone(),
                    inner: inner.clone(),
                });
            }
        }
        Ok(())
    }

    fn present<'a>(&self, path: &'a Path) -> Result<&'a Path, ActionError> {
        if path.is_file() {
            Ok(path)
        } else {
            Err(ActionError::Missing {
                path: path.to_path_buf(),
            })
        }
    }

    fn fail(&mut self, events: &EventSender, outcome: &mut ActionOutcome, error: ActionError) {
        self.log.failure(events, &error.to_string());
        outcome.errors.push(error);
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), ActionError> {
    if cancel.is_cancelled() {
        Err(ActionError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::duplicates::FileEntry;
    use crate::core::folders::FolderVerdict;
    use crate::events::null_sender;
    use std::path::PathBuf;
    use std::time::SystemTime;
    use tempfile::TempDir;

    struct Fixture {
        volume: TempDir,
        processor: ActionProcessor,
    }

    fn fixture() -> Fixture {
        let volume = TempDir::new().unwrap();
        let log = ActionLog::open(&volume.path().join("organize_log.txt")).unwrap();
        let processor = ActionProcessor::new(HoldingArea::under(volume.path()), log);
        Fixture { volume, processor }
    }

    fn group_of(paths: &[PathBuf]) -> DuplicateGroup {
        let files = paths
            .iter()
            .map(|p| FileEntry::new(p.clone(), 4, SystemTime::UNIX_EPOCH))
            .collect();
        DuplicateGroup::new("h".to_string(), 4, files)
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn pair(first: PathBuf, second: PathBuf) -> FolderPair {
        FolderPair {
            name: "photos".to_string(),
            first,
            second,
            verdict: FolderVerdict::Identical,
        }
    }

    #[test]
    fn keep_all_touches_nothing() {
        let mut fx = fixture();
        let a = fx.volume.path().join("a/x.txt");
        let b = fx.volume.path().join("b/x.txt");
        write(&a, "same");
        write(&b, "same");

        let outcome = fx
            .processor
            .apply_to_group(&group_of(&[a.clone(), b.clone()]), FilePolicy::KeepAll, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.set_aside, 0);
        assert!(a.exists() && b.exists());
        assert!(!fx.volume.path().join(HOLDING_DIR_NAME).exists());
    }

    #[test]
    fn keep_first_sets_aside_the_rest() {
        let mut fx = fixture();
        let a = fx.volume.path().join("a/x.txt");
        let b = fx.volume.path().join("b/x.txt");
        let c = fx.volume.path().join("c/x.txt");
        for p in [&a, &b, &c] {
            write(p, "same");
        }

        let outcome = fx
            .processor
            .apply_to_group(&group_of(&[a.clone(), b.clone(), c.clone()]), FilePolicy::KeepFirst, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.set_aside, 2);
        assert!(a.exists());
        assert!(!b.exists() && !c.exists());
        let docs = fx.volume.path().join("Duplicate Files/Documents");
        assert!(docs.join("x.txt").exists());
        assert!(docs.join("x_1.txt").exists());
    }

    #[test]
    fn keep_selected_keeps_that_index() {
        let mut fx = fixture();
        let a = fx.volume.path().join("a/p.jpg");
        let b = fx.volume.path().join("b/p.jpg");
        write(&a, "img!");
        write(&b, "img!");

        fx.processor
            .apply_to_group(&group_of(&[a.clone(), b.clone()]), FilePolicy::KeepSelected(1), &null_sender(), &CancellationToken::new())
            .unwrap();

        assert!(!a.exists());
        assert!(b.exists());
        assert!(fx.volume.path().join("Duplicate Files/Images/p.jpg").exists());
    }

    #[test]
    fn out_of_range_selection_is_reported() {
        let mut fx = fixture();
        let a = fx.volume.path().join("a/p.jpg");
        let b = fx.volume.path().join("b/p.jpg");
        write(&a, "img!");
        write(&b, "img!");

        let outcome = fx
            .processor
            .apply_to_group(&group_of(&[a.clone(), b.clone()]), FilePolicy::KeepSelected(7), &null_sender(), &CancellationToken::new())
            .unwrap();

        assert!(matches!(outcome.errors[0], ActionError::InvalidSelection { index: 7, len: 2 }));
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn duplicate_all_copies_every_member() {
        let mut fx = fixture();
        let a = fx.volume.path().join("a/s.mp3");
        let b = fx.volume.path().join("b/s.mp3");
        write(&a, "song");
        write(&b, "song");

        let outcome = fx
            .processor
            .apply_to_group(&group_of(&[a.clone(), b.clone()]), FilePolicy::DuplicateAll, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.copied, 2);
        assert!(a.exists() && b.exists());
        let audio = fx.volume.path().join("Duplicate Files/Audio");
        assert!(audio.join("s.mp3").exists());
        assert!(audio.join("s_1.mp3").exists());
    }

    #[test]
    fn missing_member_does_not_stop_the_group() {
        let mut fx = fixture();
        let a = fx.volume.path().join("a/x.txt");
        let gone = fx.volume.path().join("gone/x.txt");
        let c = fx.volume.path().join("c/x.txt");
        write(&a, "same");
        write(&c, "same");

        let outcome = fx
            .processor
            .apply_to_group(&group_of(&[a, gone, c.clone()]), FilePolicy::KeepFirst, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.set_aside, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(!c.exists());
    }

    #[test]
    fn keep_first_folder_removes_second() {
        let mut fx = fixture();
        let first = fx.volume.path().join("a/Photos");
        let second = fx.volume.path().join("b/Photos");
        write(&first.join("1.jpg"), "1");
        write(&second.join("1.jpg"), "1");

        fx.processor
            .apply_to_folders(&pair(first.clone(), second.clone()), FolderPolicy::KeepFirst, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert!(first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn keep_second_folder_removes_first() {
        let mut fx = fixture();
        let first = fx.volume.path().join("a/Photos");
        let second = fx.volume.path().join("b/Photos");
        write(&first.join("1.jpg"), "1");
        write(&second.join("1.jpg"), "1");

        fx.processor
            .apply_to_folders(&pair(first.clone(), second.clone()), FolderPolicy::KeepSecond, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert!(!first.exists());
        assert!(second.exists());
    }

    #[test]
    fn merge_keeps_colliding_entries() {
        let mut fx = fixture();
        let first = fx.volume.path().join("a/Photos");
        let second = fx.volume.path().join("b/Photos");
        write(&first.join("same.jpg"), "same");
        write(&second.join("same.jpg"), "same");
        write(&first.join("clash.jpg"), "mine");
        write(&second.join("clash.jpg"), "yours");
        write(&second.join("only.jpg"), "only");
        write(&first.join("trip/a.jpg"), "a");
        write(&second.join("trip/b.jpg"), "b");

        let outcome = fx
            .processor
            .apply_to_folders(&pair(first.clone(), second.clone()), FolderPolicy::Merge, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert!(outcome.is_clean(), "{:?}", outcome.errors);
        assert!(!second.exists());
        assert_eq!(fs::read_to_string(first.join("clash.jpg")).unwrap(), "mine");
        assert_eq!(fs::read_to_string(first.join("clash_1.jpg")).unwrap(), "yours");
        assert!(first.join("only.jpg").exists());
        assert!(first.join("same.jpg").exists());
        assert!(!first.join("same_1.jpg").exists());
        assert!(first.join("trip/a.jpg").exists());
        assert!(first.join("trip/b.jpg").exists());
    }

    #[cfg(unix)]
    #[test]
    fn merge_moves_linked_directory_as_a_link() {
        let mut fx = fixture();
        let first = fx.volume.path().join("a/Photos");
        let second = fx.volume.path().join("b/Photos");
        let outside = fx.volume.path().join("outside/keepme");
        write(&first.join("trip/a.jpg"), "a");
        write(&outside.join("precious.txt"), "precious");
        fs::create_dir_all(&second).unwrap();
        std::os::unix::fs::symlink(&outside, second.join("trip")).unwrap();

        let outcome = fx
            .processor
            .apply_to_folders(&pair(first.clone(), second.clone()), FolderPolicy::Merge, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert!(outcome.is_clean(), "{:?}", outcome.errors);
        assert_eq!(fs::read_to_string(outside.join("precious.txt")).unwrap(), "precious");
        assert!(!first.join("trip/precious.txt").exists());
        assert!(first.join("trip/a.jpg").exists());
        let moved = first.join("trip_1").symlink_metadata().unwrap();
        assert!(moved.file_type().is_symlink());
        assert_eq!(fs::read_link(first.join("trip_1")).unwrap(), outside);
        assert!(!second.exists());
    }

    #[test]
    fn vanished_folder_is_reported_not_fatal() {
        let mut fx = fixture();
        let first = fx.volume.path().join("a/Photos");
        fs::create_dir_all(&first).unwrap();

        let outcome = fx
            .processor
            .apply_to_folders(&pair(first.clone(), fx.volume.path().join("b/Photos")), FolderPolicy::KeepSecond, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert!(matches!(outcome.errors[0], ActionError::Missing { .. }));
        assert!(first.exists());
    }

    #[test]
    fn nested_pairs_are_refused() {
        let mut fx = fixture();
        let outer = fx.volume.path().join("Photos");
        let inner = outer.join("photos");
        fs::create_dir_all(&inner).unwrap();

        let outcome = fx
            .processor
            .apply_to_folders(&pair(inner.clone(), outer.clone()), FolderPolicy::KeepFirst, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert!(matches!(outcome.errors[0], ActionError::NestedFolders { .. }));
        assert!(inner.exists());
    }

    #[test]
    fn cancelled_group_stops_before_mutating() {
        let mut fx = fixture();
        let a = fx.volume.path().join("a/x.txt");
        let b = fx.volume.path().join("b/x.txt");
        write(&a, "same");
        write(&b, "same");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = fx.processor.apply_to_group(&group_of(&[a, b.clone()]), FilePolicy::KeepFirst, &null_sender(), &cancel);

        assert!(matches!(result, Err(ActionError::Cancelled)));
        assert!(b.exists());
    }

    #[test]
    fn actions_are_written_to_the_log() {
        let mut fx = fixture();
        let a = fx.volume.path().join("a/x.txt");
        let b = fx.volume.path().join("b/x.txt");
        write(&a, "same");
        write(&b, "same");

        fx.processor
            .apply_to_group(&group_of(&[a, b.clone()]), FilePolicy::KeepFirst, &null_sender(), &CancellationToken::new())
            .unwrap();

        let log = fs::read_to_string(fx.volume.path().join("organize_log.txt")).unwrap();
        assert!(log.contains(&format!("set aside: {} -> ", b.display())));
    }
}
