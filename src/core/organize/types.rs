//! Types for the organize module.

use crate::core::actions::{ActionOutcome, BatchPolicy, FilePolicy, FolderPolicy, HOLDING_DIR_NAME};
use crate::core::duplicates::DuplicateGroup;
use crate::core::folders::{FolderCompareMode, FolderPair};
use crate::core::scanner::ScanConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default name of the organize log written at the volume root
pub const ORGANIZE_LOG_NAME: &str = "organize_log.txt";

/// Configuration for organizing one volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub compare_mode: FolderCompareMode,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default = "default_holding_dir")]
    pub holding_dir_name: String,
    #[serde(default = "default_log_name")]
    pub log_name: String,
}

fn default_holding_dir() -> String {
    HOLDING_DIR_NAME.to_string()
}

fn default_log_name() -> String {
    ORGANIZE_LOG_NAME.to_string()
}

impl OrganizeConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compare_mode: FolderCompareMode::default(),
            scan: ScanConfig::default(),
            holding_dir_name: default_holding_dir(),
            log_name: default_log_name(),
        }
    }

    pub fn compare_mode(mut self, mode: FolderCompareMode) -> Self {
        self.compare_mode = mode;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.scan.include_hidden = include;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.scan.follow_symlinks = follow;
        self
    }

    pub fn holding_root(&self) -> PathBuf {
        self.root.join(&self.holding_dir_name)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(&self.log_name)
    }

    /// Scan settings with the holding area and the log pruned.
    pub fn effective_scan(&self) -> ScanConfig {
        self.scan
            .clone()
            .exclude(self.holding_root())
            .exclude(self.log_path())
    }
}

/// Supplies a disposition for each identical folder pair and each
/// duplicate group.
///
/// Implemented by [`BatchPolicy`] for unattended runs; interactive front
/// ends implement it by prompting.
pub trait DecisionProvider {
    fn folder_policy(&mut self, pair: &FolderPair) -> FolderPolicy;

    fn file_policy(&mut self, group: &DuplicateGroup) -> FilePolicy;

    /// Mode string written to the log header
    fn mode(&self) -> &str {
        "interactive"
    }
}

impl DecisionProvider for BatchPolicy {
    fn folder_policy(&mut self, _pair: &FolderPair) -> FolderPolicy {
        self.folders.unwrap_or_default()
    }

    fn file_policy(&mut self, _group: &DuplicateGroup) -> FilePolicy {
        self.files.unwrap_or_default()
    }

    fn mode(&self) -> &str {
        "batch"
    }
}

/// What a read-only pass found
#[derive(Debug, Serialize)]
pub struct Discovery {
    pub folder_pairs: Vec<FolderPair>,
    pub groups: Vec<DuplicateGroup>,
    pub files_scanned: usize,
    pub files_hashed: usize,
}

impl Discovery {
    pub fn identical_pairs(&self) -> impl Iterator<Item = &FolderPair> {
        self.folder_pairs.iter().filter(|p| p.is_identical())
    }

    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.reclaimable_bytes()).sum()
    }
}

/// Result of an organize run
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Same-named folder pairs compared
    pub folder_pairs: usize,
    /// Pairs found identical
    pub identical_folders: usize,
    /// Duplicate groups found after folder actions
    pub groups: usize,
    pub files_scanned: usize,
    pub folders: ActionOutcome,
    pub files: ActionOutcome,
}

impl OrganizeReport {
    pub fn is_clean(&self) -> bool {
        self.folders.is_clean() && self.files.is_clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::folders::FolderVerdict;

    #[test]
    fn scan_excludes_holding_area_and_log() {
        let config = OrganizeConfig::new("/vol");
        let scan = config.effective_scan();
        assert!(scan.excluded.contains(&PathBuf::from("/vol/Duplicate Files")));
        assert!(scan.excluded.contains(&PathBuf::from("/vol/organize_log.txt")));
    }

    #[test]
    fn batch_policy_defaults_to_keeping_everything() {
        let mut policy = BatchPolicy::default();
        let pair = FolderPair {
            name: "photos".into(),
            first: "/a/Photos".into(),
            second: "/b/Photos".into(),
            verdict: FolderVerdict::Identical,
        };
        let group = DuplicateGroup::new("h".into(), 1, Vec::new());

        assert_eq!(policy.folder_policy(&pair), FolderPolicy::KeepBoth);
        assert_eq!(policy.file_policy(&group), FilePolicy::KeepAll);
        assert_eq!(policy.mode(), "batch");
    }
}
