//! Integration tests for organizing a single volume.
//!
//! These tests verify end-to-end organize behavior including:
//! - Merging identical same-named folders
//! - Content versus metadata folder comparison
//! - File policies and the holding area
//! - Decision order and the organize log

use assert_fs::prelude::*;
use assert_fs::TempDir;
use drive_dedup::core::actions::{BatchPolicy, FilePolicy, FolderPolicy};
use drive_dedup::core::duplicates::DuplicateGroup;
use drive_dedup::core::folders::{FolderCompareMode, FolderPair};
use drive_dedup::core::organize::{DecisionProvider, OrganizeConfig, Organizer};
use drive_dedup::core::pipeline::CancellationToken;
use drive_dedup::events::null_sender;
use filetime::{set_file_mtime, FileTime};
use predicates::prelude::*;

fn pin_mtime(child: &assert_fs::fixture::ChildPath) {
    set_file_mtime(child.path(), FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
}

fn batch(files: Option<FilePolicy>, folders: Option<FolderPolicy>) -> BatchPolicy {
    BatchPolicy { files, folders }
}

/// Answers from a script and remembers what it was asked
#[derive(Default)]
struct Scripted {
    folder_answers: Vec<FolderPolicy>,
    file_answers: Vec<FilePolicy>,
    folders_asked: Vec<FolderPair>,
    groups_asked: Vec<Vec<std::path::PathBuf>>,
}

impl DecisionProvider for Scripted {
    fn folder_policy(&mut self, pair: &FolderPair) -> FolderPolicy {
        self.folders_asked.push(pair.clone());
        if self.folder_answers.is_empty() {
            FolderPolicy::KeepBoth
        } else {
            self.folder_answers.remove(0)
        }
    }

    fn file_policy(&mut self, group: &DuplicateGroup) -> FilePolicy {
        self.groups_asked.push(group.paths().cloned().collect());
        if self.file_answers.is_empty() {
            FilePolicy::KeepAll
        } else {
            self.file_answers.remove(0)
        }
    }
}

#[test]
fn same_named_photos_folders_merge_into_one() {
    let temp = TempDir::new().unwrap();
    for folder in ["drive_a/Photos", "drive_b/photos"] {
        let one = temp.child(format!("{}/beach.jpg", folder));
        one.write_str("sand").unwrap();
        pin_mtime(&one);
        let two = temp.child(format!("{}/city.jpg", folder));
        two.write_str("lights").unwrap();
        pin_mtime(&two);
    }
    temp.child("drive_a/Photos/Trip/day1.jpg").write_str("d1").unwrap();
    temp.child("drive_b/photos/Trip/day2.jpg").write_str("d2").unwrap();

    let config = OrganizeConfig::new(temp.path()).compare_mode(FolderCompareMode::Metadata);
    let mut policy = batch(None, Some(FolderPolicy::Merge));
    let report = Organizer::new(config)
        .run(&mut policy, &null_sender(), &CancellationToken::new())
        .unwrap();

    assert_eq!(report.identical_folders, 1);
    assert!(report.is_clean(), "{:?}", report.folders.errors);
    temp.child("drive_b/photos").assert(predicate::path::missing());
    temp.child("drive_a/Photos/beach.jpg").assert("sand");
    temp.child("drive_a/Photos/city.jpg").assert("lights");
    temp.child("drive_a/Photos/Trip/day1.jpg").assert("d1");
    temp.child("drive_a/Photos/Trip/day2.jpg").assert("d2");
}

#[test]
fn content_mode_catches_metadata_lookalikes() {
    let temp = TempDir::new().unwrap();
    let a = temp.child("a/Docs/x.txt");
    let b = temp.child("b/Docs/x.txt");
    a.write_str("abc").unwrap();
    b.write_str("xyz").unwrap();
    pin_mtime(&a);
    pin_mtime(&b);

    let found = Organizer::new(OrganizeConfig::new(temp.path()))
        .find(&null_sender(), &CancellationToken::new())
        .unwrap();
    assert_eq!(found.identical_pairs().count(), 0);

    let found = Organizer::new(OrganizeConfig::new(temp.path()).compare_mode(FolderCompareMode::Metadata))
        .find(&null_sender(), &CancellationToken::new())
        .unwrap();
    assert_eq!(found.identical_pairs().count(), 1);
}

#[test]
fn keep_first_sets_aside_into_holding_area() {
    let temp = TempDir::new().unwrap();
    temp.child("2019/report.pdf").write_str("quarterly").unwrap();
    temp.child("backup/report.pdf").write_str("quarterly").unwrap();
    temp.child("old/copy of report.pdf").write_str("quarterly").unwrap();
    temp.child("unique.txt").write_str("alone").unwrap();

    let mut policy = batch(Some(FilePolicy::KeepFirst), None);
    let report = Organizer::new(OrganizeConfig::new(temp.path()))
        .run(&mut policy, &null_sender(), &CancellationToken::new())
        .unwrap();

    assert_eq!(report.groups, 1);
    assert_eq!(report.files.set_aside, 2);
    temp.child("2019/report.pdf").assert("quarterly");
    temp.child("backup/report.pdf").assert(predicate::path::missing());
    temp.child("old/copy of report.pdf").assert(predicate::path::missing());
    temp.child("Duplicate Files/PDFs/report.pdf").assert("quarterly");
    temp.child("Duplicate Files/PDFs/copy of report.pdf").assert("quarterly");
    temp.child("unique.txt").assert("alone");
}

#[test]
fn holding_area_is_not_rescanned() {
    let temp = TempDir::new().unwrap();
    temp.child("a/song.mp3").write_str("la la").unwrap();
    temp.child("b/song.mp3").write_str("la la").unwrap();

    let mut policy = batch(Some(FilePolicy::DuplicateAll), None);
    Organizer::new(OrganizeConfig::new(temp.path()))
        .run(&mut policy, &null_sender(), &CancellationToken::new())
        .unwrap();

    temp.child("Duplicate Files/Audio/song.mp3").assert("la la");
    temp.child("Duplicate Files/Audio/song_1.mp3").assert("la la");

    let found = Organizer::new(OrganizeConfig::new(temp.path()))
        .find(&null_sender(), &CancellationToken::new())
        .unwrap();
    assert_eq!(found.groups.len(), 1);
    assert_eq!(found.groups[0].len(), 2);
}

#[test]
fn provider_sees_groups_in_discovery_order() {
    let temp = TempDir::new().unwrap();
    temp.child("a/one.txt").write_str("1").unwrap();
    temp.child("b/one.txt").write_str("1").unwrap();
    temp.child("c/two.txt").write_str("22").unwrap();
    temp.child("d/two.txt").write_str("22").unwrap();

    let mut scripted = Scripted {
        file_answers: vec![FilePolicy::KeepSelected(1)],
        ..Default::default()
    };
    Organizer::new(OrganizeConfig::new(temp.path()))
        .run(&mut scripted, &null_sender(), &CancellationToken::new())
        .unwrap();

    assert_eq!(scripted.groups_asked.len(), 2);
    assert!(scripted.groups_asked[0][0].ends_with("a/one.txt"));
    assert!(scripted.groups_asked[0][1].ends_with("b/one.txt"));
    assert!(scripted.groups_asked[1][0].ends_with("c/two.txt"));
    temp.child("a/one.txt").assert(predicate::path::missing());
    temp.child("b/one.txt").assert("1");
    temp.child("c/two.txt").assert("22");
}

#[test]
fn removed_folder_is_not_offered_again() {
    let temp = TempDir::new().unwrap();
    for side in ["a", "b", "c"] {
        temp.child(format!("{}/Scans/page.png", side)).write_str("page").unwrap();
    }

    let mut scripted = Scripted {
        folder_answers: vec![FolderPolicy::KeepFirst, FolderPolicy::KeepFirst],
        ..Default::default()
    };
    let report = Organizer::new(OrganizeConfig::new(temp.path()))
        .run(&mut scripted, &null_sender(), &CancellationToken::new())
        .unwrap();

    assert_eq!(report.identical_folders, 3);
    assert_eq!(scripted.folders_asked.len(), 2);
    assert!(report.is_clean());
    temp.child("a/Scans/page.png").assert("page");
    temp.child("b/Scans").assert(predicate::path::missing());
    temp.child("c/Scans").assert(predicate::path::missing());
}

#[test]
fn organize_log_records_the_run() {
    let temp = TempDir::new().unwrap();
    temp.child("x/a.txt").write_str("same").unwrap();
    temp.child("y/a.txt").write_str("same").unwrap();

    let mut policy = batch(Some(FilePolicy::KeepFirst), Some(FolderPolicy::KeepBoth));
    Organizer::new(OrganizeConfig::new(temp.path()))
        .run(&mut policy, &null_sender(), &CancellationToken::new())
        .unwrap();

    let log = temp.child("organize_log.txt");
    log.assert(predicate::str::contains("=== organize started"));
    log.assert(predicate::str::contains("mode: batch"));
    log.assert(predicate::str::contains("set aside: "));
    log.assert(predicate::str::contains("=== organize finished"));
}
