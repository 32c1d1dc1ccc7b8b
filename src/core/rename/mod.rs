//! # Rename Module
//!
//! Picks a free file name inside a directory by inserting `_N` before
//! the extension: `notes.txt`, `notes_1.txt`, `notes_2.txt`, ...
//!
//! Resolution looks at the directory as it is at call time. Two writers
//! racing on the same directory can still collide.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Return `dir/filename` if free, otherwise the first free `dir/stem_N.ext`.
pub fn resolve_collision(dir: &Path, filename: &OsStr) -> PathBuf {
    let candidate = dir.join(filename);
    if !exists(&candidate) {
        return candidate;
    }

    let name = Path::new(filename);
    let stem = name.file_stem().unwrap_or(OsStr::new("file"));
    let ext = name.extension();

    let mut counter = 1usize;
    loop {
        // Built from OS strings so non-UTF-8 names survive untouched.
        let mut new_name = OsString::from(stem);
        new_name.push(format!("_{}", counter));
        if let Some(ext) = ext {
            new_name.push(".");
            new_name.push(ext);
        }
        let path = dir.join(new_name);
        if !exists(&path) {
            return path;
        }
        counter += 1;
    }
}

// Broken symlinks still occupy the name.
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn free_name_is_returned_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = resolve_collision(dir.path(), OsStr::new("photo.jpg"));
        assert_eq!(path, dir.path().join("photo.jpg"));
    }

    #[test]
    fn suffix_goes_before_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("photo.jpg"), "x").unwrap();
        fs::write(dir.path().join("photo_1.jpg"), "x").unwrap();

        let path = resolve_collision(dir.path(), OsStr::new("photo.jpg"));
        assert_eq!(path, dir.path().join("photo_2.jpg"));
    }

    #[test]
    fn only_last_extension_is_split() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("backup.tar.gz"), "x").unwrap();

        let path = resolve_collision(dir.path(), OsStr::new("backup.tar.gz"));
        assert_eq!(path, dir.path().join("backup.tar_1.gz"));
    }

    #[test]
    fn names_without_extension_get_plain_suffix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README"), "x").unwrap();
        fs::write(dir.path().join(".profile"), "x").unwrap();

        assert_eq!(
            resolve_collision(dir.path(), OsStr::new("README")),
            dir.path().join("README_1")
        );
        assert_eq!(
            resolve_collision(dir.path(), OsStr::new(".profile")),
            dir.path().join(".profile_1")
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_keep_their_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let name = OsStr::from_bytes(b"caf\xe9.txt");
        fs::write(dir.path().join(name), "x").unwrap();

        let path = resolve_collision(dir.path(), name);
        assert_eq!(path, dir.path().join(OsStr::from_bytes(b"caf\xe9_1.txt")));
    }

    #[test]
    fn directories_count_as_taken() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Photos")).unwrap();

        let path = resolve_collision(dir.path(), OsStr::new("Photos"));
        assert_eq!(path, dir.path().join("Photos_1"));
    }

    #[test]
    fn resolving_twice_after_use_gives_distinct_names() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();

        let first = resolve_collision(dir.path(), OsStr::new("a.txt"));
        fs::write(&first, "y").unwrap();
        let second = resolve_collision(dir.path(), OsStr::new("a.txt"));

        assert_ne!(first, second);
        assert!(!second.exists());
    }
}
