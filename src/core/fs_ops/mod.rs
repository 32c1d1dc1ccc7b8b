//! Filesystem mutation primitives.
//!
//! `rename` is tried first; across filesystems it fails, and the move
//! falls back to copy + verify + delete.

use crate::error::ActionError;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Move a file. Refuses to overwrite an existing destination.
pub fn move_file(from: &Path, to: &Path) -> Result<(), ActionError> {
    let move_err = |source| ActionError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if to.symlink_metadata().is_ok() {
        return Err(move_err(already_exists(to)));
    }

    fs::rename(from, to)
        .or_else(|_| copy_then_remove(from, to))
        .map_err(move_err)
}

fn copy_then_remove(from: &Path, to: &Path) -> std::io::Result<()> {
    let source_size = fs::metadata(from)?.len();
    fs::copy(from, to)?;

    let dest_size = fs::metadata(to)?.len();
    if dest_size != source_size {
        let _ = fs::remove_file(to);
        return Err(std::io::Error::other(format!(
            "Copy verification failed: source {} bytes, dest {} bytes",
            source_size, dest_size
        )));
    }

    fs::remove_file(from)
}

/// Copy a file, leaving the original in place.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), ActionError> {
    let copy_err = |source| ActionError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if to.symlink_metadata().is_ok() {
        return Err(copy_err(already_exists(to)));
    }

    fs::copy(from, to).map(|_| ()).map_err(copy_err)
}

/// Move a file or a whole directory tree.
pub fn move_entry(from: &Path, to: &Path) -> Result<(), ActionError> {
    let is_dir = from
        .symlink_metadata()
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return move_file(from, to);
    }

    let move_err = |source| ActionError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if to.symlink_metadata().is_ok() {
        return Err(move_err(already_exists(to)));
    }

    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    copy_tree(from, to).map_err(move_err)?;
    remove_tree(from)
}

fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(std::io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(std::io::Error::other)?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Recursively delete a directory.
pub fn remove_tree(path: &Path) -> Result<(), ActionError> {
    fs::remove_dir_all(path).map_err(|source| ActionError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

/// Delete one file.
pub fn remove_file(path: &Path) -> Result<(), ActionError> {
    fs::remove_file(path).map_err(|source| ActionError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

/// `create_dir_all`, reporting whether the directory had to be created.
pub fn ensure_dir(path: &Path) -> Result<bool, ActionError> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path).map_err(|source| ActionError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

fn already_exists(path: &Path) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("{} already exists", path.display()),
    )
}
