//! The holding area: `<root>/Duplicate Files/<Category>/<name>`.

use crate::core::classify::Category;
use crate::core::fs_ops;
use crate::core::rename::resolve_collision;
use crate::error::ActionError;
use std::path::{Path, PathBuf};

/// Folder name of the holding area under a volume root
pub const HOLDING_DIR_NAME: &str = "Duplicate Files";

/// Category-organized folder where superseded duplicates are put
#[derive(Debug, Clone)]
pub struct HoldingArea {
    root: PathBuf,
}

impl HoldingArea {
    /// Holding area rooted exactly at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Holding area at `<volume>/Duplicate Files`
    pub fn under(volume: &Path) -> Self {
        Self::new(volume.join(HOLDING_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Category folder for `file`, created if needed.
    pub fn category_dir(&self, file: &Path) -> Result<PathBuf, ActionError> {
        let dir = self.root.join(Category::for_path(file).label());
        fs_ops::ensure_dir(&dir)?;
        Ok(dir)
    }

    /// Free destination for `file` inside its category folder.
    pub fn slot_for(&self, file: &Path) -> Result<PathBuf, ActionError> {
        let dir = self.category_dir(file)?;
        let name = file.file_name().ok_or_else(|| ActionError::Missing {
            path: file.to_path_buf(),
        })?;
        Ok(resolve_collision(&dir, name))
    }

    /// Move `file` into the holding area; returns where it landed.
    pub fn relocate(&self, file: &Path) -> Result<PathBuf, ActionError> {
        let target = self.slot_for(file)?;
        fs_ops::move_file(file, &target)?;
        Ok(target)
    }

    /// Copy `file` into the holding area; returns the copy's path.
    pub fn copy_in(&self, file: &Path) -> Result<PathBuf, ActionError> {
        let target = self.slot_for(file)?;
        fs_ops::copy_file(file, &target)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn relocate_sorts_by_category() {
        let volume = TempDir::new().unwrap();
        let file = volume.path().join("report.pdf");
        fs::write(&file, "X").unwrap();

        let holding = HoldingArea::under(volume.path());
        let landed = holding.relocate(&file).unwrap();

        assert_eq!(landed, volume.path().join("Duplicate Files/PDFs/report.pdf"));
        assert!(!file.exists());
    }

    #[test]
    fn colliding_names_get_suffixes() {
        let volume = TempDir::new().unwrap();
        let a = volume.path().join("a/song.mp3");
        let b = volume.path().join("b/song.mp3");
        for f in [&a, &b] {
            fs::create_dir_all(f.parent().unwrap()).unwrap();
            fs::write(f, "la").unwrap();
        }

        let holding = HoldingArea::under(volume.path());
        let first = holding.copy_in(&a).unwrap();
        let second = holding.copy_in(&b).unwrap();

        assert!(first.ends_with("Audio/song.mp3"));
        assert!(second.ends_with("Audio/song_1.mp3"));
        assert!(a.exists() && b.exists());
    }
}
