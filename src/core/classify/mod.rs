//! # Classify Module
//!
//! Maps file extensions to the category folders used inside the
//! holding area (`Duplicate Files/<Category>/`).

use serde::{Deserialize, Serialize};
use std::path::Path;

/// File category, one folder per variant in the holding area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pdfs,
    Documents,
    Spreadsheets,
    Presentations,
    Images,
    Audio,
    Videos,
    Archives,
    Executables,
    SourceCode,
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Pdfs,
        Category::Documents,
        Category::Spreadsheets,
        Category::Presentations,
        Category::Images,
        Category::Audio,
        Category::Videos,
        Category::Archives,
        Category::Executables,
        Category::SourceCode,
        Category::Other,
    ];

    /// Classify an extension. Case-insensitive, leading dot optional.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "pdf" => Category::Pdfs,
            "doc" | "docx" | "txt" | "rtf" | "odt" => Category::Documents,
            "xls" | "xlsx" | "csv" | "ods" => Category::Spreadsheets,
            "ppt" | "pptx" | "odp" => Category::Presentations,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tif" | "tiff" | "svg" | "webp" => {
                Category::Images
            }
            "mp3" | "wav" | "ogg" | "flac" | "aac" | "wma" => Category::Audio,
            "mp4" | "avi" | "mkv" | "mov" | "wmv" | "flv" | "webm" => Category::Videos,
            "zip" | "rar" | "7z" | "tar" | "gz" => Category::Archives,
            "exe" | "msi" | "bat" | "sh" => Category::Executables,
            "py" | "java" | "js" | "html" | "css" | "c" | "cpp" | "h" | "php" => {
                Category::SourceCode
            }
            _ => Category::Other,
        }
    }

    /// Classify a path by its extension; no extension means `Other`.
    pub fn for_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Category::Other)
    }

    /// Folder name used in the holding area
    pub fn label(&self) -> &'static str {
        match self {
            Category::Pdfs => "PDFs",
            Category::Documents => "Documents",
            Category::Spreadsheets => "Spreadsheets",
            Category::Presentations => "Presentations",
            Category::Images => "Images",
            Category::Audio => "Audio",
            Category::Videos => "Videos",
            Category::Archives => "Archives",
            Category::Executables => "Executables",
            Category::SourceCode => "Code",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_ignoring_case_and_dot() {
        assert_eq!(Category::from_extension("pdf"), Category::Pdfs);
        assert_eq!(Category::from_extension(".PDF"), Category::Pdfs);
        assert_eq!(Category::from_extension("JPeG"), Category::Images);
        assert_eq!(Category::from_extension(".tar"), Category::Archives);
    }

    #[test]
    fn unmapped_extensions_are_other() {
        assert_eq!(Category::from_extension(""), Category::Other);
        assert_eq!(Category::from_extension("xyz"), Category::Other);
        assert_eq!(Category::from_extension("."), Category::Other);
    }

    #[test]
    fn for_path_uses_last_extension() {
        assert_eq!(Category::for_path(Path::new("/a/backup.tar.gz")), Category::Archives);
        assert_eq!(Category::for_path(Path::new("/a/Makefile")), Category::Other);
        assert_eq!(Category::for_path(Path::new("/a/.bashrc")), Category::Other);
        assert_eq!(Category::for_path(Path::new("notes.TXT")), Category::Documents);
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<_> = Category::ALL.iter().map(|c| c.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), Category::ALL.len());
    }
}
