//! Results returned by `extract` and `compress`.

use std::path::Path;
use std::path::PathBuf;

use crate::formats::detect::ArchiveType;

/// What ended up in the destination after an extraction.
///
/// Built by walking the destination once the run finishes, so it lists
/// every regular file under it, including files that were already there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionManifest {
    /// Destination root.
    pub path: PathBuf,

    /// Number of regular files under `path`.
    pub file_count: usize,

    /// Sorted paths of those files.
    pub files: Vec<PathBuf>,

    /// Format the source was handled as.
    pub archive_type: ArchiveType,
}

impl ExtractionManifest {
    /// Returns `files` relative to `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use zipper_core::{ArchiveType, ExtractionManifest};
    ///
    /// let manifest = ExtractionManifest {
    ///     path: PathBuf::from("/out"),
    ///     file_count: 1,
    ///     files: vec![PathBuf::from("/out/a/b.txt")],
    ///     archive_type: ArchiveType::Tar,
    /// };
    /// assert_eq!(manifest.relative_files(), vec![PathBuf::from("a/b.txt")]);
    /// ```
    #[must_use]
    pub fn relative_files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter_map(|file| file.strip_prefix(&self.path).ok())
            .map(Path::to_path_buf)
            .collect()
    }

    /// Returns `true` if nothing was found in the destination.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }
}

/// What `compress` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionReport {
    /// The archive that was written.
    pub path: PathBuf,

    /// Size of the archive on disk.
    pub size_bytes: u64,

    /// Regular files taken from the source.
    pub file_count: usize,

    /// Format written.
    pub archive_type: ArchiveType,
}
