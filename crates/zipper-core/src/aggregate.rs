//! Turns a directory tree into counts and listings.

use std::path::Path;

use log::info;

use crate::Result;
use crate::formats::detect::ArchiveType;
use crate::fs::Filesystem;
use crate::fs::same_location;
use crate::report::ExtractionManifest;

/// Walks `dest` and describes every regular file below it.
pub fn build_manifest<F: Filesystem + ?Sized>(
    fs: &F,
    dest: &Path,
    archive_type: ArchiveType,
) -> Result<ExtractionManifest> {
    let files = fs.list_files(dest)?;
    info!(
        "{} now holds {} files ({archive_type})",
        dest.display(),
        files.len()
    );
    Ok(ExtractionManifest {
        path: dest.to_path_buf(),
        file_count: files.len(),
        files,
        archive_type,
    })
}

/// Counts regular files in `source`; a single file counts as one.
///
/// `archive` is left out when it lies inside `source`.
pub fn count_source_files<F: Filesystem + ?Sized>(
    fs: &F,
    source: &Path,
    archive: &Path,
) -> Result<usize> {
    Ok(fs
        .list_files(source)?
        .iter()
        .filter(|file| !same_location(file, archive))
        .count())
}
