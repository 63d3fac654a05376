//! High-level public API over the real filesystem.

use std::path::Path;

use crate::ArchiveEngine;
use crate::CompressOptions;
use crate::ExtractOptions;
use crate::Result;
use crate::formats::detect::ArchiveType;
use crate::report::CompressionReport;
use crate::report::ExtractionManifest;

/// Packs a file or directory into an archive.
///
/// Only ZIP can be written; the tar family is read-only.
///
/// # Errors
///
/// Returns an error if:
/// - `source` does not exist
/// - `options.archive_type` is not ZIP
/// - the archive cannot be written
///
/// # Examples
///
/// ```no_run
/// use zipper_core::CompressOptions;
/// use zipper_core::compress;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = compress("photos", "backup/photos.zip", &CompressOptions::default())?;
/// println!("{} files, {} bytes", report.file_count, report.size_bytes);
/// # Ok(())
/// # }
/// ```
pub fn compress<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    options: &CompressOptions,
) -> Result<CompressionReport> {
    ArchiveEngine::local().compress(source.as_ref(), destination.as_ref(), options)
}

/// Extracts an archive into a directory, creating it if needed.
///
/// The format is detected from the file name unless
/// `options.archive_type` is set.
///
/// # Errors
///
/// Returns an error if:
/// - `source` does not exist
/// - `destination` cannot be created
/// - the archive is truncated or unreadable
///
/// # Examples
///
/// ```no_run
/// use zipper_core::ExtractOptions;
/// use zipper_core::extract;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let manifest = extract("release.tar.xz", "/tmp/release", &ExtractOptions::default())?;
/// for file in &manifest.files {
///     println!("{}", file.display());
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    options: &ExtractOptions,
) -> Result<ExtractionManifest> {
    ArchiveEngine::local().extract(source.as_ref(), destination.as_ref(), options)
}

/// Returns `true` if `source` is an existing file with the ZIP signature.
///
/// Tar-family types always report `false`.
pub fn is_valid_archive<P: AsRef<Path>>(source: P, archive_type: Option<ArchiveType>) -> bool {
    ArchiveEngine::local().is_valid_archive(source.as_ref(), archive_type)
}

/// Compresses to ZIP with an optional password.
pub fn zip<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    password: Option<&str>,
) -> Result<CompressionReport> {
    ArchiveEngine::local().zip(source.as_ref(), destination.as_ref(), password)
}

/// Extracts a ZIP with an optional password, ignoring the file name.
pub fn unzip<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    password: Option<&str>,
) -> Result<ExtractionManifest> {
    ArchiveEngine::local().unzip(source.as_ref(), destination.as_ref(), password)
}

/// Same as [`is_valid_archive`] with the type forced to ZIP.
pub fn is_valid_zip<P: AsRef<Path>>(source: P) -> bool {
    ArchiveEngine::local().is_valid_zip(source.as_ref())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ArchiveError;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_zip_round_trip() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), b"a").unwrap();
        fs::write(src.join("nested/b.txt"), b"b").unwrap();
        let archive = temp.path().join("out/archive.zip");

        let report = zip(&src, &archive, None).unwrap();
        assert_eq!(report.file_count, 2);
        assert_eq!(report.archive_type, ArchiveType::Zip);
        assert_eq!(report.size_bytes, fs::metadata(&archive).unwrap().len());
        assert!(is_valid_zip(&archive));

        let manifest = unzip(&archive, temp.path().join("dest"), None).unwrap();
        assert_eq!(manifest.file_count, 2);
        assert_eq!(
            manifest.relative_files(),
            vec![PathBuf::from("a.txt"), PathBuf::from("nested/b.txt")]
        );
    }

    #[test]
    fn test_zip_into_own_source_directory() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), b"a").unwrap();
        let archive = src.join("self.zip");

        let report = zip(&src, &archive, None).unwrap();
        assert_eq!(report.file_count, 1);

        let manifest = unzip(&archive, temp.path().join("dest"), None).unwrap();
        assert_eq!(manifest.relative_files(), vec![PathBuf::from("a.txt")]);
    }

    #[test]
    fn test_compress_unsupported_type_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        fs::write(&src, b"a").unwrap();
        let dest = temp.path().join("new/parent/out.tar");

        let options = CompressOptions::default().with_archive_type(ArchiveType::Tar);
        let err = compress(&src, &dest, &options).unwrap_err();

        assert!(matches!(err, ArchiveError::UnsupportedType(_)));
        assert!(!temp.path().join("new").exists());
    }

    #[test]
    fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = extract(
            temp.path().join("nope.zip"),
            temp.path().join("dest"),
            &ExtractOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound { .. }));
        assert!(!is_valid_archive(temp.path().join("nope.zip"), None));
    }
}
