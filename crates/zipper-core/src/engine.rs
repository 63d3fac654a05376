//! `compress`, `extract` and `is_valid_archive` over injected collaborators.

use std::path::Path;

use log::debug;
use log::info;

use crate::ArchiveError;
use crate::CompressOptions;
use crate::ExtractOptions;
use crate::Result;
use crate::aggregate::build_manifest;
use crate::aggregate::count_source_files;
use crate::formats::compression::wrap_reader;
use crate::formats::detect::ArchiveType;
use crate::formats::detect::detect_archive_type;
use crate::fs::Filesystem;
use crate::fs::LocalFs;
use crate::report::CompressionReport;
use crate::report::ExtractionManifest;
use crate::tar::extract_tar;
use crate::zip_backend::ZipBackend;
use crate::zip_backend::ZipCrateBackend;
use crate::zip_backend::ZipCreateOptions;

/// Archive engine parameterized over its filesystem and ZIP backend.
///
/// The tar path goes entirely through `F`. The ZIP path hands paths to `Z`,
/// which does its own I/O.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use zipper_core::ArchiveEngine;
/// use zipper_core::ExtractOptions;
/// use zipper_core::fs::MemoryFs;
/// use zipper_core::zip_backend::ZipCrateBackend;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut fs = MemoryFs::new();
/// fs.insert_file("/in/empty.tar", &[0u8; 1024])?;
///
/// let mut engine = ArchiveEngine::new(fs, ZipCrateBackend);
/// let manifest = engine.extract(
///     Path::new("/in/empty.tar"),
///     Path::new("/out/nested"),
///     &ExtractOptions::default(),
/// )?;
/// assert_eq!(manifest.file_count, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct ArchiveEngine<F = LocalFs, Z = ZipCrateBackend> {
    fs: F,
    zip: Z,
}

impl ArchiveEngine {
    /// Engine over the real filesystem and the `zip` crate.
    #[must_use]
    pub const fn local() -> Self {
        Self {
            fs: LocalFs,
            zip: ZipCrateBackend,
        }
    }
}

impl<F: Filesystem, Z: ZipBackend> ArchiveEngine<F, Z> {
    /// Creates an engine from its collaborators.
    pub const fn new(fs: F, zip: Z) -> Self {
        Self { fs, zip }
    }

    /// Returns the filesystem.
    pub const fn fs(&self) -> &F {
        &self.fs
    }

    /// Consumes the engine and returns the filesystem.
    pub fn into_fs(self) -> F {
        self.fs
    }

    /// Packs `source` (file or directory) into an archive at `dest`.
    ///
    /// Missing parent directories of `dest` are created once the type is
    /// known to be supported. An archive placed inside `source` is not
    /// packed into itself and is not counted.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::NotFound`] if `source` does not exist
    /// - [`ArchiveError::UnsupportedType`] for anything but ZIP
    /// - [`ArchiveError::WriteFailure`] if the backend fails
    pub fn compress(
        &mut self,
        source: &Path,
        dest: &Path,
        options: &CompressOptions,
    ) -> Result<CompressionReport> {
        if !self.fs.exists(source) {
            return Err(ArchiveError::NotFound {
                path: source.to_path_buf(),
            });
        }
        if options.archive_type != ArchiveType::Zip {
            return Err(ArchiveError::UnsupportedType(
                options.archive_type.to_string(),
            ));
        }
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| ArchiveError::write_failure(parent, e))?;
        }

        self.zip
            .create(source, dest, &ZipCreateOptions::from(options))?;

        let report = CompressionReport {
            path: dest.to_path_buf(),
            size_bytes: self
                .fs
                .file_len(dest)
                .map_err(|e| ArchiveError::write_failure(dest, e))?,
            file_count: count_source_files(&self.fs, source, dest)?,
            archive_type: options.archive_type,
        };
        info!(
            "compressed {} into {} ({} files, {} bytes)",
            source.display(),
            dest.display(),
            report.file_count,
            report.size_bytes
        );
        Ok(report)
    }

    /// Unpacks `source` below `dest`.
    ///
    /// The type comes from `options.archive_type` when set, otherwise from
    /// the file name. `dest` and its ancestors are created before anything
    /// is written. The returned manifest lists every regular file under
    /// `dest` afterwards.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::NotFound`] if `source` does not exist
    /// - [`ArchiveError::WriteFailure`] if `dest` cannot be created
    /// - [`ArchiveError::InvalidArchive`] if a tar stream is truncated
    ///   inside an entry or a ZIP cannot be read
    /// - [`ArchiveError::Io`] if reading or decompressing the source fails
    pub fn extract(
        &mut self,
        source: &Path,
        dest: &Path,
        options: &ExtractOptions,
    ) -> Result<ExtractionManifest> {
        if !self.fs.exists(source) {
            return Err(ArchiveError::NotFound {
                path: source.to_path_buf(),
            });
        }
        let archive_type = options
            .archive_type
            .unwrap_or_else(|| detect_archive_type(source));
        let dest = std::path::absolute(dest)?;
        self.fs
            .create_dir_all(&dest)
            .map_err(|e| ArchiveError::write_failure(&dest, e))?;
        debug!(
            "extracting {} as {archive_type} into {}",
            source.display(),
            dest.display()
        );

        if archive_type.is_tar_family() {
            let reader = wrap_reader(self.fs.open_read(source)?, archive_type.codec())?;
            extract_tar(reader, &mut self.fs, &dest)?;
        } else {
            self.zip.extract(
                source,
                &dest,
                options.overwrite,
                options.password.as_deref(),
            )?;
        }

        build_manifest(&self.fs, &dest, archive_type)
    }

    /// Returns `true` only for an existing ZIP file that starts with the
    /// ZIP magic.
    ///
    /// The tar family is never reported valid: there is no cheap signature
    /// to sniff for it.
    pub fn is_valid_archive(&self, source: &Path, archive_type: Option<ArchiveType>) -> bool {
        let archive_type = archive_type.unwrap_or_else(|| detect_archive_type(source));
        if archive_type.is_tar_family() {
            debug!("{} is {archive_type}; not validated", source.display());
            return false;
        }
        self.fs.exists(source) && self.zip.is_zip_file(source)
    }

    /// Compresses `source` to a ZIP at `dest`.
    pub fn zip(
        &mut self,
        source: &Path,
        dest: &Path,
        password: Option<&str>,
    ) -> Result<CompressionReport> {
        let mut options = CompressOptions::default();
        options.password = password.map(str::to_string);
        self.compress(source, dest, &options)
    }

    /// Extracts `source` as a ZIP regardless of its name.
    pub fn unzip(
        &mut self,
        source: &Path,
        dest: &Path,
        password: Option<&str>,
    ) -> Result<ExtractionManifest> {
        let mut options = ExtractOptions::default().with_archive_type(ArchiveType::Zip);
        options.password = password.map(str::to_string);
        self.extract(source, dest, &options)
    }

    /// Checks `source` as a ZIP regardless of its name.
    pub fn is_valid_zip(&self, source: &Path) -> bool {
        self.is_valid_archive(source, Some(ArchiveType::Zip))
    }
}
