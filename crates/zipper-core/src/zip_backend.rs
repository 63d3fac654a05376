//! ZIP support delegated to the `zip` crate.
//!
//! The engine never touches ZIP structures itself. It calls a [`ZipBackend`],
//! which works directly on paths; [`ZipCrateBackend`] is the implementation
//! used by the free functions.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use log::debug;
use log::warn;
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::unstable::write::FileOptionsExt;
use zip::write::SimpleFileOptions;

use crate::ArchiveError;
use crate::CompressOptions;
use crate::Result;
use crate::formats::compression::zip_compression;
use crate::formats::detect::starts_with_zip_magic;
use crate::fs::COPY_BUFFER_SIZE;
use crate::fs::same_location;

/// Settings for writing a ZIP archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipCreateOptions {
    /// ZipCrypto password applied to every file entry.
    pub password: Option<String>,

    /// Deflate level 1-9, 0 for stored, `None` for level 6.
    pub compression_level: Option<u8>,
}

impl ZipCreateOptions {
    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the compression level.
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level);
        self
    }
}

impl From<&CompressOptions> for ZipCreateOptions {
    fn from(options: &CompressOptions) -> Self {
        Self {
            password: options.password.clone(),
            compression_level: options.compression_level,
        }
    }
}

/// General-purpose ZIP implementation the engine delegates to.
pub trait ZipBackend {
    /// Writes `source` (a file or a directory tree) into a new archive at
    /// `dest`.
    ///
    /// A directory's contents are stored without the directory itself as a
    /// prefix. When `dest` lies inside `source` it is left out.
    fn create(&self, source: &Path, dest: &Path, options: &ZipCreateOptions) -> Result<()>;

    /// Unpacks `source` below `dest`, which already exists.
    fn extract(
        &self,
        source: &Path,
        dest: &Path,
        overwrite: bool,
        password: Option<&str>,
    ) -> Result<()>;

    /// Returns `true` if the file at `path` starts with the ZIP magic.
    fn is_zip_file(&self, path: &Path) -> bool;
}

/// [`ZipBackend`] on top of the `zip` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipCrateBackend;

impl ZipBackend for ZipCrateBackend {
    fn create(&self, source: &Path, dest: &Path, options: &ZipCreateOptions) -> Result<()> {
        let file = File::create(dest).map_err(|e| ArchiveError::write_failure(dest, e))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));

        let (method, level) = zip_compression(options.compression_level);
        let plain = SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(level);
        let file_options = match options.password.as_deref() {
            Some(password) => plain.with_deprecated_encryption(password.as_bytes()),
            None => plain,
        };

        let mut added = 0usize;
        if source.is_dir() {
            for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
                let entry = entry.map_err(|e| ArchiveError::write_failure(dest, e))?;
                if same_location(entry.path(), dest) {
                    debug!("not adding the archive to itself: {}", dest.display());
                    continue;
                }
                let relative = entry
                    .path()
                    .strip_prefix(source)
                    .map_err(|e| ArchiveError::write_failure(dest, e))?;
                let name = archive_name(relative);

                if entry.file_type().is_dir() {
                    zip.add_directory(format!("{name}/"), plain)
                        .map_err(|e| ArchiveError::write_failure(dest, e))?;
                } else if entry.file_type().is_file() {
                    zip.start_file(name.as_str(), file_options)
                        .map_err(|e| ArchiveError::write_failure(dest, e))?;
                    copy_into(&mut zip, entry.path(), dest)?;
                    added += 1;
                }
            }
        } else {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    ArchiveError::write_failure(dest, "source has no file name")
                })?;
            zip.start_file(name.as_str(), file_options)
                .map_err(|e| ArchiveError::write_failure(dest, e))?;
            copy_into(&mut zip, source, dest)?;
            added += 1;
        }

        let mut inner = zip
            .finish()
            .map_err(|e| ArchiveError::write_failure(dest, e))?;
        inner
            .flush()
            .map_err(|e| ArchiveError::write_failure(dest, e))?;
        debug!("wrote {added} files to {}", dest.display());
        Ok(())
    }

    fn extract(
        &self,
        source: &Path,
        dest: &Path,
        overwrite: bool,
        password: Option<&str>,
    ) -> Result<()> {
        let file = File::open(source)?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| {
            ArchiveError::InvalidArchive(format!("{}: {e}", source.display()))
        })?;

        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        for index in 0..archive.len() {
            let entry = match password {
                Some(password) => archive.by_index_decrypt(index, password.as_bytes()),
                None => archive.by_index(index),
            };
            let mut entry = entry
                .map_err(|e| ArchiveError::InvalidArchive(format!("entry {index}: {e}")))?;

            let Some(relative) = entry.enclosed_name() else {
                warn!("skipping zip entry with unsafe name {:?}", entry.name());
                continue;
            };
            let target = dest.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&target)
                    .map_err(|e| ArchiveError::write_failure(&target, e))?;
                continue;
            }
            if !overwrite && target.exists() {
                debug!("keeping existing {}", target.display());
                continue;
            }

            let written = write_entry(&mut entry, &target, &mut buffer)?;
            debug!("extracted {} ({written} bytes)", target.display());
        }
        Ok(())
    }

    fn is_zip_file(&self, path: &Path) -> bool {
        File::open(path)
            .and_then(starts_with_zip_magic)
            .unwrap_or(false)
    }
}

/// Archive names always use `/`.
fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn copy_into<W: Write + io::Seek>(zip: &mut ZipWriter<W>, path: &Path, dest: &Path) -> Result<()> {
    let mut file = File::open(path)?;
    io::copy(&mut file, zip).map_err(|e| ArchiveError::write_failure(dest, e))?;
    Ok(())
}

/// Streams one entry to `target`. Read errors (bad data, wrong password)
/// are `InvalidArchive`; anything on the write side is `WriteFailure`.
fn write_entry<R: Read>(reader: &mut R, target: &Path, buffer: &mut [u8]) -> Result<u64> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::write_failure(parent, e))?;
    }
    let file = File::create(target).map_err(|e| ArchiveError::write_failure(target, e))?;
    let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, file);

    let mut total = 0u64;
    loop {
        let read = match reader.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ArchiveError::InvalidArchive(format!(
                    "{}: {e}",
                    target.display()
                )));
            }
        };
        writer
            .write_all(&buffer[..read])
            .map_err(|e| ArchiveError::write_failure(target, e))?;
        total += read as u64;
    }
    writer
        .flush()
        .map_err(|e| ArchiveError::write_failure(target, e))?;
    Ok(total)
}
