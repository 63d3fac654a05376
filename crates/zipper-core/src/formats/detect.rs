//! Archive format detection.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::ArchiveError;
use crate::formats::compression::CompressionCodec;

/// ZIP local file header signature (`PK\x03\x04`).
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Suffixes routed to the tar code path, longest first so `.tar.gz` wins
/// over a bare `.gz`-style match.
const TAR_SUFFIXES: [(&str, ArchiveType); 10] = [
    (".tar.bz2", ArchiveType::TarBz2),
    (".tar.zst", ArchiveType::TarZst),
    (".tar.gz", ArchiveType::TarGz),
    (".tar.xz", ArchiveType::TarXz),
    (".tbz2", ArchiveType::TarBz2),
    (".tar", ArchiveType::Tar),
    (".tgz", ArchiveType::TarGz),
    (".tbz", ArchiveType::TarBz2),
    (".txz", ArchiveType::TarXz),
    (".zst", ArchiveType::TarZst),
];

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveType {
    /// ZIP archive.
    Zip,
    /// Tar archive (uncompressed).
    Tar,
    /// Gzip-compressed tar archive.
    TarGz,
    /// Bzip2-compressed tar archive.
    TarBz2,
    /// XZ-compressed tar archive.
    TarXz,
    /// Zstd-compressed tar archive.
    TarZst,
}

impl ArchiveType {
    /// Returns `true` for every member of the tar family.
    #[must_use]
    pub const fn is_tar_family(self) -> bool {
        !matches!(self, Self::Zip)
    }

    /// Returns the decompression layer that sits in front of the tar parser.
    ///
    /// `None` for plain tar and for ZIP.
    #[must_use]
    pub const fn codec(self) -> Option<CompressionCodec> {
        match self {
            Self::Zip | Self::Tar => None,
            Self::TarGz => Some(CompressionCodec::Gzip),
            Self::TarBz2 => Some(CompressionCodec::Bzip2),
            Self::TarXz => Some(CompressionCodec::Xz),
            Self::TarZst => Some(CompressionCodec::Zstd),
        }
    }

    /// Returns the canonical type name used by callers.
    ///
    /// # Examples
    ///
    /// ```
    /// use zipper_core::ArchiveType;
    ///
    /// assert_eq!(ArchiveType::TarGz.as_str(), "tar.gz");
    /// assert_eq!(ArchiveType::Zip.as_str(), "zip");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::TarZst => "tar.zst",
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveType {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            "tar.bz2" | "tbz" | "tbz2" => Ok(Self::TarBz2),
            "tar.xz" | "txz" => Ok(Self::TarXz),
            "tar.zst" | "zst" => Ok(Self::TarZst),
            _ => Err(ArchiveError::UnsupportedType(s.to_string())),
        }
    }
}

/// Classifies a source by its case-insensitive file-name suffix.
///
/// Anything that is not a recognized tar-family suffix is routed to ZIP.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use zipper_core::ArchiveType;
/// use zipper_core::formats::detect::detect_archive_type;
///
/// assert_eq!(detect_archive_type(Path::new("a.TAR.GZ")), ArchiveType::TarGz);
/// assert_eq!(detect_archive_type(Path::new("bundle.apk")), ArchiveType::Zip);
/// ```
#[must_use]
pub fn detect_archive_type(path: &Path) -> ArchiveType {
    let Some(name) = path.file_name() else {
        return ArchiveType::Zip;
    };
    let name = name.to_string_lossy().to_ascii_lowercase();

    TAR_SUFFIXES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map_or(ArchiveType::Zip, |&(_, kind)| kind)
}

/// Returns `true` when the stream starts with the ZIP local-header magic.
///
/// Streams shorter than four bytes are never ZIP.
pub fn starts_with_zip_magic<R: Read>(reader: R) -> std::io::Result<bool> {
    let mut head = Vec::with_capacity(ZIP_MAGIC.len());
    reader.take(ZIP_MAGIC.len() as u64).read_to_end(&mut head)?;
    Ok(head == ZIP_MAGIC)
}
