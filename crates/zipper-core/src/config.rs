//! Options for `compress` and `extract`.

use crate::formats::detect::ArchiveType;

/// Options for [`crate::compress`].
///
/// # Examples
///
/// ```
/// use zipper_core::CompressOptions;
///
/// let options = CompressOptions::default()
///     .with_password("hunter2")
///     .with_compression_level(9);
/// assert_eq!(options.compression_level, Some(9));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressOptions {
    /// Archive format to create.
    ///
    /// Default: [`ArchiveType::Zip`], the only format `compress` implements.
    pub archive_type: ArchiveType,

    /// Encrypts entries with ZipCrypto when set.
    ///
    /// Default: `None`.
    pub password: Option<String>,

    /// Deflate level 1-9, or 0 to store entries uncompressed.
    ///
    /// Default: `None` (level 6).
    pub compression_level: Option<u8>,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            archive_type: ArchiveType::Zip,
            password: None,
            compression_level: None,
        }
    }
}

impl CompressOptions {
    /// Sets the archive format.
    #[must_use]
    pub fn with_archive_type(mut self, archive_type: ArchiveType) -> Self {
        self.archive_type = archive_type;
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the compression level. Values above 9 are clamped.
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level.min(9));
        self
    }
}

/// Options for [`crate::extract`].
///
/// # Examples
///
/// ```
/// use zipper_core::ArchiveType;
/// use zipper_core::ExtractOptions;
///
/// let options = ExtractOptions::default()
///     .with_archive_type(ArchiveType::TarGz)
///     .with_overwrite(false);
/// assert!(!options.overwrite);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Forces a format instead of detecting it from the file name.
    ///
    /// Default: `None`.
    pub archive_type: Option<ArchiveType>,

    /// Password for encrypted ZIP entries. Ignored for tar.
    ///
    /// Default: `None`.
    pub password: Option<String>,

    /// Replace files that already exist in the destination.
    ///
    /// Applies to ZIP extraction; the tar parser always overwrites.
    ///
    /// Default: `true`.
    pub overwrite: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            archive_type: None,
            password: None,
            overwrite: true,
        }
    }
}

impl ExtractOptions {
    /// Forces the archive format.
    #[must_use]
    pub fn with_archive_type(mut self, archive_type: ArchiveType) -> Self {
        self.archive_type = Some(archive_type);
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets whether existing files are replaced.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}
