//! Error types for archive operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors surfaced to callers of `compress`, `extract` and friends.
///
/// Header-decode anomalies and best-effort directory failures inside a tar
/// run never show up here; the driver absorbs them according to
/// [`crate::tar::policy`].
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The source path does not exist.
    #[error("source not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The backend or the filesystem failed to write.
    #[error("write failed for {path}: {reason}")]
    WriteFailure {
        /// Path that could not be written.
        path: PathBuf,
        /// Backend or OS description of the failure.
        reason: String,
    },

    /// The requested archive type is not implemented for this operation.
    #[error("unsupported archive type: {0}")]
    UnsupportedType(String),

    /// The archive is structurally broken beyond what the parser tolerates.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Builds a `WriteFailure` from any displayable cause.
    pub fn write_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::WriteFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` if retrying with different inputs could succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use zipper_core::ArchiveError;
    /// use std::path::PathBuf;
    ///
    /// let err = ArchiveError::NotFound {
    ///     path: PathBuf::from("missing.tar"),
    /// };
    /// assert!(err.is_recoverable());
    ///
    /// let err = ArchiveError::InvalidArchive("truncated entry".to_string());
    /// assert!(!err.is_recoverable());
    /// ```
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::UnsupportedType(_) | Self::WriteFailure { .. }
        )
    }

    /// Returns a context string for this error, if available.
    ///
    /// # Examples
    ///
    /// ```
    /// use zipper_core::ArchiveError;
    ///
    /// let err = ArchiveError::InvalidArchive("bad header".to_string());
    /// assert_eq!(err.context(), Some("bad header"));
    ///
    /// let err = ArchiveError::UnsupportedType("tar.gz".to_string());
    /// assert_eq!(err.context(), Some("tar.gz"));
    /// ```
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) | Self::UnsupportedType(msg) => Some(msg),
            Self::WriteFailure { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ArchiveError::NotFound {
            path: PathBuf::from("/tmp/missing.zip"),
        };
        assert_eq!(err.to_string(), "source not found: /tmp/missing.zip");
    }

    #[test]
    fn test_write_failure_display() {
        let err = ArchiveError::write_failure("out.zip", "disk full");
        let display = err.to_string();
        assert!(display.contains("out.zip"));
        assert!(display.contains("disk full"));
        assert_eq!(err.context(), Some("disk full"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ArchiveError = io_err.into();
        assert!(matches!(err, ArchiveError::Io(_)));
        assert_eq!(err.context(), None);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(ArchiveError::UnsupportedType("tar".into()).is_recoverable());
        assert!(ArchiveError::write_failure("x", "y").is_recoverable());
        assert!(!ArchiveError::InvalidArchive("corrupted".into()).is_recoverable());
        let io_err = std::io::Error::other("boom");
        assert!(!ArchiveError::from(io_err).is_recoverable());
    }
}
