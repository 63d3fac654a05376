//! What the tar driver does about each kind of failure.
//!
//! Every failure the driver or the entry extractor can hit is named by a
//! [`TarFailure`] and mapped to exactly one [`Policy`] by [`policy_for`].
//! Nothing is swallowed outside this table.

use std::fmt;

use crate::tar::header::SkipReason;

/// Reaction to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Stop the run and surface an error to the caller.
    AbortRun,
    /// Give up on the current entry, keep the stream aligned, continue.
    SkipEntry,
    /// Ignore the current block and read the next one as a header.
    SkipBlock,
}

/// Failures observed while driving a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarFailure {
    /// A non-zero block did not decode as a header.
    UndecodableHeader(SkipReason),
    /// The entry name escapes the destination or resolves to nothing.
    UnsafePath,
    /// `create_dir_all` failed for a directory entry.
    DirectoryCreate,
    /// Creating or writing a file entry failed. A failure to create its
    /// parent directories is only logged; this is what decides the entry.
    WriteFile,
    /// The stream ended inside an entry's data region.
    TruncatedData,
    /// The underlying reader (or its decompressor) returned an error.
    ReadFailure,
}

impl fmt::Display for TarFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndecodableHeader(SkipReason::EmptyName) => f.write_str("header with empty name"),
            Self::UndecodableHeader(SkipReason::UndecodableName) => {
                f.write_str("header name is not printable text")
            }
            Self::UnsafePath => f.write_str("entry path escapes the destination"),
            Self::DirectoryCreate => f.write_str("directory creation failed"),
            Self::WriteFile => f.write_str("file write failed"),
            Self::TruncatedData => f.write_str("stream ended inside entry data"),
            Self::ReadFailure => f.write_str("archive read failed"),
        }
    }
}

/// Looks up the policy for a failure.
///
/// | Failure             | Policy      |
/// |---------------------|-------------|
/// | `UndecodableHeader` | `SkipBlock` |
/// | `UnsafePath`        | `SkipEntry` |
/// | `DirectoryCreate`   | `SkipEntry` |
/// | `WriteFile`         | `SkipEntry` |
/// | `TruncatedData`     | `AbortRun`  |
/// | `ReadFailure`       | `AbortRun`  |
#[must_use]
pub const fn policy_for(failure: TarFailure) -> Policy {
    match failure {
        TarFailure::UndecodableHeader(_) => Policy::SkipBlock,
        TarFailure::UnsafePath
        | TarFailure::DirectoryCreate
        | TarFailure::WriteFile => Policy::SkipEntry,
        TarFailure::TruncatedData | TarFailure::ReadFailure => Policy::AbortRun,
    }
}
