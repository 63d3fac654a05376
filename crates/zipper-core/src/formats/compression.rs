//! Decompression layers placed in front of the tar parser.
//!
//! The tar driver only ever sees a plain byte stream. For `.tar.gz`,
//! `.tar.bz2`, `.tar.xz` and `.tar.zst` sources the raw file reader is
//! wrapped in the matching decoder here.
//!
//! | Codec | Crate    | Suffixes                |
//! |-------|----------|-------------------------|
//! | Gzip  | `flate2` | `.tar.gz`, `.tgz`       |
//! | Bzip2 | `bzip2`  | `.tar.bz2`, `.tbz[2]`   |
//! | Xz    | `xz2`    | `.tar.xz`, `.txz`       |
//! | Zstd  | `zstd`   | `.tar.zst`, `.zst`      |

use std::io::Read;

/// Compression codec wrapped around a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionCodec {
    /// Gzip (deflate).
    Gzip,
    /// Bzip2 (Burrows-Wheeler).
    Bzip2,
    /// Xz (LZMA2).
    Xz,
    /// Zstandard.
    Zstd,
}

impl CompressionCodec {
    /// Returns a human-readable name for this codec.
    ///
    /// # Examples
    ///
    /// ```
    /// use zipper_core::formats::compression::CompressionCodec;
    ///
    /// assert_eq!(CompressionCodec::Gzip.name(), "gzip");
    /// assert_eq!(CompressionCodec::Zstd.name(), "zstd");
    /// ```
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }
}

/// Wraps `reader` in the decoder for `codec`, or returns it unchanged.
///
/// Multi-member gzip and multi-stream xz/bzip2 inputs are decoded to the end,
/// matching what the command-line tools produce when archives are
/// concatenated.
///
/// # Errors
///
/// Only the zstd decoder can fail at construction time (it allocates its
/// context eagerly).
pub fn wrap_reader<'a, R: Read + 'a>(
    reader: R,
    codec: Option<CompressionCodec>,
) -> std::io::Result<Box<dyn Read + 'a>> {
    let wrapped: Box<dyn Read + 'a> = match codec {
        None => Box::new(reader),
        Some(CompressionCodec::Gzip) => Box::new(flate2::read::MultiGzDecoder::new(reader)),
        Some(CompressionCodec::Bzip2) => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
        Some(CompressionCodec::Xz) => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
        Some(CompressionCodec::Zstd) => Box::new(zstd::stream::read::Decoder::new(reader)?),
    };
    Ok(wrapped)
}

/// Converts the user compression level (0-9) to a ZIP method and level.
///
/// - `Some(0)`: stored, no compression
/// - `None`: deflate at level 6
/// - `1..=9`: deflate at that level; larger values are clamped to 9
#[must_use]
pub fn zip_compression(level: Option<u8>) -> (zip::CompressionMethod, Option<i64>) {
    match level {
        Some(0) => (zip::CompressionMethod::Stored, None),
        None => (zip::CompressionMethod::Deflated, Some(6)),
        Some(n) => (zip::CompressionMethod::Deflated, Some(i64::from(n.min(9)))),
    }
}
