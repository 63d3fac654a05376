//! Archive format identification and decompression layers.

pub mod compression;
pub mod detect;

pub use compression::CompressionCodec;
pub use detect::ArchiveType;
pub use detect::detect_archive_type;
