//! Archive engine with a self-contained tar parser and a ZIP backend.
//!
//! `zipper-core` extracts ZIP archives and the tar family (`.tar`,
//! `.tar.gz`, `.tar.bz2`, `.tar.xz`, `.tar.zst`), and creates ZIP archives.
//! Tar streams are parsed block by block by [`tar`] without any external
//! archive library; ZIP goes through a [`zip_backend::ZipBackend`].
//!
//! # Examples
//!
//! ```no_run
//! use zipper_core::ExtractOptions;
//! use zipper_core::extract;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = extract("archive.tar.gz", "/output/dir", &ExtractOptions::default())?;
//! println!("{} files in {}", manifest.file_count, manifest.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! Logging goes through the `log` facade; install any logger to see it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod formats;
pub mod fs;
pub mod report;
pub mod tar;
pub mod zip_backend;

#[cfg(test)]
mod test_utils;

// Re-export main API types
pub use api::compress;
pub use api::extract;
pub use api::is_valid_archive;
pub use api::is_valid_zip;
pub use api::unzip;
pub use api::zip;
pub use config::CompressOptions;
pub use config::ExtractOptions;
pub use engine::ArchiveEngine;
pub use error::ArchiveError;
pub use error::Result;
pub use formats::detect::ArchiveType;
pub use report::CompressionReport;
pub use report::ExtractionManifest;
