//! Self-contained tar parser.
//!
//! Reads 512-byte header blocks from a sequential [`source::ByteSource`],
//! dispatches directory and file entries to [`entry::EntryExtractor`], and
//! stops at the two-zero-block trailer or end of stream. Every failure goes
//! through the table in [`policy`].

pub mod driver;
pub mod entry;
pub mod header;
pub mod policy;
pub mod source;

pub use driver::TarOutcome;
pub use driver::Termination;
pub use driver::extract_tar;
pub use header::BLOCK_SIZE;
pub use header::TarHeader;
pub use policy::Policy;
pub use policy::TarFailure;
