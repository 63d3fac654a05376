//! State machine that walks a tar stream block by block.
//!
//! ```text
//! ReadingHeader ──short read / zero block──▶ Terminated
//!      │  ▲
//!      │  └──── entry done / block skipped
//!      ▼
//! ProcessingDirectory | ProcessingFile
//! ```

use std::io::Read;
use std::path::Path;

use log::debug;
use log::info;
use log::warn;

use crate::ArchiveError;
use crate::Result;
use crate::fs::Filesystem;
use crate::tar::entry::EntryExtractor;
use crate::tar::entry::EntryFailure;
use crate::tar::entry::EntryOutcome;
use crate::tar::header::BLOCK_SIZE;
use crate::tar::header::EntryKind;
use crate::tar::header::HeaderDecode;
use crate::tar::header::TarHeader;
use crate::tar::header::decode_header;
use crate::tar::header::is_zero_block;
use crate::tar::policy::Policy;
use crate::tar::policy::TarFailure;
use crate::tar::policy::policy_for;
use crate::tar::source::ByteSource;

/// Why the driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    /// Fewer than 512 bytes were left for a header.
    #[default]
    EndOfStream,
    /// The standard two-zero-block trailer.
    TwoZeroBlocks,
    /// A zero block followed by something else. The second block is
    /// discarded, not parsed.
    LoneZeroBlock,
}

/// Statistics from one driver run.
///
/// The counters are informational; the manifest built from the destination
/// tree is what callers get back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TarOutcome {
    /// Files materialized (including empty files).
    pub files_extracted: usize,
    /// Directory entries created.
    pub directories_created: usize,
    /// Entries given up on under `Policy::SkipEntry`.
    pub entries_skipped: usize,
    /// Blocks ignored under `Policy::SkipBlock`.
    pub blocks_skipped: usize,
    /// Content bytes written.
    pub bytes_written: u64,
    /// Bytes consumed from the (decompressed) stream.
    pub bytes_read: u64,
    /// How the run ended.
    pub termination: Termination,
}

enum State {
    ReadingHeader,
    ProcessingDirectory(TarHeader),
    ProcessingFile(TarHeader),
    Terminated(Termination),
}

/// Drives one tar stream into a destination directory.
pub struct TarDriver<'a, F: Filesystem + ?Sized, R> {
    source: ByteSource<R>,
    extractor: EntryExtractor<'a, F>,
    outcome: TarOutcome,
}

impl<'a, F: Filesystem + ?Sized, R: Read> TarDriver<'a, F, R> {
    /// Prepares a run reading `reader` and writing below `dest`.
    ///
    /// `dest` must already exist.
    pub fn new(reader: R, fs: &'a mut F, dest: &'a Path) -> Self {
        Self {
            source: ByteSource::new(reader),
            extractor: EntryExtractor::new(fs, dest),
            outcome: TarOutcome::default(),
        }
    }

    /// Runs the state machine to `Terminated`.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures whose policy is
    /// [`Policy::AbortRun`]. Files written before the failure stay on disk.
    pub fn run(mut self) -> Result<TarOutcome> {
        let mut state = State::ReadingHeader;
        loop {
            state = match state {
                State::ReadingHeader => self.read_header()?,
                State::ProcessingDirectory(header) | State::ProcessingFile(header) => {
                    self.process(&header)?;
                    State::ReadingHeader
                }
                State::Terminated(termination) => {
                    self.outcome.termination = termination;
                    self.outcome.bytes_read = self.source.position();
                    info!(
                        "tar run finished ({termination:?}): {} files, {} directories, {} entries skipped, {} blocks skipped",
                        self.outcome.files_extracted,
                        self.outcome.directories_created,
                        self.outcome.entries_skipped,
                        self.outcome.blocks_skipped
                    );
                    return Ok(self.outcome);
                }
            };
        }
    }

    fn read_header(&mut self) -> Result<State> {
        let mut block = [0u8; BLOCK_SIZE];
        if self.read_full_block(&mut block)? < BLOCK_SIZE {
            return Ok(State::Terminated(Termination::EndOfStream));
        }

        if is_zero_block(&block) {
            let read = self.read_full_block(&mut block)?;
            let termination = if read == BLOCK_SIZE && is_zero_block(&block) {
                Termination::TwoZeroBlocks
            } else {
                Termination::LoneZeroBlock
            };
            return Ok(State::Terminated(termination));
        }

        match decode_header(&block) {
            HeaderDecode::Header(header) => {
                if !header.checksum_matches() {
                    debug!(
                        "checksum mismatch for {:?} at offset {} (stored {:?}, computed {}), processing anyway",
                        header.name,
                        self.header_offset(),
                        header.stored_checksum,
                        header.computed_checksum
                    );
                }
                Ok(match header.kind() {
                    EntryKind::Directory => State::ProcessingDirectory(header),
                    EntryKind::File => State::ProcessingFile(header),
                })
            }
            HeaderDecode::Skip(reason) => {
                self.apply(EntryFailure {
                    failure: TarFailure::UndecodableHeader(reason),
                    cause: None,
                })?;
                Ok(State::ReadingHeader)
            }
        }
    }

    fn process(&mut self, header: &TarHeader) -> Result<()> {
        match self.extractor.extract(header, &mut self.source) {
            Ok(EntryOutcome::File { path, bytes }) => {
                debug!("extracted {} ({bytes} bytes)", path.display());
                self.outcome.files_extracted += 1;
                self.outcome.bytes_written += bytes;
            }
            Ok(EntryOutcome::Directory(path)) => {
                debug!("created directory {}", path.display());
                self.outcome.directories_created += 1;
            }
            Err(failure) => {
                warn!("entry {:?}: {}", header.name, failure.failure);
                self.apply(failure)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, failure: EntryFailure) -> Result<()> {
        match policy_for(failure.failure) {
            Policy::SkipBlock => {
                warn!(
                    "skipping block at offset {}: {}",
                    self.header_offset(),
                    failure.failure
                );
                self.outcome.blocks_skipped += 1;
                Ok(())
            }
            Policy::SkipEntry => {
                if let Some(cause) = &failure.cause {
                    debug!("skipped entry cause: {cause}");
                }
                self.outcome.entries_skipped += 1;
                Ok(())
            }
            Policy::AbortRun => Err(self.abort(failure)),
        }
    }

    fn abort(&self, failure: EntryFailure) -> ArchiveError {
        match (failure.failure, failure.cause) {
            (TarFailure::ReadFailure, Some(cause)) => ArchiveError::Io(cause),
            (kind, Some(cause)) => ArchiveError::InvalidArchive(format!(
                "{kind} at offset {}: {cause}",
                self.source.position()
            )),
            (kind, None) => ArchiveError::InvalidArchive(format!(
                "{kind} at offset {}",
                self.source.position()
            )),
        }
    }

    fn read_full_block(&mut self, block: &mut [u8; BLOCK_SIZE]) -> Result<usize> {
        match self.source.read_block(block) {
            Ok(read) => Ok(read),
            Err(cause) => {
                self.apply(EntryFailure {
                    failure: TarFailure::ReadFailure,
                    cause: Some(cause),
                })?;
                Ok(0)
            }
        }
    }

    fn header_offset(&self) -> u64 {
        self.source.position().saturating_sub(BLOCK_SIZE as u64)
    }
}

/// Extracts a plain tar stream below `dest` using `fs`.
///
/// `dest` must already exist.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use zipper_core::fs::{Filesystem, MemoryFs};
/// use zipper_core::tar::extract_tar;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut fs = MemoryFs::new();
/// fs.create_dir_all(Path::new("/out"))?;
///
/// // An empty archive is just the two-block trailer.
/// let outcome = extract_tar(&[0u8; 1024][..], &mut fs, Path::new("/out"))?;
/// assert_eq!(outcome.files_extracted, 0);
/// # Ok(())
/// # }
/// ```
pub fn extract_tar<F: Filesystem + ?Sized, R: Read>(
    reader: R,
    fs: &mut F,
    dest: &Path,
) -> Result<TarOutcome> {
    TarDriver::new(reader, fs, dest).run()
}
