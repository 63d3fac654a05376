//! Decoding of classic 512-byte tar header blocks.
//!
//! Only the fields the extractor needs are read: name, size, type flag and
//! (for diagnostics) the checksum. Layout of the block:
//!
//! | Offset | Length | Field      |
//! |--------|--------|------------|
//! | 0      | 100    | name       |
//! | 124    | 12     | size       |
//! | 148    | 8      | checksum   |
//! | 156    | 1      | type flag  |

use std::ops::Range;

/// Size of a header block and of the data alignment unit.
pub const BLOCK_SIZE: usize = 512;

/// One raw header block.
pub type HeaderBlock = [u8; BLOCK_SIZE];

const NAME: Range<usize> = 0..100;
const SIZE: Range<usize> = 124..136;
const CHECKSUM: Range<usize> = 148..156;
const TYPE_FLAG: usize = 156;

/// Type flag byte marking a directory entry (`'5'`).
pub const DIRECTORY_FLAG: u8 = b'5';

/// How the extractor treats an entry.
///
/// Links, devices, FIFOs and unknown flags are all `File`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Type flag `'5'`.
    Directory,
    /// Every other type flag, including `'0'` and NUL.
    File,
}

/// Attributes decoded from a header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarHeader {
    /// Entry name, cut at the first NUL and stripped of trailing spaces.
    pub name: String,
    /// Declared size of the data region in bytes.
    pub size: u64,
    /// Raw type flag byte.
    pub type_flag: u8,
    /// Checksum stored in the header, if the field parses.
    pub stored_checksum: Option<u32>,
    /// Checksum computed over the block with the checksum field as spaces.
    pub computed_checksum: u32,
}

impl TarHeader {
    /// Classifies the entry from its type flag.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        if self.type_flag == DIRECTORY_FLAG {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// Number of padding bytes following the data region.
    #[must_use]
    pub const fn padding(&self) -> u64 {
        padding_for(self.size)
    }

    /// Returns `true` when the stored checksum equals the computed one.
    ///
    /// Extraction does not act on this; it is exposed for diagnostics.
    #[must_use]
    pub fn checksum_matches(&self) -> bool {
        self.stored_checksum == Some(self.computed_checksum)
    }
}

/// Why a non-zero block was not accepted as a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The name field is empty.
    EmptyName,
    /// The name field is not UTF-8 or has no printable character.
    UndecodableName,
}

/// Result of decoding one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderDecode {
    /// The block is a usable header.
    Header(TarHeader),
    /// The block is noise; the driver moves on to the next block.
    Skip(SkipReason),
}

/// Decodes one header block.
///
/// The caller is expected to have ruled out all-zero blocks with
/// [`is_zero_block`] first; a zero block decodes as `Skip(EmptyName)`.
///
/// # Examples
///
/// ```
/// use zipper_core::tar::header::{BLOCK_SIZE, HeaderDecode, decode_header};
///
/// let mut block = [0u8; BLOCK_SIZE];
/// block[..5].copy_from_slice(b"a.txt");
/// block[124..135].copy_from_slice(b"00000000012");
/// block[156] = b'0';
///
/// let HeaderDecode::Header(header) = decode_header(&block) else {
///     panic!("expected a header");
/// };
/// assert_eq!(header.name, "a.txt");
/// assert_eq!(header.size, 10);
/// ```
#[must_use]
pub fn decode_header(block: &HeaderBlock) -> HeaderDecode {
    let name = match decode_name(&block[NAME]) {
        Ok(name) => name,
        Err(reason) => return HeaderDecode::Skip(reason),
    };

    HeaderDecode::Header(TarHeader {
        name,
        size: parse_octal(&block[SIZE]).unwrap_or(0),
        type_flag: block[TYPE_FLAG],
        stored_checksum: parse_octal(&block[CHECKSUM]).and_then(|v| u32::try_from(v).ok()),
        computed_checksum: compute_checksum(block),
    })
}

/// Returns `true` if every byte of the block is zero.
#[must_use]
pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Padding needed to round `size` up to the next block boundary.
///
/// # Examples
///
/// ```
/// use zipper_core::tar::header::padding_for;
///
/// assert_eq!(padding_for(10), 502);
/// assert_eq!(padding_for(512), 0);
/// assert_eq!(padding_for(0), 0);
/// ```
#[must_use]
pub const fn padding_for(size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - size % block) % block
}

/// Parses a NUL/space padded octal field.
///
/// Returns `None` for an empty field or anything that is not octal ASCII.
#[must_use]
pub fn parse_octal(field: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(until_nul(field)).ok()?;
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace());
    if text.is_empty() {
        return None;
    }
    u64::from_str_radix(text, 8).ok()
}

fn decode_name(field: &[u8]) -> Result<String, SkipReason> {
    let raw = until_nul(field);
    let name = std::str::from_utf8(raw).map_err(|_| SkipReason::UndecodableName)?;
    let name = name.trim_end_matches(' ');
    if name.is_empty() {
        return Err(SkipReason::EmptyName);
    }
    // Stray control bytes are kept; only a name with nothing printable is noise.
    if !name.chars().any(|c| !c.is_control() && !c.is_whitespace()) {
        return Err(SkipReason::UndecodableName);
    }
    Ok(name.to_string())
}

fn until_nul(field: &[u8]) -> &[u8] {
    field
        .iter()
        .position(|&b| b == 0)
        .map_or(field, |end| &field[..end])
}

fn compute_checksum(block: &HeaderBlock) -> u32 {
    let spaces = u32::from(b' ') * 8;
    block[..CHECKSUM.start]
        .iter()
        .chain(&block[CHECKSUM.end..])
        .map(|&b| u32::from(b))
        .sum::<u32>()
        + spaces
}
