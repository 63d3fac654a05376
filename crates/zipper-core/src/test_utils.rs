//! Builders for hand-assembled tar streams.
//!
//! Unlike a real tar writer these let tests produce malformed input: bad
//! names, lone zero blocks, truncated data.

#![allow(clippy::missing_panics_doc)]

use crate::tar::header::BLOCK_SIZE;
use crate::tar::header::HeaderBlock;
use crate::tar::header::padding_for;

/// Builder for a single header block.
pub struct RawBlock {
    block: HeaderBlock,
}

impl RawBlock {
    /// Regular file header with the given name and declared size.
    pub fn file(name: &str, size: u64) -> Self {
        let mut raw = Self {
            block: [0u8; BLOCK_SIZE],
        };
        raw.block[..name.len()].copy_from_slice(name.as_bytes());
        raw.block[100..108].copy_from_slice(b"0000644\0");
        let size = format!("{size:011o}\0");
        raw.block[124..136].copy_from_slice(size.as_bytes());
        raw.block[156] = b'0';
        raw.block[257..263].copy_from_slice(b"ustar\0");
        raw.block[263..265].copy_from_slice(b"00");
        raw
    }

    /// Directory header with the given name.
    pub fn directory(name: &str) -> Self {
        Self::file(name, 0).type_flag(b'5')
    }

    /// Overrides the type flag.
    pub fn type_flag(mut self, flag: u8) -> Self {
        self.block[156] = flag;
        self
    }

    /// Finalizes the checksum and returns the block.
    pub fn build(mut self) -> HeaderBlock {
        self.block[148..156].copy_from_slice(b"        ");
        let sum: u32 = self.block.iter().map(|&b| u32::from(b)).sum();
        let field = format!("{sum:06o}\0 ");
        self.block[148..156].copy_from_slice(field.as_bytes());
        self.block
    }
}

/// Builder for a whole tar stream.
#[derive(Default)]
pub struct TarStream {
    bytes: Vec<u8>,
}

impl TarStream {
    /// Starts an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a regular file with its data and padding.
    pub fn file(self, name: &str, data: &[u8]) -> Self {
        let block = RawBlock::file(name, data.len() as u64).build();
        self.block(&block).data(data)
    }

    /// Appends a directory header.
    pub fn directory(self, name: &str) -> Self {
        let block = RawBlock::directory(name).build();
        self.block(&block)
    }

    /// Appends a raw block verbatim.
    pub fn block(mut self, block: &[u8; BLOCK_SIZE]) -> Self {
        self.bytes.extend_from_slice(block);
        self
    }

    /// Appends data followed by zero padding to the next block boundary.
    pub fn data(mut self, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(data);
        let padding = usize::try_from(padding_for(data.len() as u64)).unwrap_or(0);
        self.bytes.resize(self.bytes.len() + padding, 0);
        self
    }

    /// Appends arbitrary bytes with no padding.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Appends `count` all-zero blocks.
    pub fn zero_blocks(mut self, count: usize) -> Self {
        self.bytes.resize(self.bytes.len() + count * BLOCK_SIZE, 0);
        self
    }

    /// Appends the standard two-block trailer and returns the bytes.
    pub fn finish(self) -> Vec<u8> {
        self.zero_blocks(2).into_bytes()
    }

    /// Returns the bytes as built, without a trailer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
