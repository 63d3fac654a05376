//! Sequential byte source with a monotonically advancing cursor.

use std::io;
use std::io::Read;

use crate::fs::COPY_BUFFER_SIZE;

/// Exclusively owned reader over archive bytes.
///
/// The cursor only moves forward. Dropping the source releases the
/// underlying handle on every exit path.
pub struct ByteSource<R> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteSource<R> {
    /// Wraps a reader positioned at the start of the archive.
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fills as much of `buf` as the stream allows.
    ///
    /// Returns the number of bytes read; fewer than `buf.len()` only at end
    /// of stream.
    pub fn read_block(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }

    /// Reads exactly `len` bytes, handing them to `sink` in chunks of at
    /// most [`COPY_BUFFER_SIZE`] bytes.
    ///
    /// Fails with `UnexpectedEof` if the stream ends first; chunks read
    /// before that point have already been passed on.
    pub fn copy_exact<S: FnMut(&[u8])>(&mut self, len: u64, mut sink: S) -> io::Result<()> {
        let capacity = usize::try_from(len).map_or(COPY_BUFFER_SIZE, |n| n.min(COPY_BUFFER_SIZE));
        let mut buffer = vec![0u8; capacity];
        let mut copied = 0u64;
        while copied < len {
            let want = usize::try_from(len - copied).map_or(capacity, |n| n.min(capacity));
            let read = self.read_block(&mut buffer[..want])?;
            sink(&buffer[..read]);
            copied += read as u64;
            if read < want {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {len} bytes, stream ended after {copied}"),
                ));
            }
        }
        Ok(())
    }

    /// Discards up to `len` bytes; returns how many were actually skipped.
    pub fn skip(&mut self, len: u64) -> io::Result<u64> {
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        self.position += skipped;
        Ok(skipped)
    }
}
