//! Materializes one decoded tar entry on the destination filesystem.

use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use log::debug;

use crate::fs::Filesystem;
use crate::tar::header::EntryKind;
use crate::tar::header::TarHeader;
use crate::tar::policy::TarFailure;
use crate::tar::source::ByteSource;

/// What happened to an entry that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// A regular file was written.
    File {
        /// Absolute path of the written file.
        path: PathBuf,
        /// Number of content bytes written.
        bytes: u64,
    },
    /// A directory now exists.
    Directory(PathBuf),
}

/// A failure together with the I/O error behind it, if any.
#[derive(Debug)]
pub struct EntryFailure {
    /// Which failure occurred.
    pub failure: TarFailure,
    /// Underlying cause.
    pub cause: Option<io::Error>,
}

impl EntryFailure {
    fn new(failure: TarFailure, cause: io::Error) -> Self {
        Self {
            failure,
            cause: Some(cause),
        }
    }

    fn bare(failure: TarFailure) -> Self {
        Self {
            failure,
            cause: None,
        }
    }
}

/// Writes entries below a destination root.
pub struct EntryExtractor<'a, F: Filesystem + ?Sized> {
    fs: &'a mut F,
    dest: &'a Path,
}

impl<'a, F: Filesystem + ?Sized> EntryExtractor<'a, F> {
    /// Creates an extractor writing below `dest`.
    pub fn new(fs: &'a mut F, dest: &'a Path) -> Self {
        Self { fs, dest }
    }

    /// Materializes `header` and leaves `source` at the next header block.
    ///
    /// File data and padding are consumed even when the entry itself is
    /// skipped, so the stream stays aligned. Directory entries consume
    /// nothing.
    pub fn extract<R: Read>(
        &mut self,
        header: &TarHeader,
        source: &mut ByteSource<R>,
    ) -> Result<EntryOutcome, EntryFailure> {
        match header.kind() {
            EntryKind::Directory => self.extract_directory(header),
            EntryKind::File => self.extract_file(header, source),
        }
    }

    fn extract_directory(&mut self, header: &TarHeader) -> Result<EntryOutcome, EntryFailure> {
        let target = resolve_target(self.dest, &header.name)
            .ok_or_else(|| EntryFailure::bare(TarFailure::UnsafePath))?;
        self.fs
            .create_dir_all(&target)
            .map_err(|e| EntryFailure::new(TarFailure::DirectoryCreate, e))?;
        Ok(EntryOutcome::Directory(target))
    }

    fn extract_file<R: Read>(
        &mut self,
        header: &TarHeader,
        source: &mut ByteSource<R>,
    ) -> Result<EntryOutcome, EntryFailure> {
        let Some(target) = resolve_target(self.dest, &header.name) else {
            source
                .copy_exact(header.size, |_| {})
                .map_err(data_failure)?;
            skip_padding(header, source)?;
            return Err(EntryFailure::bare(TarFailure::UnsafePath));
        };

        if let Some(parent) = target.parent()
            && let Err(e) = self.fs.create_dir_all(parent)
        {
            debug!("could not create {}: {e}", parent.display());
        }

        let (mut writer, mut write_error) = match self.fs.create_file(&target) {
            Ok(writer) => (Some(writer), None),
            Err(e) => (None, Some(e)),
        };
        // Data is consumed to the end even after a write error so the next
        // header stays aligned.
        source
            .copy_exact(header.size, |chunk| {
                let failed = writer.as_mut().and_then(|w| w.write_all(chunk).err());
                if let Some(e) = failed {
                    write_error = Some(e);
                    writer = None;
                }
            })
            .map_err(data_failure)?;
        if let Some(mut w) = writer.take()
            && let Err(e) = w.flush()
        {
            write_error = Some(e);
        }
        skip_padding(header, source)?;

        match write_error {
            Some(e) => Err(EntryFailure::new(TarFailure::WriteFile, e)),
            None => Ok(EntryOutcome::File {
                path: target,
                bytes: header.size,
            }),
        }
    }
}

fn data_failure(e: io::Error) -> EntryFailure {
    let failure = if e.kind() == io::ErrorKind::UnexpectedEof {
        TarFailure::TruncatedData
    } else {
        TarFailure::ReadFailure
    };
    EntryFailure::new(failure, e)
}

/// A short padding read means the stream is over; the next header read
/// terminates the run.
fn skip_padding<R: Read>(
    header: &TarHeader,
    source: &mut ByteSource<R>,
) -> Result<(), EntryFailure> {
    source
        .skip(header.padding())
        .map_err(|e| EntryFailure::new(TarFailure::ReadFailure, e))?;
    Ok(())
}

/// Joins an entry name under `dest`, component by component.
///
/// Leading `/` and `.` components are dropped. Returns `None` when the name
/// contains `..` or reduces to nothing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use zipper_core::tar::entry::resolve_target;
///
/// let dest = Path::new("/out");
/// assert_eq!(
///     resolve_target(dest, "./a/b.txt"),
///     Some(Path::new("/out/a/b.txt").to_path_buf())
/// );
/// assert_eq!(resolve_target(dest, "../etc/passwd"), None);
/// ```
#[must_use]
pub fn resolve_target(dest: &Path, name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(dest.join(relative))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::test_utils::RawBlock;
    use crate::test_utils::TarStream;
    use crate::tar::header::HeaderDecode;
    use crate::tar::header::decode_header;
    use std::io::Cursor;

    fn header(name: &str, size: u64) -> TarHeader {
        match decode_header(&RawBlock::file(name, size).build()) {
            HeaderDecode::Header(h) => h,
            HeaderDecode::Skip(reason) => panic!("{reason:?}"),
        }
    }

    fn dir_header(name: &str) -> TarHeader {
        match decode_header(&RawBlock::directory(name).build()) {
            HeaderDecode::Header(h) => h,
            HeaderDecode::Skip(reason) => panic!("{reason:?}"),
        }
    }

    fn setup() -> MemoryFs {
        let mut fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/out")).unwrap();
        fs
    }

    #[test]
    fn test_file_consumes_data_and_padding() {
        let mut fs = setup();
        let data = TarStream::new().data(b"0123456789").raw(b"NEXT").into_bytes();
        let mut source = ByteSource::new(Cursor::new(data));

        let outcome = EntryExtractor::new(&mut fs, Path::new("/out"))
            .extract(&header("a/b.txt", 10), &mut source)
            .unwrap();

        assert_eq!(
            outcome,
            EntryOutcome::File {
                path: PathBuf::from("/out/a/b.txt"),
                bytes: 10
            }
        );
        assert_eq!(source.position(), 512);
        assert_eq!(fs.read_file(Path::new("/out/a/b.txt")).unwrap(), b"0123456789");
    }

    #[test]
    fn test_empty_file_consumes_nothing() {
        let mut fs = setup();
        let mut source = ByteSource::new(Cursor::new(vec![1u8; 512]));

        EntryExtractor::new(&mut fs, Path::new("/out"))
            .extract(&header("empty", 0), &mut source)
            .unwrap();

        assert_eq!(source.position(), 0);
        assert_eq!(fs.read_file(Path::new("/out/empty")).unwrap(), b"");
    }

    #[test]
    fn test_directory_entry() {
        let mut fs = setup();
        let mut source = ByteSource::new(Cursor::new(Vec::new()));

        let outcome = EntryExtractor::new(&mut fs, Path::new("/out"))
            .extract(&dir_header("subdir/"), &mut source)
            .unwrap();

        assert_eq!(outcome, EntryOutcome::Directory(PathBuf::from("/out/subdir")));
        assert!(fs.is_dir(Path::new("/out/subdir")));
    }

    #[test]
    fn test_truncated_data() {
        let mut fs = setup();
        let mut source = ByteSource::new(Cursor::new(vec![b'x'; 4]));

        let err = EntryExtractor::new(&mut fs, Path::new("/out"))
            .extract(&header("f", 10), &mut source)
            .unwrap_err();

        assert_eq!(err.failure, TarFailure::TruncatedData);
        assert_eq!(source.position(), 4);
        // No rollback: the bytes that did arrive stay on disk.
        assert_eq!(fs.read_file(Path::new("/out/f")).unwrap(), b"xxxx");
    }

    #[test]
    fn test_unsafe_path_still_consumes_data() {
        let mut fs = setup();
        let data = TarStream::new().data(b"evil").into_bytes();
        let mut source = ByteSource::new(Cursor::new(data));

        let err = EntryExtractor::new(&mut fs, Path::new("/out"))
            .extract(&header("../escape", 4), &mut source)
            .unwrap_err();

        assert_eq!(err.failure, TarFailure::UnsafePath);
        assert_eq!(source.position(), 512);
        assert!(fs.list_files(Path::new("/")).unwrap().is_empty());
    }

    #[test]
    fn test_write_failure_keeps_alignment() {
        let mut fs = setup();
        fs.deny_writes_under("/out/locked");
        let data = TarStream::new().data(b"abc").into_bytes();
        let mut source = ByteSource::new(Cursor::new(data));

        let err = EntryExtractor::new(&mut fs, Path::new("/out"))
            .extract(&header("locked/f", 3), &mut source)
            .unwrap_err();

        assert_eq!(err.failure, TarFailure::WriteFile);
        assert!(err.cause.is_some());
        assert_eq!(source.position(), 512);
    }

    #[test]
    fn test_parent_failure_still_attempts_write() {
        let mut fs = setup();
        fs.create_dir_all(Path::new("/out/keep")).unwrap();
        fs.fail_dir_creation_under("/out/keep");
        let data = TarStream::new().data(b"kept").into_bytes();
        let mut source = ByteSource::new(Cursor::new(data));

        let outcome = EntryExtractor::new(&mut fs, Path::new("/out"))
            .extract(&header("keep/f", 4), &mut source)
            .unwrap();

        assert_eq!(
            outcome,
            EntryOutcome::File {
                path: PathBuf::from("/out/keep/f"),
                bytes: 4
            }
        );
        assert_eq!(fs.read_file(Path::new("/out/keep/f")).unwrap(), b"kept");
    }

    #[test]
    fn test_missing_parent_fails_at_write() {
        let mut fs = setup();
        fs.fail_dir_creation_under("/out/new");
        let data = TarStream::new().data(b"lost").raw(b"NEXT").into_bytes();
        let mut source = ByteSource::new(Cursor::new(data));

        let err = EntryExtractor::new(&mut fs, Path::new("/out"))
            .extract(&header("new/f", 4), &mut source)
            .unwrap_err();

        assert_eq!(err.failure, TarFailure::WriteFile);
        assert_eq!(source.position(), 512);
        assert!(!fs.exists(Path::new("/out/new/f")));
    }

    #[test]
    fn test_large_entry_streams_intact() {
        let mut fs = setup();
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let data = TarStream::new().data(&payload).into_bytes();
        let mut source = ByteSource::new(Cursor::new(data));

        let outcome = EntryExtractor::new(&mut fs, Path::new("/out"))
            .extract(&header("big.bin", payload.len() as u64), &mut source)
            .unwrap();

        assert!(matches!(outcome, EntryOutcome::File { bytes: 200_000, .. }));
        assert_eq!(source.position(), 200_192);
        assert_eq!(fs.read_file(Path::new("/out/big.bin")).unwrap(), payload);
    }

    #[test]
    fn test_resolve_target() {
        let dest = Path::new("/out");
        assert_eq!(
            resolve_target(dest, "/abs/file"),
            Some(PathBuf::from("/out/abs/file"))
        );
        assert_eq!(resolve_target(dest, "a/./b"), Some(PathBuf::from("/out/a/b")));
        assert_eq!(resolve_target(dest, "a/../../b"), None);
        assert_eq!(resolve_target(dest, "./"), None);
        assert_eq!(resolve_target(dest, "/"), None);
    }
}
