//! Filesystem capability injected into the engine.
//!
//! Extraction never calls `std::fs` directly. It goes through a
//! [`Filesystem`] so the tar driver can run against [`MemoryFs`] in tests and
//! against [`LocalFs`] everywhere else.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

/// Chunk size for streaming entry data to disk.
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Operations the engine needs from a filesystem.
pub trait Filesystem {
    /// Returns `true` if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Creates `path` and every missing ancestor. Succeeds if it already exists.
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()>;

    /// Creates or truncates the file at `path` and returns a writer for it.
    ///
    /// The parent directory must already exist. Callers flush the writer
    /// before dropping it to observe write errors.
    fn create_file(&mut self, path: &Path) -> io::Result<Box<dyn Write + '_>>;

    /// Creates or truncates the file at `path` with `contents`.
    fn write_file(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut writer = self.create_file(path)?;
        writer.write_all(contents)?;
        writer.flush()
    }

    /// Reads a whole file.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Opens a file for sequential reading.
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>>;

    /// Returns the length of the file at `path` in bytes.
    fn file_len(&self, path: &Path) -> io::Result<u64>;

    /// Lists every regular file below `root`, recursively, in sorted order.
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// The real filesystem, backed by `std::fs` and `walkdir`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn create_file(&mut self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(BufWriter::with_capacity(
            COPY_BUFFER_SIZE,
            File::create(path)?,
        )))
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(BufReader::with_capacity(
            COPY_BUFFER_SIZE,
            File::open(path)?,
        )))
    }

    fn file_len(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

/// In-memory filesystem for tests and dry runs.
///
/// Paths are stored verbatim; no normalization beyond what `Path` does.
/// Writes below a prefix registered with [`MemoryFs::deny_writes_under`]
/// fail with `PermissionDenied`; directory creation below a prefix
/// registered with [`MemoryFs::fail_dir_creation_under`] fails the same way
/// while file writes there still succeed.
#[derive(Debug, Default, Clone)]
pub struct MemoryFs {
    nodes: BTreeMap<PathBuf, Node>,
    denied: Vec<PathBuf>,
    dir_denied: Vec<PathBuf>,
}

impl MemoryFs {
    /// Creates an empty in-memory filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write at or below `prefix` fail.
    pub fn deny_writes_under(&mut self, prefix: impl Into<PathBuf>) {
        self.denied.push(prefix.into());
    }

    /// Makes `create_dir_all` fail at or below `prefix`, even for
    /// directories that already exist.
    pub fn fail_dir_creation_under(&mut self, prefix: impl Into<PathBuf>) {
        self.dir_denied.push(prefix.into());
    }

    /// Inserts a file, creating its ancestors.
    ///
    /// # Errors
    ///
    /// Fails if an ancestor is an existing file.
    pub fn insert_file(&mut self, path: impl AsRef<Path>, contents: &[u8]) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.create_dirs(parent)?;
        }
        self.nodes
            .insert(path.to_path_buf(), Node::File(contents.to_vec()));
        Ok(())
    }

    fn check_writable(&self, path: &Path) -> io::Result<()> {
        Self::check_prefixes(&self.denied, path)
    }

    fn check_prefixes(prefixes: &[PathBuf], path: &Path) -> io::Result<()> {
        if prefixes.iter().any(|prefix| path.starts_with(prefix)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("write denied: {}", path.display()),
            ));
        }
        Ok(())
    }

    fn create_dirs(&mut self, path: &Path) -> io::Result<()> {
        let ancestors: Vec<&Path> = path
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        for dir in ancestors.into_iter().rev() {
            match self.nodes.get(dir) {
                Some(Node::Dir) => {}
                Some(Node::File(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("not a directory: {}", dir.display()),
                    ));
                }
                None => {
                    self.nodes.insert(dir.to_path_buf(), Node::Dir);
                }
            }
        }
        Ok(())
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such file: {}", path.display()),
        )
    }
}

impl Filesystem for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.nodes.get(path), Some(Node::Dir))
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        self.check_writable(path)?;
        Self::check_prefixes(&self.dir_denied, path)?;
        self.create_dirs(path)
    }

    fn create_file(&mut self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        self.check_writable(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
            && !self.is_dir(parent)
        {
            return Err(Self::not_found(parent));
        }
        if self.is_dir(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("is a directory: {}", path.display()),
            ));
        }
        self.nodes.insert(path.to_path_buf(), Node::File(Vec::new()));
        match self.nodes.get_mut(path) {
            Some(Node::File(data)) => Ok(Box::new(data)),
            _ => Err(Self::not_found(path)),
        }
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.nodes.get(path) {
            Some(Node::File(data)) => Ok(data.clone()),
            _ => Err(Self::not_found(path)),
        }
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(Cursor::new(self.read_file(path)?)))
    }

    fn file_len(&self, path: &Path) -> io::Result<u64> {
        match self.nodes.get(path) {
            Some(Node::File(data)) => Ok(data.len() as u64),
            _ => Err(Self::not_found(path)),
        }
    }

    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        if let Some(Node::File(_)) = self.nodes.get(root) {
            return Ok(vec![root.to_path_buf()]);
        }
        Ok(self
            .nodes
            .range(root.to_path_buf()..)
            .take_while(|(path, _)| path.starts_with(root))
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .map(|(path, _)| path.clone())
            .collect())
    }
}

/// Returns `true` when both paths name the same location once made
/// absolute. Symlinks are not resolved.
pub fn same_location(a: &Path, b: &Path) -> bool {
    match (std::path::absolute(a), std::path::absolute(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
