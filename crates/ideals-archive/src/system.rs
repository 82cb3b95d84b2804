//! Storage abstraction for reading base archives.
//!
//! Reads are whole-object and read-only. [`OsFileSystem`] goes to disk;
//! [`InMemoryFileSystem`] serves fixed bytes for tests and embedders.

use std::io;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;

/// Read-only access to the medium that stores base archives.
pub trait FileSystem: Send + Sync {
    /// Read the entire contents of a storage object.
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>>;
}

/// Standard file system implementation that uses `std::fs`
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>> {
        if std::fs::metadata(path)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{path} is a directory"),
            ));
        }
        std::fs::read(path)
    }
}

/// Fixed set of storage objects held in memory.
#[derive(Default)]
pub struct InMemoryFileSystem {
    files: FxHashMap<Utf8PathBuf, Vec<u8>>,
}

impl InMemoryFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<Utf8PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }
}
