use std::io::Cursor;
use std::io::Read;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ArchiveError;
use crate::path::trim_leading_separators;
use crate::path::VirtualPath;

type Reader = Cursor<Arc<[u8]>>;

/// One opened, decoded archive.
///
/// The entry index is built once at decode time and never changes. Reading
/// an entry works on a cheap clone of the decoded central directory, so a
/// handle can serve concurrent reads through a shared reference.
pub struct ArchiveHandle {
    canonical_base: VirtualPath,
    parent: Option<VirtualPath>,
    archive: ZipArchive<Reader>,
    /// Entry name (no leading `/`) to index in the zip central directory.
    index: FxHashMap<Box<str>, usize>,
    /// Entry names in archive order.
    names: Vec<Box<str>>,
}

impl ArchiveHandle {
    /// Decode `bytes` as a zip-compatible archive.
    ///
    /// `parent` is the key of the archive these bytes were extracted from,
    /// if any.
    pub fn decode(
        canonical_base: VirtualPath,
        parent: Option<VirtualPath>,
        bytes: Vec<u8>,
    ) -> Result<Self, ArchiveError> {
        let corrupt = |source: ZipError| ArchiveError::CorruptArchive {
            base: canonical_base.clone(),
            source,
        };

        let reader = Cursor::new(Arc::<[u8]>::from(bytes));
        let mut archive = ZipArchive::new(reader).map_err(corrupt)?;

        let mut index = FxHashMap::with_capacity_and_hasher(archive.len(), Default::default());
        let mut names = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i).map_err(corrupt)?;
            if file.is_dir() {
                continue;
            }
            let name: Box<str> = trim_leading_separators(file.name()).into();
            if index.insert(name.clone(), i).is_none() {
                names.push(name);
            }
        }

        Ok(Self {
            canonical_base,
            parent,
            archive,
            index,
            names,
        })
    }

    /// The cache key identifying this archive.
    #[must_use]
    pub fn canonical_base(&self) -> &VirtualPath {
        &self.canonical_base
    }

    /// The archive this one was extracted from, if it is nested.
    #[must_use]
    pub fn parent(&self) -> Option<&VirtualPath> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.index.contains_key(trim_leading_separators(entry))
    }

    /// Entry names in archive order, directories excluded.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(AsRef::as_ref)
    }

    /// Inflate and return the bytes of `entry`.
    pub fn read_entry(&self, entry: &str) -> Result<Vec<u8>, ArchiveError> {
        let name = trim_leading_separators(entry);
        let &i = self
            .index
            .get(name)
            .ok_or_else(|| ArchiveError::EntryNotFound {
                archive: self.canonical_base.clone(),
                entry: name.to_string(),
            })?;

        let corrupt = |source: ZipError| ArchiveError::CorruptArchive {
            base: self.canonical_base.clone(),
            source,
        };

        let mut archive = self.archive.clone();
        let mut file = archive.by_index(i).map_err(corrupt)?;
        let capacity = usize::try_from(file.size()).unwrap_or(0);
        let mut bytes = Vec::with_capacity(capacity);
        file.read_to_end(&mut bytes)
            .map_err(|e| corrupt(ZipError::Io(e)))?;
        Ok(bytes)
    }
}

impl std::fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveHandle")
            .field("canonical_base", &self.canonical_base)
            .field("parent", &self.parent)
            .field("entries", &self.names.len())
            .finish_non_exhaustive()
    }
}
