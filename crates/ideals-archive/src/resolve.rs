use std::sync::Arc;

use tracing::debug;
use tracing::instrument;

use crate::error::ArchiveError;
use crate::path::VirtualPath;
use crate::store::ArchiveStore;

/// Bytes of a resolved path, plus the archive pinned to serve them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub bytes: Vec<u8>,
    /// Canonical key of the owning archive, `None` for plain storage reads.
    pub archive: Option<VirtualPath>,
}

/// Turns virtual paths into entry bytes through a shared [`ArchiveStore`].
///
/// Errors are returned unchanged; nothing is retried.
#[derive(Debug, Clone)]
pub struct EntryResolver {
    store: Arc<ArchiveStore>,
}

impl EntryResolver {
    #[must_use]
    pub fn new(store: Arc<ArchiveStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ArchiveStore> {
        &self.store
    }

    /// Read the bytes `path` addresses: a plain storage object when it has no
    /// inner part, otherwise the entry inside its owning archive.
    #[instrument(skip(self), fields(path = %path))]
    pub fn resolve(&self, path: &VirtualPath) -> Result<Vec<u8>, ArchiveError> {
        match entry_of(path) {
            None => self.read_plain(path),
            Some((owner, entry)) => {
                let handle = self.store.get_or_open(&owner)?;
                handle.read_entry(entry)
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but pins the owning archive in the
    /// store. The caller releases it with [`ArchiveStore::unpin`] on
    /// [`Resolved::archive`]. Nothing stays pinned when this fails.
    #[instrument(skip(self), fields(path = %path))]
    pub fn resolve_pinned(&self, path: &VirtualPath) -> Result<Resolved, ArchiveError> {
        let Some((owner, entry)) = entry_of(path) else {
            return Ok(Resolved {
                bytes: self.read_plain(path)?,
                archive: None,
            });
        };

        let handle = self.store.pin(&owner)?;
        match handle.read_entry(entry) {
            Ok(bytes) => Ok(Resolved {
                bytes,
                archive: Some(handle.canonical_base().clone()),
            }),
            Err(err) => {
                self.store.unpin(&owner);
                Err(err)
            }
        }
    }

    fn read_plain(&self, path: &VirtualPath) -> Result<Vec<u8>, ArchiveError> {
        let storage = path.storage_path();
        debug!(%storage, "Reading plain file");
        self.store
            .file_system()
            .read(storage)
            .map_err(|source| ArchiveError::NotFound {
                path: storage.to_path_buf(),
                source,
            })
    }
}

/// The owning archive and entry name, or `None` for a plain storage path.
fn entry_of(path: &VirtualPath) -> Option<(VirtualPath, &str)> {
    if path.is_entry() {
        path.owner()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::InMemoryFileSystem;
    use crate::test_zip;

    fn resolver() -> EntryResolver {
        let lib = test_zip::build(&[("pkg/Class.txt", b"package pkg;\nclass Class {}\n")]);
        let outer = test_zip::build(&[
            ("lib.jar", &lib),
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
            ("logo.png", &[0x89, b'P', b'N', b'G', 0x00, 0xff]),
        ]);
        let fs = InMemoryFileSystem::new()
            .with_file("/outer.jar", outer)
            .with_file("/notes.txt", b"just a file".to_vec());
        EntryResolver::new(Arc::new(ArchiveStore::new(Arc::new(fs))))
    }

    #[test]
    fn test_nested_entry() {
        let r = resolver();
        let bytes = r
            .resolve(&VirtualPath::from("/outer.jar!lib.jar!pkg/Class.txt"))
            .unwrap();
        assert_eq!(bytes, b"package pkg;\nclass Class {}\n");
    }

    #[test]
    fn test_top_level_entry_with_leading_separator() {
        let r = resolver();
        let a = r
            .resolve(&VirtualPath::from("/outer.jar!/META-INF/MANIFEST.MF"))
            .unwrap();
        let b = r
            .resolve(&VirtualPath::from("/outer.jar!META-INF/MANIFEST.MF"))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_binary_entry_is_untouched() {
        let r = resolver();
        let bytes = r.resolve(&VirtualPath::from("/outer.jar!logo.png")).unwrap();
        assert_eq!(bytes, [0x89, b'P', b'N', b'G', 0x00, 0xff]);
    }

    #[test]
    fn test_plain_file() {
        let r = resolver();
        assert_eq!(
            r.resolve(&VirtualPath::from("/notes.txt")).unwrap(),
            b"just a file"
        );
        assert!(r.store().is_empty());
    }

    #[test]
    fn test_trailing_separator_reads_plain_file() {
        let r = resolver();
        assert_eq!(
            r.resolve(&VirtualPath::from("/notes.txt!")).unwrap(),
            b"just a file"
        );
    }

    #[test]
    fn test_missing_entry_is_entry_not_found() {
        let r = resolver();
        let err = r
            .resolve(&VirtualPath::from("/outer.jar!lib.jar!pkg/Missing.txt"))
            .unwrap_err();
        assert!(err.is_entry_not_found());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_missing_archive_is_not_found() {
        let r = resolver();
        let err = r
            .resolve(&VirtualPath::from("/nowhere.jar!a.txt"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let r = resolver();
        let path = VirtualPath::from("/outer.jar!lib.jar!pkg/Class.txt");
        assert_eq!(r.resolve(&path).unwrap(), r.resolve(&path).unwrap());
    }

    #[test]
    fn test_resolve_pinned_reports_owner() {
        let r = resolver();
        let resolved = r
            .resolve_pinned(&VirtualPath::from("/outer.jar!/lib.jar!pkg/Class.txt"))
            .unwrap();
        assert_eq!(
            resolved.archive,
            Some(VirtualPath::from("/outer.jar!lib.jar"))
        );

        r.store().unpin(&VirtualPath::from("/outer.jar!lib.jar"));
        assert!(r.store().is_empty());
    }

    #[test]
    fn test_resolve_pinned_failure_leaves_nothing_pinned() {
        let r = resolver();
        assert!(r
            .resolve_pinned(&VirtualPath::from("/outer.jar!missing.txt"))
            .is_err());
        assert!(r.store().is_empty());
    }

    #[test]
    fn test_resolve_pinned_plain_file() {
        let r = resolver();
        let resolved = r.resolve_pinned(&VirtualPath::from("/notes.txt")).unwrap();
        assert_eq!(resolved.archive, None);
        assert_eq!(resolved.bytes, b"just a file");
    }
}
