//! Virtual documents currently open in the host editor.
//!
//! Each open document remembers the archive it pinned in the
//! [`ArchiveStore`](ideals_archive::ArchiveStore), if any, so closing it can
//! release exactly that pin.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ideals_archive::VirtualPath;

/// A document removed from the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedDocument {
    pub path: VirtualPath,
    /// Archive pinned while the document was open.
    pub archive: Option<VirtualPath>,
}

/// Shared set of open virtual documents.
#[derive(Clone, Debug, Default)]
pub struct OpenDocumentSet {
    inner: Arc<DashMap<VirtualPath, Option<VirtualPath>>>,
}

impl OpenDocumentSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` as open. Returns `true` when it was not open before.
    pub fn open(&self, path: VirtualPath) -> bool {
        match self.inner.entry(path) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(None);
                true
            }
        }
    }

    /// Remember that `path` pinned `archive`.
    ///
    /// Returns `false` when the pin was not recorded because `path` closed in
    /// the meantime or already holds a pin; the caller must release it.
    #[must_use]
    pub fn record_pin(&self, path: &VirtualPath, archive: VirtualPath) -> bool {
        match self.inner.get_mut(path) {
            Some(mut pinned) if pinned.is_none() => {
                *pinned = Some(archive);
                true
            }
            _ => false,
        }
    }

    /// Remove `path`, returning what it held if it was open.
    pub fn close(&self, path: &VirtualPath) -> Option<ClosedDocument> {
        self.inner
            .remove(path)
            .map(|(path, archive)| ClosedDocument { path, archive })
    }

    #[must_use]
    pub fn contains(&self, path: &VirtualPath) -> bool {
        self.inner.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(s: &str) -> VirtualPath {
        VirtualPath::from(s)
    }

    #[test]
    fn test_open_reports_first_registration() {
        let docs = OpenDocumentSet::new();
        assert!(docs.open(vp("/a.jar!A.java")));
        assert!(!docs.open(vp("/a.jar!A.java")));
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_close() {
        let docs = OpenDocumentSet::new();
        docs.open(vp("/a.jar!A.java"));
        assert!(docs.record_pin(&vp("/a.jar!A.java"), vp("/a.jar")));

        let closed = docs.close(&vp("/a.jar!A.java")).unwrap();
        assert_eq!(closed.archive, Some(vp("/a.jar")));
        assert!(docs.is_empty());
        assert!(docs.close(&vp("/a.jar!A.java")).is_none());
    }

    #[test]
    fn test_record_pin_after_close_is_refused() {
        let docs = OpenDocumentSet::new();
        docs.open(vp("/a.jar!A.java"));
        docs.close(&vp("/a.jar!A.java"));
        assert!(!docs.record_pin(&vp("/a.jar!A.java"), vp("/a.jar")));
    }

    #[test]
    fn test_second_pin_is_refused() {
        let docs = OpenDocumentSet::new();
        docs.open(vp("/a.jar!A.java"));
        assert!(docs.record_pin(&vp("/a.jar!A.java"), vp("/a.jar")));
        assert!(!docs.record_pin(&vp("/a.jar!A.java"), vp("/b.jar")));
        let closed = docs.close(&vp("/a.jar!A.java")).unwrap();
        assert_eq!(closed.archive, Some(vp("/a.jar")));
    }

    #[test]
    fn test_clones_share_state() {
        let docs = OpenDocumentSet::new();
        let other = docs.clone();
        docs.open(vp("/b.zip!x"));
        docs.open(vp("/a.zip!y"));
        assert!(other.contains(&vp("/b.zip!x")));
        assert!(other.contains(&vp("/a.zip!y")));
        assert_eq!(other.len(), 2);
    }
}
