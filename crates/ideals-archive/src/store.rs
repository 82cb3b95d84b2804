//! Process-wide cache of decoded archives.
//!
//! ```text
//! ArchiveStore
//! ├── handles:  DashMap<VirtualPath, Arc<ArchiveHandle>>   (canonical key → handle)
//! ├── inflight: DashMap<VirtualPath, Arc<Mutex<()>>>       (one builder per key)
//! └── usage:    Mutex<FxHashMap<VirtualPath, Usage>>       (pins + nested dependents)
//!
//! get_or_open(key):
//! 1. handles hit → return
//! 2. take the key's inflight lock, re-check handles
//! 3. build: read storage bytes, or recurse into the owning archive and
//!    extract the nested entry
//! 4. insert only after a successful decode
//! ```
//!
//! Lock order is always a nested key before its owner, then `usage`. The
//! `usage` lock is never held while waiting on an inflight lock.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use tracing::debug;
use tracing::instrument;
use tracing::trace;

use crate::error::ArchiveError;
use crate::handle::ArchiveHandle;
use crate::path::VirtualPath;
use crate::system::FileSystem;

/// Default limit on archive levels in one key.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Usage {
    /// Open documents pinning this archive.
    documents: usize,
    /// Cached nested archives built from one of this archive's entries.
    dependents: usize,
}

impl Usage {
    fn is_unused(self) -> bool {
        self.documents == 0 && self.dependents == 0
    }
}

pub struct ArchiveStore {
    fs: Arc<dyn FileSystem>,
    handles: DashMap<VirtualPath, Arc<ArchiveHandle>>,
    inflight: DashMap<VirtualPath, Arc<Mutex<()>>>,
    usage: Mutex<FxHashMap<VirtualPath, Usage>>,
    max_nesting_depth: usize,
}

impl ArchiveStore {
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            handles: DashMap::new(),
            inflight: DashMap::new(),
            usage: Mutex::new(FxHashMap::default()),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_nesting_depth(mut self, limit: usize) -> Self {
        self.max_nesting_depth = limit;
        self
    }

    #[must_use]
    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    #[must_use]
    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    /// Number of cached archives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Whether an archive is cached under `base`'s canonical key.
    #[must_use]
    pub fn contains(&self, base: &VirtualPath) -> bool {
        self.handles.contains_key(&base.canonical())
    }

    /// The cached handle for `base`, without opening anything.
    #[must_use]
    pub fn get(&self, base: &VirtualPath) -> Option<Arc<ArchiveHandle>> {
        self.handles.get(&base.canonical()).map(|h| Arc::clone(h.value()))
    }

    /// Return the cached handle for `base`, opening and caching it first if
    /// needed. Nested bases open their owners recursively.
    #[instrument(skip(self), fields(base = %base))]
    pub fn get_or_open(&self, base: &VirtualPath) -> Result<Arc<ArchiveHandle>, ArchiveError> {
        let key = self.key_for(base)?;
        self.get_or_open_key(&key)
    }

    /// Like [`get_or_open`](Self::get_or_open), additionally pinning the
    /// archive for one open document. The pin keeps the handle cached until
    /// the matching [`unpin`](Self::unpin).
    #[instrument(skip(self), fields(base = %base))]
    pub fn pin(&self, base: &VirtualPath) -> Result<Arc<ArchiveHandle>, ArchiveError> {
        let key = self.key_for(base)?;
        loop {
            let handle = self.get_or_open_key(&key)?;
            let mut usage = self.lock_usage();
            // An unpin on another thread may have evicted it between the two steps.
            let current = self
                .handles
                .get(&key)
                .is_some_and(|cached| Arc::ptr_eq(cached.value(), &handle));
            if current {
                usage.entry(key.clone()).or_default().documents += 1;
                return Ok(handle);
            }
            trace!("Handle evicted before pinning, reopening");
        }
    }

    /// Drop one document pin on `base`, evicting it (and owners that only
    /// it kept alive) once nothing references it.
    #[instrument(skip(self), fields(base = %base))]
    pub fn unpin(&self, base: &VirtualPath) {
        let key = base.canonical();
        let mut usage = self.lock_usage();
        if let Some(entry) = usage.get_mut(&key) {
            entry.documents = entry.documents.saturating_sub(1);
        }
        self.evict_unused(&mut usage, key);
    }

    /// Drop every cached archive.
    pub fn clear(&self) {
        let mut usage = self.lock_usage();
        debug!(archives = self.handles.len(), "Clearing archive store");
        self.handles.clear();
        usage.clear();
    }

    fn key_for(&self, base: &VirtualPath) -> Result<VirtualPath, ArchiveError> {
        let key = base.canonical();
        let levels = key.levels();
        if levels > self.max_nesting_depth {
            return Err(ArchiveError::NestingTooDeep {
                path: key,
                levels,
                limit: self.max_nesting_depth,
            });
        }
        Ok(key)
    }

    fn get_or_open_key(&self, key: &VirtualPath) -> Result<Arc<ArchiveHandle>, ArchiveError> {
        if let Some(handle) = self.cached(key) {
            trace!(%key, "Archive cache hit");
            return Ok(handle);
        }

        let gate = Arc::clone(self.inflight.entry(key.clone()).or_default().value());
        let result = {
            let _building = gate.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            match self.cached(key) {
                Some(handle) => Ok(handle),
                None => self.open(key),
            }
        };
        self.inflight.remove_if(key, |_, g| Arc::ptr_eq(g, &gate));
        result
    }

    fn cached(&self, key: &VirtualPath) -> Option<Arc<ArchiveHandle>> {
        self.handles.get(key).map(|h| Arc::clone(h.value()))
    }

    fn open(&self, key: &VirtualPath) -> Result<Arc<ArchiveHandle>, ArchiveError> {
        let (bytes, parent) = match key.owner() {
            None => {
                let path = key.storage_path();
                debug!(%path, "Reading archive from storage");
                let bytes = self
                    .fs
                    .read(path)
                    .map_err(|source| ArchiveError::NotFound {
                        path: path.to_path_buf(),
                        source,
                    })?;
                (bytes, None)
            }
            Some((owner, entry)) => {
                debug!(%owner, entry, "Extracting nested archive");
                let outer = self.get_or_open_key(&owner)?;
                let bytes = outer.read_entry(entry)?;
                (bytes, Some(owner))
            }
        };

        let handle = Arc::new(ArchiveHandle::decode(key.clone(), parent, bytes)?);
        debug!(%key, entries = handle.len(), "Decoded archive");

        let mut usage = self.lock_usage();
        self.handles.insert(key.clone(), Arc::clone(&handle));
        if let Some(parent) = handle.parent() {
            usage.entry(parent.clone()).or_default().dependents += 1;
        }
        Ok(handle)
    }

    fn evict_unused(&self, usage: &mut FxHashMap<VirtualPath, Usage>, mut key: VirtualPath) {
        loop {
            if !usage.get(&key).copied().unwrap_or_default().is_unused() {
                return;
            }
            usage.remove(&key);

            let Some((_, handle)) = self.handles.remove(&key) else {
                return;
            };
            debug!(%key, "Evicted archive");

            let Some(parent) = handle.parent().cloned() else {
                return;
            };
            if let Some(entry) = usage.get_mut(&parent) {
                entry.dependents = entry.dependents.saturating_sub(1);
            }
            key = parent;
        }
    }

    fn lock_usage(&self) -> MutexGuard<'_, FxHashMap<VirtualPath, Usage>> {
        self.usage
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[cfg(test)]
    fn usage_of(&self, base: &str) -> (usize, usize) {
        let usage = self.lock_usage();
        usage
            .get(&VirtualPath::from(base).canonical())
            .map_or((0, 0), |u| (u.documents, u.dependents))
    }
}

impl std::fmt::Debug for ArchiveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveStore")
            .field("archives", &self.handles.len())
            .field("max_nesting_depth", &self.max_nesting_depth)
            .finish_non_exhaustive()
    }
}
