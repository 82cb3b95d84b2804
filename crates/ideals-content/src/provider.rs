use std::sync::Arc;

use ideals_archive::ArchiveError;
use ideals_archive::ArchiveStore;
use ideals_archive::EntryResolver;
use ideals_archive::VirtualPath;
use ideals_worker::Task;
use ideals_worker::Worker;
use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::warn;
use url::Url;

use crate::documents::OpenDocumentSet;
use crate::scheme;
use crate::text::decode_text;

/// The surface the host editor calls to materialize virtual documents.
///
/// Resolution runs on the [`Worker`], never on the caller's task. Every
/// failure is logged and reported as `None`, which the editor renders as a
/// missing document.
#[derive(Clone, Debug)]
pub struct ContentProvider {
    resolver: EntryResolver,
    documents: OpenDocumentSet,
    worker: Worker,
    evict_on_close: bool,
}

impl ContentProvider {
    /// Must be called from within a tokio runtime, since the worker spawns
    /// onto it.
    #[must_use]
    pub fn new(store: Arc<ArchiveStore>, worker: Worker) -> Self {
        Self {
            resolver: EntryResolver::new(store),
            documents: OpenDocumentSet::new(),
            worker,
            evict_on_close: true,
        }
    }

    /// Whether closing the last document of an archive releases it from the
    /// store.
    #[must_use]
    pub fn with_evict_on_close(mut self, evict_on_close: bool) -> Self {
        self.evict_on_close = evict_on_close;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ArchiveStore> {
        self.resolver.store()
    }

    #[must_use]
    pub fn documents(&self) -> &OpenDocumentSet {
        &self.documents
    }

    /// Text of the document behind an archive-scheme URI.
    #[instrument(skip(self), fields(uri = %uri))]
    pub async fn provide_content(&self, uri: &Url) -> Option<String> {
        let Some(path) = scheme::uri_to_path(uri) else {
            warn!("Not an archive URI");
            return None;
        };
        self.provide(path).await
    }

    /// Text of the document at an already decoded virtual path.
    pub async fn provide_path(&self, path: &str) -> Option<String> {
        self.provide(VirtualPath::from(path)).await
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn provide(&self, path: VirtualPath) -> Option<String> {
        let first_open = self.documents.open(path.clone());
        debug!(first_open, "Registered document");

        let task = ResolveTask {
            resolver: self.resolver.clone(),
            documents: self.documents.clone(),
            pin: self.evict_on_close,
            path,
        };

        match self.worker.wait_for(task).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(err)) => {
                warn!(error = %err, "Failed to provide document content");
                None
            }
            Err(err) => {
                warn!(error = %err, "Content worker unavailable");
                None
            }
        }
    }

    /// Forget a closed document, releasing its archive when eviction is on.
    #[instrument(skip(self), fields(path = %path))]
    pub fn on_document_closed(&self, path: &VirtualPath) {
        let Some(closed) = self.documents.close(path) else {
            debug!("Closed document was not open");
            return;
        };
        info!("Document closed");

        if let Some(archive) = closed.archive {
            self.store().unpin(&archive);
        }
    }

    pub fn on_uri_closed(&self, uri: &Url) {
        if let Some(path) = scheme::uri_to_path(uri) {
            self.on_document_closed(&path);
        }
    }
}

/// Resolution and pin bookkeeping, run together on the worker so a caller
/// that stops waiting cannot leave a pin unrecorded.
///
/// With eviction on, every request pins; a document that already holds a
/// pin refuses the new one and it is released right away.
struct ResolveTask {
    resolver: EntryResolver,
    documents: OpenDocumentSet,
    pin: bool,
    path: VirtualPath,
}

impl Task for ResolveTask {
    type Output = Result<String, ArchiveError>;

    fn run(self) -> Self::Output {
        let bytes = if self.pin {
            let resolved = self.resolver.resolve_pinned(&self.path)?;
            if let Some(archive) = resolved.archive {
                if !self.documents.record_pin(&self.path, archive.clone()) {
                    debug!(%archive, "Document closed or already pinned, releasing pin");
                    self.resolver.store().unpin(&archive);
                }
            }
            resolved.bytes
        } else {
            self.resolver.resolve(&self.path)?
        };
        decode_text(&self.path, bytes)
    }
}
