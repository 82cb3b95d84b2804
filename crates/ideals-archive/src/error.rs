use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;
use zip::result::ZipError;

use crate::path::VirtualPath;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The storage path does not address any readable object.
    #[error("cannot read '{path}'")]
    NotFound {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bytes at `base` are not a valid zip-compatible container, or an
    /// entry inside it failed to inflate.
    #[error("'{base}' is not a readable archive")]
    CorruptArchive {
        base: VirtualPath,
        #[source]
        source: ZipError,
    },

    /// The archive decoded fine but has no entry with this name.
    #[error("no entry '{entry}' in '{archive}'")]
    EntryNotFound { archive: VirtualPath, entry: String },

    /// Entry bytes were requested as text but are not valid UTF-8.
    #[error("'{path}' is not valid UTF-8 text")]
    UnsupportedEncoding { path: VirtualPath },

    /// The path nests more archives than the store is configured to open.
    #[error("'{path}' spans {levels} levels, more than the limit of {limit}")]
    NestingTooDeep {
        path: VirtualPath,
        levels: usize,
        limit: usize,
    },
}

impl ArchiveError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_entry_not_found(&self) -> bool {
        matches!(self, Self::EntryNotFound { .. })
    }
}
