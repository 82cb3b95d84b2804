//! Read-only access to entries inside nested jar/zip archives.
//!
//! A [`VirtualPath`] such as `/libs/outer.jar!lib/inner.jar!pkg/Class.java`
//! names a storage object followed by one entry per archive level. The
//! [`EntryResolver`] walks it through an [`ArchiveStore`], which decodes
//! each archive level once and shares the result.

mod error;
mod handle;
pub mod path;
mod resolve;
mod store;
mod system;
#[cfg(test)]
mod test_zip;

pub use error::ArchiveError;
pub use handle::ArchiveHandle;
pub use path::VirtualPath;
pub use resolve::EntryResolver;
pub use resolve::Resolved;
pub use store::ArchiveStore;
pub use store::DEFAULT_MAX_NESTING_DEPTH;
pub use system::FileSystem;
pub use system::InMemoryFileSystem;
pub use system::OsFileSystem;
