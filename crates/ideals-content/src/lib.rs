//! Host editor boundary for virtual archive documents.

mod documents;
mod provider;
pub mod scheme;
mod text;

pub use documents::ClosedDocument;
pub use documents::OpenDocumentSet;
pub use provider::ContentProvider;
pub use scheme::JAR_SCHEME;
pub use scheme::ZIP_SCHEME;
pub use text::decode_text;
