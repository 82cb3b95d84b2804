//! Converts HTML doc-comment markup into a `/** ... */` comment block with
//! markdown inline markers.
//!
//! ```
//! assert_eq!(
//!     ideals_markup::html_to_comment("<p>Hello <b>world</b></p>"),
//!     "/**\n *\n *Hello **world** */"
//! );
//! ```

mod entities;
mod lexer;
mod tags;
mod tokens;
mod transpile;
mod tree;
mod visitor;

pub use lexer::Lexer;
pub use tags::ListKind;
pub use tags::MarkupSpan;
pub use tags::TagKind;
pub use tokens::Attribute;
pub use tokens::Token;
pub use transpile::Transpiler;
pub use tree::parse;
pub use tree::Element;
pub use tree::Node;
pub use tree::Parser;
pub use tree::TextPart;
pub use visitor::walk_node;
pub use visitor::walk_nodes;
pub use visitor::Visitor;

/// Transpile HTML markup into a comment block. Never fails; malformed
/// markup is repaired or kept as text.
#[must_use]
pub fn html_to_comment(source: &str) -> String {
    Transpiler::new().transpile(&parse(source))
}
