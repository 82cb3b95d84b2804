//! Rewrites a markup tree as a `/** ... */` comment block.
//!
//! Inline tags become markdown markers, lists and paragraphs become
//! continuation lines, and anything unrecognised is kept as markup.

use crate::entities;
use crate::tags::ListKind;
use crate::tags::MarkupSpan;
use crate::tags::TagKind;
use crate::tree::Element;
use crate::tree::Node;
use crate::tree::TextPart;
use crate::visitor::walk_nodes;
use crate::visitor::Visitor;

const COMMENT_OPEN: &str = "/**";
const COMMENT_CLOSE: &str = " */";
/// Written before the first text on a line that follows a line break.
const CONTINUATION: &str = " * ";

pub struct Transpiler {
    out: String,
    /// A line break was written and its continuation marker is still owed.
    after_line_break: bool,
    /// Whitespace nodes are rendered at document level and dropped between
    /// element siblings.
    whitespace_significant: bool,
    list_kind: ListKind,
    /// Kind of the element directly enclosing the current text, `None` at
    /// document level.
    enclosing: Option<TagKind>,
}

impl Default for Transpiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transpiler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            out: String::from(COMMENT_OPEN),
            after_line_break: false,
            whitespace_significant: true,
            list_kind: ListKind::Unordered,
            enclosing: None,
        }
    }

    /// Render `nodes` and return the finished comment block.
    #[must_use]
    pub fn transpile(mut self, nodes: &[Node]) -> String {
        walk_nodes(&mut self, nodes);
        self.out.push_str(COMMENT_CLOSE);
        self.out
    }

    fn append_pending(&mut self) {
        if self.after_line_break {
            self.out.push_str(CONTINUATION);
            self.after_line_break = false;
        }
    }

    fn write_whitespace(&mut self, whitespace: &str) {
        self.append_pending();

        let lines = line_count(whitespace);
        if lines == 1 {
            self.out.push_str(whitespace);
            return;
        }

        // The first line is trailing space before the break; the last line's
        // marker is owed to whatever text comes next.
        for _ in 1..lines - 1 {
            self.out.push('\n');
            self.out.push_str(CONTINUATION);
        }
        self.out.push('\n');
        self.after_line_break = true;
    }
}

impl Visitor for Transpiler {
    fn visit_element(&mut self, element: &Element) {
        let at_line_start = self.after_line_break;
        self.append_pending();

        let saved_list_kind = self.list_kind;
        let saved_significance = self.whitespace_significant;
        let saved_enclosing = self.enclosing;

        let kind = TagKind::from_name(&element.name);
        if let TagKind::List(list_kind) = kind {
            self.list_kind = list_kind;
        }
        let span = MarkupSpan::for_element(element, self.list_kind, at_line_start);

        self.out.push_str(&span.prefix);
        self.whitespace_significant = false;
        self.enclosing = Some(kind);
        walk_nodes(self, &element.children);
        self.out.push_str(&span.suffix);

        self.list_kind = saved_list_kind;
        self.whitespace_significant = saved_significance;
        self.enclosing = saved_enclosing;
    }

    fn visit_text(&mut self, parts: &[TextPart]) {
        for part in parts {
            match part {
                TextPart::Data(data) => {
                    self.append_pending();
                    self.out.push_str(data);
                }
                TextPart::Space(space) => self.write_whitespace(space),
                TextPart::CharRef(reference) => {
                    self.append_pending();
                    if self.enclosing.is_some_and(TagKind::decodes_entities) {
                        self.out.push_str(&entities::unescape(reference));
                    } else {
                        self.out.push_str(reference);
                    }
                }
            }
        }
    }

    fn visit_whitespace(&mut self, whitespace: &str) {
        if self.whitespace_significant {
            self.write_whitespace(whitespace);
        }
    }
}

/// Number of lines in `s`, counting `\r\n`, `\n` and `\r` as breaks.
fn line_count(s: &str) -> usize {
    s.replace("\r\n", "\n").matches(['\n', '\r']).count() + 1
}
