use tracing::trace;

use crate::tokens::Attribute;
use crate::tokens::Token;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements that implicitly close an open sibling of the same name.
const SELF_NESTING_BLOCKS: &[&str] = &["p", "li"];

/// Maximum number of simultaneously open elements. Start tags beyond it are
/// kept as text so tree depth, and recursion over the tree, stay bounded.
pub const MAX_DEPTH: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data containing at least one non-whitespace part.
    Text(Vec<TextPart>),
    /// A run of whitespace between elements.
    Whitespace(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextPart {
    Data(String),
    Space(String),
    /// Character reference as written.
    CharRef(String),
}

impl TextPart {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            TextPart::Data(s) | TextPart::Space(s) | TextPart::CharRef(s) => s,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Tag name as written.
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    /// Whether the element was written without a closing tag by nature
    /// (`<br>`) or by syntax (`<x/>`).
    pub is_void: bool,
}

impl Element {
    /// Unquoted value of the attribute called `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .and_then(|a| a.value.as_deref())
    }

    /// Source text of the attributes, each preceded by a space.
    #[must_use]
    pub fn attributes_source(&self) -> String {
        self.attributes
            .iter()
            .map(|a| format!(" {}", a.raw))
            .collect()
    }

    /// Concatenated character data of all descendants, markup removed.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(element) => collect_text(&element.children, out),
            Node::Text(parts) => parts.iter().for_each(|p| out.push_str(p.as_str())),
            Node::Whitespace(s) => out.push_str(s),
        }
    }
}

/// Builds a node tree from tokens, repairing malformed markup instead of
/// rejecting it.
pub struct Parser {
    tokens: Vec<Token>,
    /// Open elements, innermost last. The document root is implicit.
    open: Vec<Element>,
    root: Vec<Node>,
    /// Pending character data not yet attached to a parent.
    text: Vec<TextPart>,
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            open: Vec::new(),
            root: Vec::new(),
            text: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Vec<Node> {
        for token in std::mem::take(&mut self.tokens) {
            match token {
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => self.start_element(name, attributes, self_closing),
                Token::EndTag { name } => self.end_element(&name),
                Token::Text(s) => self.text.push(TextPart::Data(s)),
                Token::Whitespace(s) => self.text.push(TextPart::Space(s)),
                Token::CharRef(s) => self.text.push(TextPart::CharRef(s)),
            }
        }

        self.flush_text();
        while let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
        self.root
    }

    fn start_element(&mut self, name: String, attributes: Vec<Attribute>, self_closing: bool) {
        self.flush_text();

        if SELF_NESTING_BLOCKS.iter().any(|b| b.eq_ignore_ascii_case(&name))
            && self.open.last().is_some_and(|e| e.is_named(&name))
        {
            self.close_innermost();
        }

        let is_void =
            self_closing || VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(&name));

        if !is_void && self.open.len() >= MAX_DEPTH {
            trace!(name, "Nesting too deep, keeping start tag as text");
            let attributes: String = attributes
                .iter()
                .map(|a| format!(" {}", a.raw))
                .collect();
            self.text.push(TextPart::Data(format!("<{name}{attributes}>")));
            return;
        }

        let element = Element {
            name,
            attributes,
            children: Vec::new(),
            is_void,
        };

        if is_void {
            self.append(Node::Element(element));
        } else {
            self.open.push(element);
        }
    }

    fn end_element(&mut self, name: &str) {
        let Some(depth) = self.open.iter().rposition(|e| e.is_named(name)) else {
            trace!(name, "Ignoring stray end tag");
            return;
        };
        self.flush_text();
        while self.open.len() > depth {
            self.close_innermost();
        }
    }

    fn close_innermost(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let parts = std::mem::take(&mut self.text);
        let node = if parts.iter().all(|p| matches!(p, TextPart::Space(_))) {
            Node::Whitespace(parts.iter().map(TextPart::as_str).collect())
        } else {
            Node::Text(parts)
        };
        self.append(node);
    }

    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }
}

/// Tokenize and parse `source` into a node tree.
#[must_use]
pub fn parse(source: &str) -> Vec<Node> {
    let tokens = crate::lexer::Lexer::new(source).tokenize();
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(e) => e,
            other => panic!("expected element, got {other:?}"),
        }
    }

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes
            .iter()
            .filter_map(|n| match n {
                Node::Element(e) => Some(e.name.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_nesting() {
        let nodes = parse("<p>Hello <b>world</b></p>");
        assert_eq!(nodes.len(), 1);
        let p = element(&nodes[0]);
        assert_eq!(p.name, "p");
        assert_eq!(
            p.children[0],
            Node::Text(vec![
                TextPart::Data("Hello".to_string()),
                TextPart::Space(" ".to_string()),
            ])
        );
        assert_eq!(element(&p.children[1]).text_content(), "world");
    }

    #[test]
    fn test_whitespace_between_elements() {
        let nodes = parse("<b>a</b>\n <i>b</i>");
        assert_eq!(nodes[1], Node::Whitespace("\n ".to_string()));
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        let nodes = parse("<p>one <b>two");
        let p = element(&nodes[0]);
        assert_eq!(names(&p.children), vec!["b"]);
        assert_eq!(p.text_content(), "one two");
    }

    #[test]
    fn test_stray_end_tag_is_ignored() {
        let nodes = parse("a</b>c");
        assert_eq!(
            nodes,
            vec![Node::Text(vec![
                TextPart::Data("a".to_string()),
                TextPart::Data("c".to_string()),
            ])]
        );
    }

    #[test]
    fn test_paragraph_closes_open_paragraph() {
        let nodes = parse("<p>one<p>two");
        assert_eq!(names(&nodes), vec!["p", "p"]);
        assert_eq!(element(&nodes[1]).text_content(), "two");
    }

    #[test]
    fn test_list_items_close_each_other() {
        let nodes = parse("<ul><li>a<li>b</ul>");
        let ul = element(&nodes[0]);
        assert_eq!(names(&ul.children), vec!["li", "li"]);
    }

    #[test]
    fn test_end_tag_closes_inner_elements() {
        let nodes = parse("<ul><li><b>a</ul>after");
        assert_eq!(names(&nodes), vec!["ul"]);
        assert!(matches!(nodes[1], Node::Text(_)));
    }

    #[test]
    fn test_void_elements_have_no_children() {
        let nodes = parse("a<br>b<img src=x.png/>c");
        let br = element(&nodes[1]);
        assert!(br.is_void);
        assert!(br.children.is_empty());
        assert_eq!(nodes.len(), 5);
    }

    #[test]
    fn test_end_tags_match_case_insensitively() {
        let nodes = parse("<B>x</b>y");
        assert_eq!(names(&nodes), vec!["B"]);
        assert!(element(&nodes[0]).children.len() == 1);
    }

    #[test]
    fn test_nesting_is_capped() {
        let nodes = parse(&"<b>".repeat(MAX_DEPTH + 2));

        let mut depth = 0;
        let mut current = &nodes;
        while let Some(Node::Element(e)) = current.first() {
            depth += 1;
            current = &e.children;
        }
        assert_eq!(depth, MAX_DEPTH);
        assert_eq!(
            current,
            &vec![Node::Text(vec![
                TextPart::Data("<b>".to_string()),
                TextPart::Data("<b>".to_string()),
            ])]
        );
    }

    #[test]
    fn test_capped_start_tag_keeps_attributes() {
        let source = format!("{}<a href=\"u\">x", "<i>".repeat(MAX_DEPTH));
        let text = element(&parse(&source)[0]).text_content();
        assert_eq!(text, "<a href=\"u\">x");
    }

    #[test]
    fn test_attribute_lookup() {
        let nodes = parse(r#"<a HREF="u" docref=List>x</a>"#);
        let a = element(&nodes[0]);
        assert_eq!(a.attribute("href"), Some("u"));
        assert_eq!(a.attribute("docref"), Some("List"));
        assert_eq!(a.attribute("title"), None);
        assert_eq!(a.attributes_source(), r#" HREF="u" docref=List"#);
    }
}
