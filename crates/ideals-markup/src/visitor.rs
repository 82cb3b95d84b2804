use crate::tree::Element;
use crate::tree::Node;
use crate::tree::TextPart;

/// Trait for visiting nodes of a markup tree.
pub trait Visitor {
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &Element) {
        walk_nodes(self, &element.children);
    }

    fn visit_text(&mut self, _parts: &[TextPart]) {}
    fn visit_whitespace(&mut self, _whitespace: &str) {}
}

/// Dispatch a single node to the matching visitor method.
pub fn walk_node<V: Visitor + ?Sized>(visitor: &mut V, node: &Node) {
    match node {
        Node::Element(element) => visitor.visit_element(element),
        Node::Text(parts) => visitor.visit_text(parts),
        Node::Whitespace(whitespace) => visitor.visit_whitespace(whitespace),
    }
}

/// Visit each node in sequence.
pub fn walk_nodes<V: Visitor + ?Sized>(visitor: &mut V, nodes: &[Node]) {
    for node in nodes {
        visitor.visit_node(node);
    }
}
