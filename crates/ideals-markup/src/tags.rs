use crate::tree::Element;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    #[default]
    Unordered,
}

/// The closed set of tags with a dedicated rendering. Everything else is
/// [`TagKind::Verbatim`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind {
    Strong,
    Emphasis,
    Strikethrough,
    Code,
    /// `<literal>`: rendered verbatim, but entities inside it are decoded.
    Literal,
    Anchor,
    List(ListKind),
    ListItem,
    Paragraph,
    Verbatim,
}

impl TagKind {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "b" | "strong" => TagKind::Strong,
            "i" | "em" => TagKind::Emphasis,
            "s" | "del" => TagKind::Strikethrough,
            "code" => TagKind::Code,
            "literal" => TagKind::Literal,
            "a" => TagKind::Anchor,
            "ul" => TagKind::List(ListKind::Unordered),
            "ol" => TagKind::List(ListKind::Ordered),
            "li" => TagKind::ListItem,
            "p" => TagKind::Paragraph,
            _ => TagKind::Verbatim,
        }
    }

    /// Whether character references directly inside this tag are decoded.
    #[must_use]
    pub fn decodes_entities(self) -> bool {
        matches!(self, TagKind::Code | TagKind::Literal)
    }
}

/// Literal text written before and after an element's rendered content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkupSpan {
    pub prefix: String,
    pub suffix: String,
}

impl MarkupSpan {
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    #[must_use]
    pub fn wrap(marker: &str) -> Self {
        Self::new(marker, marker)
    }

    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::new(prefix, "")
    }

    /// The element's own tags, attributes reproduced as written.
    #[must_use]
    pub fn preserve(element: &Element) -> Self {
        let open = format!("<{}{}>", element.name, element.attributes_source());
        if element.is_void {
            Self::prefix(open)
        } else {
            Self::new(open, format!("</{}>", element.name))
        }
    }

    /// Span for `element`, given the list kind in effect and whether the
    /// output cursor sits at the start of a continuation line.
    #[must_use]
    pub fn for_element(element: &Element, list_kind: ListKind, at_line_start: bool) -> Self {
        match TagKind::from_name(&element.name) {
            TagKind::Strong => Self::wrap("**"),
            TagKind::Emphasis => Self::wrap("*"),
            TagKind::Strikethrough => Self::wrap("~~"),
            TagKind::Code => {
                if element.text_content().trim().contains('`') {
                    Self::new("`` ", " ``")
                } else {
                    Self::wrap("`")
                }
            }
            TagKind::Anchor => anchor_span(element),
            TagKind::List(_) => Self::default(),
            TagKind::ListItem => match list_kind {
                ListKind::Unordered => Self::prefix(" * "),
                ListKind::Ordered => Self::prefix(" 1. "),
            },
            TagKind::Paragraph => {
                if at_line_start {
                    Self::prefix("\n * ")
                } else {
                    Self::prefix("\n *\n *")
                }
            }
            TagKind::Literal | TagKind::Verbatim => Self::preserve(element),
        }
    }
}

fn anchor_span(element: &Element) -> MarkupSpan {
    if let Some(docref) = element.attribute("docref") {
        if element.text_content() == docref {
            MarkupSpan::new("[", "]")
        } else {
            MarkupSpan::new("[", format!("][{docref}]"))
        }
    } else if let Some(href) = element.attribute("href") {
        MarkupSpan::new("[", format!("]({href})"))
    } else {
        MarkupSpan::preserve(element)
    }
}
