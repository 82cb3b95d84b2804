/// One attribute as written in a start tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Source text of the whole attribute, e.g. `href="x.html"`.
    pub raw: String,
    pub name: String,
    /// Value with surrounding quotes removed, `None` for bare attributes.
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    /// A run of non-whitespace character data.
    Text(String),
    Whitespace(String),
    /// A character reference as written, e.g. `&lt;` or `&#x41;`.
    CharRef(String),
}
