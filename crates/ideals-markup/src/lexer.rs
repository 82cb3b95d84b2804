use crate::tokens::Attribute;
use crate::tokens::Token;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

/// Splits doc-comment markup into tags, text runs, whitespace runs and
/// character references. Never fails: anything that is not a well-formed
/// tag is text.
pub struct Lexer<'a> {
    source: &'a str,
    start: usize,
    current: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            start: 0,
            current: 0,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.start = self.current;

            let token = match self.peek() {
                '<' => {
                    if self.rest().starts_with(COMMENT_START) {
                        self.skip_comment();
                        continue;
                    }
                    match self.peek_next() {
                        '!' | '?' => {
                            self.skip_declaration();
                            continue;
                        }
                        '/' => self.lex_end_tag(),
                        c if c.is_ascii_alphabetic() => self.lex_start_tag(),
                        _ => None,
                    }
                    .unwrap_or_else(|| self.lex_text())
                }
                '&' if self.at_char_ref() => self.lex_char_ref(),
                c if c.is_whitespace() => self.lex_whitespace(),
                _ => self.lex_text(),
            };

            tokens.push(token);
        }

        tokens
    }

    fn lex_start_tag(&mut self) -> Option<Token> {
        self.consume(); // <
        let name = self.consume_name();

        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                '>' => {
                    self.consume();
                    return Some(Token::StartTag {
                        name,
                        attributes,
                        self_closing: false,
                    });
                }
                '/' if self.peek_next() == '>' => {
                    self.consume_n(2);
                    return Some(Token::StartTag {
                        name,
                        attributes,
                        self_closing: true,
                    });
                }
                '\0' if self.is_at_end() => return self.rewind(),
                _ => {
                    let attribute = self.lex_attribute()?;
                    attributes.push(attribute);
                }
            }
        }
    }

    fn lex_attribute(&mut self) -> Option<Attribute> {
        let attr_start = self.current;
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_whitespace() || c == '=' || c == '>' || (c == '/' && self.peek_next() == '>')
            {
                break;
            }
            self.consume();
        }
        let name = self.source[attr_start..self.current].to_string();
        if name.is_empty() && self.peek() != '=' {
            return self.rewind();
        }

        let mut value = None;
        let before_eq = self.current;
        self.skip_whitespace();
        if self.peek() == '=' {
            self.consume();
            self.skip_whitespace();
            value = Some(self.lex_attribute_value()?);
        } else {
            self.current = before_eq;
        }

        Some(Attribute {
            raw: self.source[attr_start..self.current].to_string(),
            name,
            value,
        })
    }

    fn lex_attribute_value(&mut self) -> Option<String> {
        match self.peek() {
            quote @ ('"' | '\'') => {
                self.consume();
                let value_start = self.current;
                while !self.is_at_end() && self.peek() != quote {
                    self.consume();
                }
                if self.is_at_end() {
                    return self.rewind();
                }
                let value = self.source[value_start..self.current].to_string();
                self.consume();
                Some(value)
            }
            _ => {
                let value_start = self.current;
                while !self.is_at_end() && !self.peek().is_whitespace() && self.peek() != '>' {
                    self.consume();
                }
                Some(self.source[value_start..self.current].to_string())
            }
        }
    }

    fn lex_end_tag(&mut self) -> Option<Token> {
        self.consume_n(2); // </
        let name = self.consume_name();
        if name.is_empty() {
            return self.rewind();
        }
        self.skip_whitespace();
        if self.peek() != '>' {
            return self.rewind();
        }
        self.consume();
        Some(Token::EndTag { name })
    }

    fn lex_char_ref(&mut self) -> Token {
        while self.peek() != ';' {
            self.consume();
        }
        self.consume(); // ;
        Token::CharRef(self.source[self.start..self.current].to_string())
    }

    /// Whether the input continues with `&name;`, `&#digits;` or `&#xhex;`.
    fn at_char_ref(&self) -> bool {
        let Some(body) = self.rest().strip_prefix('&') else {
            return false;
        };
        let body = body.strip_prefix('#').unwrap_or(body);
        let len = body
            .bytes()
            .take_while(u8::is_ascii_alphanumeric)
            .count();
        len > 0 && body[len..].starts_with(';')
    }

    fn lex_whitespace(&mut self) -> Token {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.consume();
        }
        Token::Whitespace(self.source[self.start..self.current].to_string())
    }

    /// Text up to the next whitespace, `<` or character reference. Always
    /// consumes at least one character.
    fn lex_text(&mut self) -> Token {
        self.current = self.start;
        self.consume();
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_whitespace() || c == '<' || (c == '&' && self.at_char_ref()) {
                break;
            }
            self.consume();
        }
        Token::Text(self.source[self.start..self.current].to_string())
    }

    fn skip_comment(&mut self) {
        match self.rest()[COMMENT_START.len()..].find(COMMENT_END) {
            Some(end) => self.current += COMMENT_START.len() + end + COMMENT_END.len(),
            None => self.current = self.source.len(),
        }
    }

    fn skip_declaration(&mut self) {
        match self.rest().find('>') {
            Some(end) => self.current += end + 1,
            None => self.current = self.source.len(),
        }
    }

    /// Give up on the current construct so it is re-read as text.
    fn rewind<T>(&mut self) -> Option<T> {
        self.current = self.start;
        None
    }

    fn consume_name(&mut self) -> String {
        let name_start = self.current;
        while matches!(self.peek(), c if c.is_ascii_alphanumeric() || c == '-' || c == ':' || c == '_')
        {
            self.consume();
        }
        self.source[name_start..self.current].to_string()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.consume();
        }
    }

    #[inline]
    fn rest(&self) -> &'a str {
        &self.source[self.current..]
    }

    #[inline]
    fn peek(&self) -> char {
        self.rest().chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.rest().chars();
        chars.next(); // Skip current
        chars.next().unwrap_or('\0')
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    #[inline]
    fn consume(&mut self) {
        if let Some(ch) = self.rest().chars().next() {
            self.current += ch.len_utf8();
        }
    }

    fn consume_n(&mut self, count: usize) {
        for _ in 0..count {
            self.consume();
        }
    }
}
