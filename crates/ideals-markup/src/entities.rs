use std::borrow::Cow;

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
];

/// Replace a character reference such as `&lt;`, `&#60;` or `&#x3c;` with
/// the character it names. Unknown or invalid references come back as
/// written.
#[must_use]
pub fn unescape(reference: &str) -> Cow<'_, str> {
    let Some(body) = reference
        .strip_prefix('&')
        .and_then(|r| r.strip_suffix(';'))
    else {
        return Cow::Borrowed(reference);
    };

    let decoded = match body.strip_prefix('#') {
        Some(numeric) => decode_numeric(numeric),
        None => NAMED
            .iter()
            .find(|(name, _)| *name == body)
            .map(|&(_, c)| c),
    };

    match decoded {
        Some(c) => Cow::Owned(c.to_string()),
        None => Cow::Borrowed(reference),
    }
}

fn decode_numeric(numeric: &str) -> Option<char> {
    let code = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => numeric.parse().ok()?,
    };
    char::from_u32(code)
}
