//! Entity repair for AVTransport `LastChange` payloads.
//!
//! The `LastChange` text of an AVTransport NOTIFY is an escaped XML document
//! whose `val` attributes carry DIDL-Lite metadata that was escaped a second
//! time. Firmware is not consistent about it: some payloads arrive with the
//! inner level already collapsed, leaving raw `<`, `>` and quotes inside
//! attribute values, and free-text fields sometimes contain ampersands that
//! were never encoded at all. [`repair_last_change`] turns both shapes into a
//! document a strict XML parser accepts.

use std::borrow::Cow;

const QUOT_PLACEHOLDER: char = '\u{E000}';
const APOS_PLACEHOLDER: char = '\u{E001}';

/// Repair an unescaped-once `LastChange` value into well-formed XML.
///
/// Steps, in order:
/// 1. hide `&amp;quot;` / `&amp;apos;` behind placeholders
/// 2. one HTML entity unescape pass
/// 3. restore the placeholders as `&quot;` / `&apos;`
/// 4. re-escape markup found inside attribute values
/// 5. escape every `&` that does not start a valid reference
pub fn repair_last_change(raw: &str) -> String {
    let protected = raw
        .replace("&amp;quot;", &QUOT_PLACEHOLDER.to_string())
        .replace("&amp;apos;", &APOS_PLACEHOLDER.to_string());

    let unescaped = unescape_html(&protected);

    let restored = unescaped
        .replace(QUOT_PLACEHOLDER, "&quot;")
        .replace(APOS_PLACEHOLDER, "&apos;");

    let escaped = escape_attribute_markup(&restored);

    sanitize_entities(&escaped).into_owned()
}

/// Decode every complete HTML character reference (`&name;`, `&#123;`,
/// `&#x1F;`) once.
///
/// A bare `&`, or a reference without its terminating `;`, is copied through
/// untouched so it cannot swallow the text that follows it.
pub fn unescape_html(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];

        let name_len = candidate[1..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'#')
            .count();

        if name_len > 0 && candidate.as_bytes().get(name_len + 1) == Some(&b';') {
            let reference = &candidate[..name_len + 2];
            out.push_str(&html_escape::decode_html_entities(reference));
            rest = &candidate[name_len + 2..];
        } else {
            out.push('&');
            rest = &candidate[1..];
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Escape `&` characters that do not begin a valid XML reference.
///
/// A reference runs from `&` to the first `;`, `&`, whitespace, angle
/// bracket or quote. It is kept only when it ends in `;` and names one of the
/// predefined XML entities or a decimal/hex character reference.
pub fn sanitize_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len() + 16);
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }
        out.push_str(&input[copied..i]);

        let mut j = i + 1;
        while j < bytes.len() && bytes[j] != b';' && bytes[j] != b'&' && !is_reference_terminator(bytes[j]) {
            j += 1;
        }

        if j < bytes.len() && bytes[j] == b';' && is_valid_reference(&input[i + 1..j]) {
            out.push_str(&input[i..=j]);
            i = j + 1;
        } else {
            out.push_str("&amp;");
            i += 1;
        }
        copied = i;
    }

    out.push_str(&input[copied..]);
    Cow::Owned(out)
}

fn is_reference_terminator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'<' | b'>' | b'"' | b'\'')
}

fn is_valid_reference(name: &str) -> bool {
    if let Some(numeric) = name.strip_prefix('#') {
        if let Some(hex) = numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X')) {
            return !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit());
        }
        return !numeric.is_empty() && numeric.bytes().all(|b| b.is_ascii_digit());
    }
    matches!(name, "amp" | "lt" | "gt" | "quot" | "apos")
}

/// Re-escape raw markup that sits inside quoted attribute values.
///
/// Outer markup is left alone. Inside an attribute value, `<x ...>`-like
/// runs are treated as a nested fragment whose element depth is tracked, so
/// the value only ends at its own quote character once every nested element
/// has been closed.
pub fn escape_attribute_markup(input: &str) -> String {
    let mut escaper = MarkupEscaper::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        escaper.push(c, chars.peek().copied());
    }
    escaper.out
}

#[derive(Debug, Clone, Copy)]
struct NestedTag {
    closing: bool,
    declaration: bool,
    quote: Option<char>,
    prev: char,
}

struct MarkupEscaper {
    out: String,
    in_tag: bool,
    attr_quote: Option<char>,
    depth: usize,
    nested: Option<NestedTag>,
}

impl MarkupEscaper {
    fn with_capacity(len: usize) -> Self {
        Self {
            out: String::with_capacity(len + len / 4),
            in_tag: false,
            attr_quote: None,
            depth: 0,
            nested: None,
        }
    }

    fn push(&mut self, c: char, next: Option<char>) {
        let Some(quote) = self.attr_quote else {
            match c {
                '<' => self.in_tag = true,
                '>' => self.in_tag = false,
                '"' | '\'' if self.in_tag => {
                    self.attr_quote = Some(c);
                    self.depth = 0;
                }
                _ => {}
            }
            self.out.push(c);
            return;
        };

        if let Some(tag) = self.nested {
            self.nested = self.push_nested(tag, c);
            return;
        }

        match c {
            '<' if next.is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?')) => {
                self.nested = Some(NestedTag {
                    closing: next == Some('/'),
                    declaration: matches!(next, Some('!' | '?')),
                    quote: None,
                    prev: c,
                });
                self.out.push_str("&lt;");
            }
            q if q == quote && self.depth == 0 => {
                self.attr_quote = None;
                self.out.push(q);
            }
            _ => self.push_escaped(c),
        }
    }

    /// Returns the tag state after `c`, or `None` once the tag closed.
    fn push_nested(&mut self, mut tag: NestedTag, c: char) -> Option<NestedTag> {
        match c {
            '"' | '\'' => {
                match tag.quote {
                    None => tag.quote = Some(c),
                    Some(open) if open == c => tag.quote = None,
                    Some(_) => {}
                }
                self.push_escaped(c);
            }
            '>' if tag.quote.is_none() => {
                if tag.closing {
                    self.depth = self.depth.saturating_sub(1);
                } else if !tag.declaration && tag.prev != '/' {
                    self.depth += 1;
                }
                self.out.push_str("&gt;");
                return None;
            }
            _ => self.push_escaped(c),
        }
        tag.prev = c;
        Some(tag)
    }

    fn push_escaped(&mut self, c: char) {
        match c {
            '<' => self.out.push_str("&lt;"),
            '>' => self.out.push_str("&gt;"),
            '&' => self.out.push_str("&amp;"),
            '"' => self.out.push_str("&quot;"),
            '\'' => self.out.push_str("&apos;"),
            _ => self.out.push(c),
        }
    }
}
