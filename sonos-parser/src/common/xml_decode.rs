//! Serde entry point for UPnP XML documents.
//!
//! Event documents mix prefixed (`e:property`, `r:NextTrackURI`) and
//! unprefixed element names. Prefixes and `xmlns` declarations are stripped
//! before deserializing so the serde structs can use plain local names.

use serde::de::DeserializeOwned;

use crate::error::{ParseError, ParseResult};

/// Parse an XML document into `T` after stripping namespace prefixes.
pub fn parse<T: DeserializeOwned>(xml: &str) -> ParseResult<T> {
    let stripped = strip_namespaces(xml);
    quick_xml::de::from_str(&stripped).map_err(|e| ParseError::XmlDeserializationFailed(e.to_string()))
}

/// Remove namespace prefixes from element and attribute names and drop
/// `xmlns` declarations.
///
/// Text content and attribute values are copied verbatim. Processing
/// instructions, comments and declarations pass through unchanged.
///
/// Input: `<e:propertyset xmlns:e="urn:x"><e:property a:b="1"/></e:propertyset>`
/// Output: `<propertyset><property b="1"/></propertyset>`
pub fn strip_namespaces(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];

        if rest.starts_with("<?") || rest.starts_with("<!") {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        let end = tag_end(rest);
        strip_tag(&rest[..end], &mut out);
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

/// Byte length of the tag starting at `tag[0] == '<'`, honouring quoted
/// attribute values.
fn tag_end(tag: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in tag.char_indices().skip(1) {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if q == c => quote = None,
            (None, '>') => return i + 1,
            _ => {}
        }
    }
    tag.len()
}

fn strip_tag(tag: &str, out: &mut String) {
    let inner = tag.trim_start_matches('<').trim_end_matches('>');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_len = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    let (name, mut attributes) = inner.split_at(name_len);

    out.push('<');
    if closing {
        out.push('/');
    }
    out.push_str(local_part(name));

    loop {
        let trimmed = attributes.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let Some(eq) = trimmed.find('=') else {
            out.push(' ');
            out.push_str(trimmed.trim_end());
            break;
        };
        let attr_name = trimmed[..eq].trim();
        let value_part = trimmed[eq + 1..].trim_start();
        let value_len = quoted_len(value_part);
        let value = &value_part[..value_len];
        attributes = &value_part[value_len..];

        if attr_name == "xmlns" || attr_name.starts_with("xmlns:") {
            continue;
        }
        out.push(' ');
        out.push_str(local_part(attr_name));
        out.push('=');
        out.push_str(value);
    }

    if self_closing {
        out.push('/');
    }
    out.push('>');
}

/// Length of a leading quoted value, quotes included. Unquoted values run
/// to the next whitespace.
fn quoted_len(value: &str) -> usize {
    let mut chars = value.char_indices();
    match chars.next() {
        Some((_, q)) if q == '"' || q == '\'' => chars
            .find(|(_, c)| *c == q)
            .map_or(value.len(), |(i, c)| i + c.len_utf8()),
        _ => value.find(char::is_whitespace).unwrap_or(value.len()),
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}
