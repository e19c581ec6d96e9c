//! DIDL-Lite track metadata.
//!
//! Track metadata arrives as an escaped DIDL-Lite fragment both in
//! GetPositionInfo responses and in AVTransport events. Parsing is a single
//! namespace-aware pass over the first `item`, reading only its direct
//! children.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::common::entities::{sanitize_entities, unescape_html};
use crate::error::{ParseError, ParseResult};

const DC_NS: &[u8] = b"http://purl.org/dc/elements/1.1/";
const UPNP_NS: &[u8] = b"urn:schemas-upnp-org:metadata-1-0/upnp/";
const RINCON_NS: &[u8] = b"urn:schemas-rinconnetworks-com:metadata-1-0/";

/// Primary metadata for the track playing on a device.
///
/// Every field is trimmed; an empty string means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Free-form stream description (`r:streamContent`), e.g. "Artist - Song" on radio
    pub stream_info: String,
    pub uri: String,
    /// Raw transport state, e.g. `PLAYING`
    pub state: String,
    pub album_art_uri: String,
}

impl TrackInfo {
    /// True when no descriptive field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.artist.is_empty()
            && self.album.is_empty()
            && self.stream_info.is_empty()
            && self.uri.is_empty()
            && self.album_art_uri.is_empty()
    }
}

/// Fields read from a DIDL-Lite `item`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DidlItem {
    pub title: String,
    pub creator: String,
    pub album: String,
    pub album_art_uri: String,
    pub stream_content: String,
    pub program_title: String,
    pub radio_show: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vocabulary {
    DublinCore,
    Upnp,
    Rincon,
    Other,
}

impl Vocabulary {
    fn of(resolved: &ResolveResult<'_>) -> Self {
        match resolved {
            ResolveResult::Bound(Namespace(ns)) if *ns == DC_NS => Vocabulary::DublinCore,
            ResolveResult::Bound(Namespace(ns)) if *ns == UPNP_NS => Vocabulary::Upnp,
            ResolveResult::Bound(Namespace(ns)) if *ns == RINCON_NS => Vocabulary::Rincon,
            _ => Vocabulary::Other,
        }
    }
}

impl DidlItem {
    /// Parse the first `item` of a DIDL-Lite document.
    ///
    /// A document without an `item` yields an empty item rather than an
    /// error.
    pub fn from_xml(xml: &str) -> ParseResult<Self> {
        let mut reader = NsReader::from_str(xml);
        reader.trim_text(true);

        let mut stack: Vec<(Vocabulary, String)> = Vec::new();
        let mut item_depth: Option<usize> = None;
        let mut item = DidlItem::default();

        loop {
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| ParseError::InvalidTrackMetadata(e.to_string()))?;

            match event {
                Event::Start(e) => {
                    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    stack.push((Vocabulary::of(&resolved), local));
                    if item_depth.is_none() && stack.last().is_some_and(|(_, name)| name == "item") {
                        item_depth = Some(stack.len());
                    }
                }
                Event::End(_) => {
                    if item_depth == Some(stack.len()) {
                        return Ok(item);
                    }
                    stack.pop();
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|e| ParseError::InvalidTrackMetadata(e.to_string()))?;
                    item.capture(&stack, item_depth, value.trim());
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    item.capture(&stack, item_depth, value.trim());
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(item)
    }

    fn capture(&mut self, stack: &[(Vocabulary, String)], item_depth: Option<usize>, value: &str) {
        let Some(depth) = item_depth else { return };
        if value.is_empty() || stack.len() != depth + 1 {
            return;
        }
        let Some((vocabulary, name)) = stack.last() else { return };

        match (vocabulary, name.as_str()) {
            (Vocabulary::DublinCore, "title") => self.title = value.to_string(),
            (Vocabulary::DublinCore, "creator") => self.creator = value.to_string(),
            (Vocabulary::Upnp, "album") => self.album = value.to_string(),
            (Vocabulary::Upnp, "albumArtURI") => self.album_art_uri = value.to_string(),
            (Vocabulary::Rincon, "streamContent") => self.stream_content = value.to_string(),
            (Vocabulary::Rincon, "programTitle") => self.program_title = value.to_string(),
            (Vocabulary::Rincon, "radioShow") => self.radio_show = value.to_string(),
            // Some services omit namespaces entirely.
            (Vocabulary::Other, "title") if self.title.is_empty() => self.title = value.to_string(),
            (Vocabulary::Other, "creator") if self.creator.is_empty() => self.creator = value.to_string(),
            (Vocabulary::Other, "album") if self.album.is_empty() => self.album = value.to_string(),
            _ => {}
        }
    }
}

/// Build [`TrackInfo`] from an escaped DIDL-Lite metadata value and a track URI.
///
/// The metadata goes through one HTML unescape and the ampersand sanitizer
/// before parsing. Empty metadata, or the `NOT_IMPLEMENTED` marker some
/// sources report, yields a `TrackInfo` carrying only the URI. The title
/// falls back to the program title, then the radio show, then the stream
/// description.
///
/// # Errors
///
/// Returns `ParseError::InvalidTrackMetadata` when the metadata is present
/// but cannot be parsed.
pub fn parse_track_metadata(metadata: &str, uri: &str) -> ParseResult<TrackInfo> {
    let mut info = TrackInfo {
        uri: uri.trim().to_string(),
        ..Default::default()
    };

    let metadata = metadata.trim();
    if metadata.is_empty() || metadata.eq_ignore_ascii_case("NOT_IMPLEMENTED") {
        return Ok(info);
    }

    // Values taken from an event attribute were already unescaped once, so
    // an escaped `<` in a field turns into markup here and the parse fails.
    let unescaped = unescape_html(metadata);
    let sanitized = sanitize_entities(&unescaped);
    let item = DidlItem::from_xml(&sanitized)?;

    info.title = item.title;
    info.artist = item.creator;
    info.album = item.album;
    info.stream_info = item.stream_content;
    info.album_art_uri = item.album_art_uri;

    if info.title.is_empty() {
        info.title = [&item.program_title, &item.radio_show, &info.stream_info]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .cloned()
            .unwrap_or_default();
    }

    Ok(info)
}
