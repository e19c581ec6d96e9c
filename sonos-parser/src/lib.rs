//! # sonos-parser
//!
//! Decoding for the XML payloads Sonos players push and return: AVTransport
//! NOTIFY bodies and the DIDL-Lite track metadata embedded in them and in
//! GetPositionInfo responses.
//!
//! ## Usage
//!
//! ```rust
//! use sonos_parser::parse_track_metadata;
//!
//! let metadata = "&lt;DIDL-Lite xmlns:dc=&quot;http://purl.org/dc/elements/1.1/&quot;&gt;\
//!     &lt;item&gt;&lt;dc:title&gt;Song&lt;/dc:title&gt;&lt;/item&gt;&lt;/DIDL-Lite&gt;";
//! let track = parse_track_metadata(metadata, "x-file-cifs://song.mp3")?;
//! assert_eq!(track.title, "Song");
//! # Ok::<(), sonos_parser::ParseError>(())
//! ```

pub mod common;
pub mod error;
pub mod services;

pub use common::{parse_track_metadata, repair_last_change, sanitize_entities, DidlItem, TrackInfo};
pub use error::{ParseError, ParseResult};
pub use services::av_transport::AVTransportEvent;
