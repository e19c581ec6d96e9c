//! Utilities shared by the service decoders
//!
//! - [`xml_decode`]: serde entry point with namespace-prefix stripping
//! - [`entities`]: repair of multiply-escaped `LastChange` payloads
//! - [`didl`]: DIDL-Lite track metadata

pub mod didl;
pub mod entities;
pub mod xml_decode;

pub use didl::{parse_track_metadata, DidlItem, TrackInfo};
pub use entities::{repair_last_change, sanitize_entities, unescape_html};
