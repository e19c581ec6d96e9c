//! AVTransport NOTIFY decoding
//!
//! UPnP events are wrapped in a property set whose `LastChange` text holds
//! the escaped per-instance state document:
//!
//! ```xml
//! <e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
//!   <e:property>
//!     <LastChange>&lt;Event ...&gt;&lt;InstanceID val="0"&gt;...</LastChange>
//!   </e:property>
//! </e:propertyset>
//! ```

use serde::Deserialize;

use crate::common::didl::{parse_track_metadata, TrackInfo};
use crate::common::entities::repair_last_change;
use crate::common::xml_decode;
use crate::error::{ParseError, ParseResult};

/// State and track carried by one AVTransport event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AVTransportEvent {
    /// Raw transport state, e.g. `PAUSED_PLAYBACK`; empty when not reported
    pub transport_state: String,
    pub track: TrackInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "propertyset")]
struct PropertySet {
    #[serde(rename = "property", default)]
    properties: Vec<Property>,
}

#[derive(Debug, Deserialize)]
struct Property {
    #[serde(rename = "LastChange", default)]
    last_change: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Event")]
struct LastChangeEvent {
    #[serde(rename = "InstanceID", default)]
    instances: Vec<InstanceID>,
}

#[derive(Debug, Deserialize)]
struct InstanceID {
    #[serde(rename = "TransportState", default)]
    transport_state: ValueAttribute,

    #[serde(rename = "CurrentTrackMetaData", default)]
    current_track_metadata: ValueAttribute,

    #[serde(rename = "CurrentTrackURI", default)]
    current_track_uri: ValueAttribute,
}

/// An element whose payload lives in its `val` attribute, e.g.
/// `<TransportState val="PLAYING"/>`.
#[derive(Debug, Clone, Default, Deserialize)]
struct ValueAttribute {
    #[serde(rename = "@val", default)]
    val: String,
}

impl ValueAttribute {
    fn trimmed(&self) -> &str {
        self.val.trim()
    }
}

impl AVTransportEvent {
    /// Decode a NOTIFY body.
    ///
    /// Only the first `InstanceID` is read. Track metadata that fails to
    /// parse is dropped in favour of the bare track URI instead of failing
    /// the whole event.
    ///
    /// # Errors
    ///
    /// Fails when the body is not a property set, when no property carries
    /// a non-empty `LastChange`, when the repaired `LastChange` does not
    /// parse, or when it holds no `InstanceID`.
    pub fn from_xml(body: &str) -> ParseResult<Self> {
        let property_set: PropertySet = xml_decode::parse(body)?;

        let last_change = property_set
            .properties
            .into_iter()
            .filter_map(|p| p.last_change)
            .find(|value| !value.trim().is_empty())
            .ok_or_else(|| ParseError::MissingRequiredElement("LastChange".to_string()))?;

        let repaired = repair_last_change(&last_change);
        let inner: LastChangeEvent = xml_decode::parse(&repaired)?;

        let instance = inner
            .instances
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::MissingRequiredElement("InstanceID".to_string()))?;

        let mut event = AVTransportEvent {
            transport_state: instance.transport_state.trimmed().to_string(),
            ..Default::default()
        };

        let mut metadata = instance.current_track_metadata.trimmed();
        if metadata.eq_ignore_ascii_case("NOT_IMPLEMENTED") {
            metadata = "";
        }
        let uri = instance.current_track_uri.trimmed();

        if !metadata.is_empty() || !uri.is_empty() {
            event.track = parse_track_metadata(metadata, uri).unwrap_or_else(|_| TrackInfo {
                uri: uri.to_string(),
                ..Default::default()
            });
        }

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(last_change: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?><e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><LastChange>{}</LastChange></e:property></e:propertyset>"#,
            last_change
        )
    }

    #[test]
    fn test_state_only_event() {
        let body = wrap("&lt;Event xmlns=&quot;urn:schemas-upnp-org:metadata-1-0/AVT/&quot;&gt;&lt;InstanceID val=&quot;0&quot;&gt;&lt;TransportState val=&quot;STOPPED&quot;/&gt;&lt;/InstanceID&gt;&lt;/Event&gt;");

        let event = AVTransportEvent::from_xml(&body).unwrap();
        assert_eq!(event.transport_state, "STOPPED");
        assert!(event.track.is_empty());
    }

    #[test]
    fn test_first_non_empty_last_change_wins() {
        let body = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><LastChange>  </LastChange></e:property><e:property><LastChange>&lt;Event&gt;&lt;InstanceID val=&quot;0&quot;&gt;&lt;TransportState val=&quot;PLAYING&quot;/&gt;&lt;/InstanceID&gt;&lt;/Event&gt;</LastChange></e:property></e:propertyset>"#;

        let event = AVTransportEvent::from_xml(body).unwrap();
        assert_eq!(event.transport_state, "PLAYING");
    }

    #[test]
    fn test_missing_last_change_is_error() {
        let body = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><Volume>10</Volume></e:property></e:propertyset>"#;

        let err = AVTransportEvent::from_xml(body).unwrap_err();
        assert_eq!(err, ParseError::MissingRequiredElement("LastChange".to_string()));
    }

    #[test]
    fn test_missing_instance_is_error() {
        let body = wrap("&lt;Event xmlns=&quot;urn:schemas-upnp-org:metadata-1-0/AVT/&quot;&gt;&lt;/Event&gt;");

        let err = AVTransportEvent::from_xml(&body).unwrap_err();
        assert_eq!(err, ParseError::MissingRequiredElement("InstanceID".to_string()));
    }

    #[test]
    fn test_not_implemented_metadata_keeps_uri() {
        let body = wrap("&lt;Event&gt;&lt;InstanceID val=&quot;0&quot;&gt;&lt;TransportState val=&quot;PLAYING&quot;/&gt;&lt;CurrentTrackMetaData val=&quot;NOT_IMPLEMENTED&quot;/&gt;&lt;CurrentTrackURI val=&quot;x-rincon-mp3radio://stream&quot;/&gt;&lt;/InstanceID&gt;&lt;/Event&gt;");

        let event = AVTransportEvent::from_xml(&body).unwrap();
        assert_eq!(event.track.uri, "x-rincon-mp3radio://stream");
        assert!(event.track.title.is_empty());
    }

    #[test]
    fn test_garbage_body_is_error() {
        assert!(AVTransportEvent::from_xml("not xml at all <<<").is_err());
    }
}
