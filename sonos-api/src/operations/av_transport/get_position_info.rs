//! GetPositionInfo operation for AVTransport service

use xmltree::Element;

use crate::operation::child_text;
use crate::{ApiError, Service, SonosOperation};

/// GetPositionInfo operation
pub struct GetPositionInfoOperation;

/// Request for GetPositionInfo operation
#[derive(Debug, Clone, Default)]
pub struct GetPositionInfoRequest {
    pub instance_id: u32,
}

/// Response for GetPositionInfo operation
///
/// `track_metadata` is the DIDL-Lite document exactly as the device sent it
/// (once unescaped by the XML layer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetPositionInfoResponse {
    pub track: String,
    pub track_metadata: String,
    pub track_uri: String,
    pub rel_time: String,
}

impl SonosOperation for GetPositionInfoOperation {
    type Request = GetPositionInfoRequest;
    type Response = GetPositionInfoResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "GetPositionInfo";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<InstanceID>{}</InstanceID><Channel>Master</Channel>",
            request.instance_id
        )
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(GetPositionInfoResponse {
            track: child_text(xml, "Track"),
            track_metadata: child_text(xml, "TrackMetaData"),
            track_uri: child_text(xml, "TrackURI"),
            rel_time: child_text(xml, "RelTime"),
        })
    }
}
