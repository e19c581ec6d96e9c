//! GetTransportInfo operation for AVTransport service

use xmltree::Element;

use crate::operation::child_text;
use crate::{ApiError, Service, SonosOperation};

/// GetTransportInfo operation
pub struct GetTransportInfoOperation;

/// Request for GetTransportInfo operation
#[derive(Debug, Clone, Default)]
pub struct GetTransportInfoRequest {
    pub instance_id: u32,
}

/// Response for GetTransportInfo operation
///
/// The state is kept raw (`PLAYING`, `PAUSED_PLAYBACK`, ...) because players
/// report values outside the UPnP list; see [`crate::format_state_display`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetTransportInfoResponse {
    pub current_transport_state: String,
    pub current_transport_status: String,
    pub current_speed: String,
}

impl SonosOperation for GetTransportInfoOperation {
    type Request = GetTransportInfoRequest;
    type Response = GetTransportInfoResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "GetTransportInfo";

    fn build_payload(request: &Self::Request) -> String {
        format!("<InstanceID>{}</InstanceID>", request.instance_id)
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(GetTransportInfoResponse {
            current_transport_state: child_text(xml, "CurrentTransportState"),
            current_transport_status: child_text(xml, "CurrentTransportStatus"),
            current_speed: child_text(xml, "CurrentSpeed"),
        })
    }
}
