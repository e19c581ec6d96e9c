use xmltree::Element;

use crate::error::ApiError;
use crate::service::Service;

/// Base trait for Sonos API operations
///
/// An operation knows its service, its SOAP action name, how to build the
/// argument payload and how to read the `<{ACTION}Response>` element.
pub trait SonosOperation {
    /// The request type for this operation
    type Request;

    /// The response type for this operation
    type Response;

    /// The UPnP service this operation belongs to
    const SERVICE: Service;

    /// The SOAP action name for this operation
    const ACTION: &'static str;

    /// Build the XML payload that goes inside the action element
    fn build_payload(request: &Self::Request) -> String;

    /// Extract the typed response from the action response element
    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError>;
}

/// Trimmed text of a direct child, empty when absent
pub(crate) fn child_text(xml: &Element, name: &str) -> String {
    xml.get_child(name)
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}
