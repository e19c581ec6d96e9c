//! Private SOAP client for UPnP device communication
//!
//! This crate provides a minimal SOAP client specifically designed for
//! communicating with UPnP devices like Sonos speakers. It also supports
//! UPnP event subscriptions using SUBSCRIBE/UNSUBSCRIBE methods, see
//! [`subscription`].

mod error;
pub mod subscription;

pub use error::SoapError;
pub use subscription::{parse_timeout_header, SubscriptionResponse, DEFAULT_SUBSCRIPTION_TIMEOUT};

use std::time::Duration;
use tracing::debug;
use xmltree::Element;

/// Overall deadline applied to every request made by a default client
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest body excerpt carried by [`SoapError::Http`] for control calls
const SOAP_SNIPPET_CHARS: usize = 256;

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with the default 5 second timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests are bounded by `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    /// Send a SOAP request and return the `<{action}Response>` element.
    ///
    /// A SOAP fault in the body is reported as [`SoapError::Fault`] even
    /// when the device answers with HTTP 500. Any other non-200 answer is
    /// [`SoapError::Http`].
    pub fn call(
        &self,
        control_url: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_uri}">{payload}</u:{action}></s:Body></s:Envelope>"#,
            action = action,
            service_uri = service_uri,
            payload = payload
        );
        let soap_action = format!("\"{}#{}\"", service_uri, action);

        debug!(url = control_url, action, "sending SOAP request");

        let result = self
            .agent
            .post(control_url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body);

        let (status, xml_text) = match result {
            Ok(response) => {
                let status = response.status();
                let text = response
                    .into_string()
                    .map_err(|e| SoapError::Network(e.to_string()))?;
                (status, text)
            }
            // Faults arrive as HTTP 500 and still carry an envelope
            Err(ureq::Error::Status(status, response)) => {
                (status, response.into_string().unwrap_or_default())
            }
            Err(e) => return Err(SoapError::Network(e.to_string())),
        };

        parse_response(status, &xml_text, action)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpret a control response body.
///
/// Precedence: fault, then HTTP status, then the action response element.
fn parse_response(status: u16, xml_text: &str, action: &str) -> Result<Element, SoapError> {
    let parsed = Element::parse(xml_text.as_bytes());

    if let Ok(envelope) = &parsed {
        if let Some(fault) = envelope.get_child("Body").and_then(|b| b.get_child("Fault")) {
            return Err(fault_error(fault));
        }
    }

    if status != 200 {
        return Err(SoapError::Http {
            status,
            snippet: body_snippet(xml_text),
        });
    }

    let envelope = parsed.map_err(|e| SoapError::Parse(e.to_string()))?;
    extract_response(&envelope, action)
}

fn extract_response(xml: &Element, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    let response_name = format!("{}Response", action);
    body.get_child(response_name.as_str())
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}

fn fault_error(fault: &Element) -> SoapError {
    let text_of = |element: Option<&Element>| {
        element
            .and_then(|e| e.get_text())
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    };

    let upnp_error = fault
        .get_child("detail")
        .and_then(|d| d.get_child("UPnPError"));

    let fault_code = text_of(fault.get_child("faultcode"));
    let fault_string = text_of(fault.get_child("faultstring"));
    let error_code = text_of(upnp_error.and_then(|e| e.get_child("errorCode")));
    let error_description = text_of(upnp_error.and_then(|e| e.get_child("errorDescription")));

    let description = if !error_description.is_empty() {
        error_description
    } else if !fault_string.is_empty() {
        fault_string
    } else if !error_code.is_empty() {
        format!("UPnPError {}", error_code)
    } else {
        String::new()
    };

    SoapError::Fault {
        fault_code,
        error_code: (!error_code.is_empty()).then_some(error_code),
        description,
    }
}

fn body_snippet(text: &str) -> String {
    text.trim().chars().take(SOAP_SNIPPET_CHARS).collect()
}
