//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP and GENA communication
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoapError {
    /// Connection, timeout or body read failure
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The device answered with an unexpected HTTP status
    #[error("HTTP status {status}: {snippet}")]
    Http { status: u16, snippet: String },

    /// XML parsing error or a response missing the expected element
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// SOAP fault returned by the device
    #[error("SOAP fault {fault_code}: {description}")]
    Fault {
        fault_code: String,
        /// UPnP `errorCode` from the fault detail, if present
        error_code: Option<String>,
        description: String,
    },
}
