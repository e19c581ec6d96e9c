use soap_client::SoapError;
use sonos_parser::ParseError as PayloadError;
use thiserror::Error;

/// High-level API errors for Sonos operations
///
/// This enum provides domain-specific error types that abstract away the underlying
/// SOAP and GENA communication details.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network communication error
    ///
    /// Connection failures, timeouts and unreadable response bodies.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The device answered with an unexpected HTTP status
    #[error("HTTP status {status}: {snippet}")]
    HttpStatus { status: u16, snippet: String },

    /// Response parsing error
    ///
    /// The device answered but the envelope, the expected response element
    /// or the embedded track metadata could not be read.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// SOAP fault returned by device
    #[error("{service} fault {fault_code}: {description}")]
    SoapFault {
        service: &'static str,
        fault_code: String,
        error_code: Option<String>,
        description: String,
    },

    /// Invalid parameter value
    ///
    /// Returned before any request is made, e.g. for a device without a
    /// location or an empty album art URI.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Subscription operation failed
    #[error("Subscription error: {0}")]
    SubscriptionError(String),
}

impl ApiError {
    /// Attach the service name to a SOAP error
    pub(crate) fn from_soap(service: &'static str, error: SoapError) -> Self {
        match error {
            SoapError::Fault {
                fault_code,
                error_code,
                description,
            } => ApiError::SoapFault {
                service,
                fault_code,
                error_code,
                description,
            },
            other => other.into(),
        }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

/// Convert from SoapError to ApiError
impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => ApiError::NetworkError(msg),
            SoapError::Http { status, snippet } => ApiError::HttpStatus { status, snippet },
            SoapError::Parse(msg) => ApiError::ParseError(msg),
            SoapError::Fault {
                fault_code,
                error_code,
                description,
            } => ApiError::SoapFault {
                service: "soap",
                fault_code,
                error_code,
                description,
            },
        }
    }
}

impl From<PayloadError> for ApiError {
    fn from(error: PayloadError) -> Self {
        ApiError::ParseError(format!("track metadata: {}", error))
    }
}
