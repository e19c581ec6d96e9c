//! Error types for payload decoding

use thiserror::Error;

/// Errors that can occur while decoding event payloads and track metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Serde-driven deserialization of an XML document failed
    #[error("XML deserialization failed: {0}")]
    XmlDeserializationFailed(String),

    /// The XML token stream was malformed
    #[error("Invalid XML structure: {0}")]
    InvalidXmlStructure(String),

    /// A required element or value was absent
    #[error("Missing required element: {0}")]
    MissingRequiredElement(String),

    /// Embedded DIDL-Lite track metadata could not be parsed
    #[error("Invalid track metadata: {0}")]
    InvalidTrackMetadata(String),
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
