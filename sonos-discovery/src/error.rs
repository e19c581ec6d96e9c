//! Error types for discovery and enrichment.

use std::fmt;

/// Error type for discovery operations.
///
/// Covers the socket side of SSDP as well as the HTTP fetch and parse of
/// device descriptions during enrichment.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Network-related errors (socket creation, send, HTTP requests)
    NetworkError(String),
    /// Parsing errors (description XML, missing device information)
    ParseError(String),
    /// A device description endpoint answered with a non-200 status
    HttpStatus { status: u16, location: String },
    /// Operation ran past its deadline
    Timeout,
    /// Invalid device data
    InvalidDevice(String),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DiscoveryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DiscoveryError::HttpStatus { status, location } => {
                write!(f, "Description fetch from {} returned HTTP {}", location, status)
            }
            DiscoveryError::Timeout => write!(f, "Operation timed out"),
            DiscoveryError::InvalidDevice(msg) => write!(f, "Invalid device: {}", msg),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
