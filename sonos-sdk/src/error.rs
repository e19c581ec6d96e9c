use thiserror::Error;

use crate::logging::LoggingError;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] sonos_discovery::DiscoveryError),

    #[error("API error: {0}")]
    ApiError(#[from] sonos_api::ApiError),

    #[error("Listener error: {0}")]
    Stream(#[from] sonos_stream::StreamError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("No Sonos devices found")]
    NoDevices,
}
