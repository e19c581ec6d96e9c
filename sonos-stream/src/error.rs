//! Error types for the sonos-stream crate.

use callback_server::CallbackError;
use sonos_api::ApiError;

use crate::display::DisplayError;

/// Errors that can occur while listening for events.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A subscribe, renew or unsubscribe call did not complete
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Invalid configuration, or a device that cannot be reached at all
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The callback server could not start or stopped unexpectedly
    #[error("Callback server error: {0}")]
    CallbackServer(String),

    /// Album art could not be fetched
    #[error("Album art error: {0}")]
    Art(String),

    /// The display sink rejected a write
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    /// A device request failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<CallbackError> for StreamError {
    fn from(err: CallbackError) -> Self {
        StreamError::CallbackServer(err.to_string())
    }
}

/// Convenience Result type alias for listener operations.
pub type Result<T> = std::result::Result<T, StreamError>;
