//! Error types for the callback server

use thiserror::Error;

/// Errors raised while starting, running or stopping the callback server
#[derive(Debug, Error)]
pub enum CallbackError {
    /// No usable local address could be determined
    #[error("determine local callback address: {0}")]
    LocalAddress(String),

    /// The HTTP listener could not be bound
    #[error("bind callback server: {0}")]
    Bind(String),

    /// The server did not stop within the allotted time
    #[error("callback server shutdown: {0}")]
    Shutdown(String),
}
