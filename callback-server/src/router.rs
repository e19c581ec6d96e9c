//! Event routing for HTTP callback notifications.
//!
//! The [`EventRouter`] turns a NOTIFY body into a typed event with a
//! [`NotifyDecoder`] and hands it to a bounded channel without waiting. The
//! HTTP layer never blocks on a slow consumer: when the channel is full the
//! new event is dropped.

use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Decodes a raw NOTIFY body into an event.
///
/// Implemented by the consuming crate; this crate has no knowledge of the
/// payload format.
pub trait NotifyDecoder: Send + Sync + 'static {
    type Event: Send + 'static;
    type Error: Display;

    fn decode(&self, body: &str) -> Result<Self::Event, Self::Error>;
}

/// What happened to one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Decoded and queued for the consumer
    Queued,
    /// Decoded, but the queue was full
    Dropped,
    /// Decoded, but the consumer has gone away
    Closed,
    /// The body could not be decoded
    Undecodable,
}

/// Routes decoded events from HTTP callbacks to a bounded channel.
pub struct EventRouter<D: NotifyDecoder> {
    decoder: Arc<D>,
    event_sender: mpsc::Sender<D::Event>,
}

impl<D: NotifyDecoder> Clone for EventRouter<D> {
    fn clone(&self) -> Self {
        Self {
            decoder: Arc::clone(&self.decoder),
            event_sender: self.event_sender.clone(),
        }
    }
}

impl<D: NotifyDecoder> EventRouter<D> {
    /// Create a new event router.
    ///
    /// # Example
    ///
    /// ```
    /// use tokio::sync::mpsc;
    /// use callback_server::router::{EventRouter, NotifyDecoder};
    ///
    /// struct Raw;
    ///
    /// impl NotifyDecoder for Raw {
    ///     type Event = String;
    ///     type Error = std::convert::Infallible;
    ///
    ///     fn decode(&self, body: &str) -> Result<String, Self::Error> {
    ///         Ok(body.to_string())
    ///     }
    /// }
    ///
    /// let (tx, _rx) = mpsc::channel::<String>(16);
    /// let router = EventRouter::new(Raw, tx);
    /// ```
    pub fn new(decoder: D, event_sender: mpsc::Sender<D::Event>) -> Self {
        Self {
            decoder: Arc::new(decoder),
            event_sender,
        }
    }

    /// Decode `body` and try to queue the result.
    ///
    /// `sid` is only used for logging.
    pub fn route(&self, sid: Option<&str>, body: &str) -> RouteOutcome {
        let sid = sid.unwrap_or("-");

        let event = match self.decoder.decode(body) {
            Ok(event) => event,
            Err(e) => {
                warn!(sid, error = %e, "failed to decode event notification");
                debug!(sid, payload = body, "undecodable notification payload");
                return RouteOutcome::Undecodable;
            }
        };

        match self.event_sender.try_send(event) {
            Ok(()) => RouteOutcome::Queued,
            Err(TrySendError::Full(_)) => {
                warn!(sid, "dropping event notification: queue full");
                RouteOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                debug!(sid, "event receiver closed; notification discarded");
                RouteOutcome::Closed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl NotifyDecoder for Upper {
        type Event = String;
        type Error = String;

        fn decode(&self, body: &str) -> Result<String, String> {
            if body.is_empty() {
                Err("empty body".to_string())
            } else {
                Ok(body.to_uppercase())
            }
        }
    }

    #[tokio::test]
    async fn test_route_queues_decoded_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let router = EventRouter::new(Upper, tx);

        assert_eq!(router.route(Some("uuid:sub-1"), "<event/>"), RouteOutcome::Queued);
        assert_eq!(rx.recv().await.unwrap(), "<EVENT/>");
    }

    #[tokio::test]
    async fn test_route_drops_newest_when_full() {
        let (tx, mut rx) = mpsc::channel(2);
        let router = EventRouter::new(Upper, tx);

        assert_eq!(router.route(None, "a"), RouteOutcome::Queued);
        assert_eq!(router.route(None, "b"), RouteOutcome::Queued);
        assert_eq!(router.route(None, "c"), RouteOutcome::Dropped);

        assert_eq!(rx.recv().await.unwrap(), "A");
        assert_eq!(rx.recv().await.unwrap(), "B");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_route_undecodable_is_not_queued() {
        let (tx, mut rx) = mpsc::channel(2);
        let router = EventRouter::new(Upper, tx);

        assert_eq!(router.route(Some("uuid:sub-1"), ""), RouteOutcome::Undecodable);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_route_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel(2);
        let router = EventRouter::new(Upper, tx);
        drop(rx);

        assert_eq!(router.route(None, "a"), RouteOutcome::Closed);
    }
}
