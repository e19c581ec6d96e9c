//! Generic UPnP callback server for receiving event notifications.
//!
//! This crate provides a lightweight HTTP server for handling UPnP NOTIFY
//! requests. It has no knowledge of device-specific payloads: the consuming
//! crate supplies a [`NotifyDecoder`] and receives decoded events from a
//! bounded channel.
//!
//! # Overview
//!
//! - [`CallbackServer`]: binds an ephemeral port on a chosen local address and
//!   accepts `NOTIFY` on one callback path (404 elsewhere, 405 for other
//!   methods).
//! - [`EventRouter`]: decodes each body and queues the event with
//!   `try_send`, dropping it when the queue is full.
//! - [`local_ip_for`]: picks the local address a device can reach us on.

pub mod error;
pub mod router;
mod server;

pub use error::CallbackError;
pub use router::{EventRouter, NotifyDecoder, RouteOutcome};
pub use server::{local_ip_for, CallbackServer, DEFAULT_CALLBACK_PATH};
