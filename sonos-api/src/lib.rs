//! High-level Sonos API for device control and eventing
//!
//! This crate turns discovered [`Device`](sonos_discovery::Device)s into
//! AVTransport queries and GENA subscriptions. It uses the private
//! `soap-client` crate for the wire protocol and `sonos-parser` for track
//! metadata.
//!
//! ```rust,no_run
//! use sonos_api::SonosClient;
//! use sonos_discovery::{discover, DiscoveryOptions};
//!
//! let devices = discover(&DiscoveryOptions::default())?;
//! let client = SonosClient::new();
//! let (statuses, _) = client.gather_room_statuses(&devices, None);
//! for status in &statuses {
//!     println!("{}: {} | {}", status.room, status.state, status.track);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod art;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod format;
pub mod operation;
pub mod operations;
pub mod service;
pub mod status;
pub mod subscription;

pub use art::resolve_album_art_url;
pub use client::SonosClient;
pub use error::{ApiError, Result};
pub use format::{format_state_display, format_track_display, should_skip_display, track_signature};
pub use operation::SonosOperation;
pub use service::{Service, ServiceInfo};
pub use status::RoomStatus;
pub use subscription::{Subscription, DEFAULT_SUBSCRIPTION_TIMEOUT};
