//! # sonos-stream
//!
//! Live AVTransport events for a single Sonos player.
//!
//! A [`Listener`] binds a callback server, subscribes to the player's
//! AVTransport service and keeps the subscription alive until it is
//! cancelled. Each event is reduced to the state and track line a user
//! would see; only real changes are logged and, when the track carries
//! album art, fetched and handed to a [`Display`]. When the player stays out
//! of `Playing` for the configured idle time the display is cleared.
//!
//! ```rust,no_run
//! use sonos_stream::{Listener, ListenerConfig};
//! # async fn follow(device: sonos_discovery::Device) -> sonos_stream::Result<()> {
//! let mut listener = Listener::new(ListenerConfig::default())?;
//! listener
//!     .run(&device, "Living Room", async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! # }
//! ```

pub mod art;
pub mod config;
pub mod display;
pub mod error;
pub mod listener;
pub mod subscription;
pub mod tracker;

pub use art::{ArtFetcher, HttpArtFetcher};
pub use config::ListenerConfig;
pub use display::{AbsentDisplay, AlbumArt, Display, DisplayError};
pub use error::{Result, StreamError};
pub use listener::Listener;
pub use subscription::{callback_ip, callback_target, AvTransportDecoder, AvTransportSubscription};
pub use tracker::{renewal_interval, Decision, Observation, PlaybackTracker};
