//! # Sonos SDK
//!
//! Finds Sonos players on the local network, reports what each room is
//! playing and follows one room live over UPnP eventing.
//!
//! ```rust,no_run
//! use sonos_sdk::{logging, SdkConfig, SonosSystem};
//! use sonos_stream::AbsentDisplay;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sonos_sdk::SdkError> {
//!     logging::init_logging_from_env()?;
//!
//!     let config = SdkConfig::new().with_room("Living Room");
//!     let system = tokio::task::spawn_blocking(move || SonosSystem::discover(config))
//!         .await
//!         .expect("discovery task panicked")?;
//!
//!     for status in system.room_statuses() {
//!         println!("{}: {} | {}", status.room, status.state, status.track);
//!     }
//!
//!     system
//!         .listen(Box::new(AbsentDisplay), async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! sonos-sdk (SonosSystem, config, logging)
//!     ↓
//! sonos-stream (Listener: subscription, change tracking, idle detection)
//!     ↓
//! sonos-api (AVTransport queries, GENA)   callback-server (NOTIFY endpoint)
//!     ↓
//! soap-client, sonos-parser, sonos-discovery
//! ```

pub use config::{ListenerSettings, SdkConfig};
pub use error::SdkError;
pub use system::SonosSystem;

pub use sonos_api::RoomStatus;
pub use sonos_discovery::Device;

pub mod config;
pub mod logging;

mod error;
mod system;
