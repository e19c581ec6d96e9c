//! SonosSystem - Main entry point for the SDK
//!
//! Discovery, enrichment and status queries are blocking calls with their
//! own deadlines. Only [`SonosSystem::listen`] is async.

use std::future::Future;

use sonos_api::{RoomStatus, SonosClient};
use sonos_discovery::{self, derive_room_name, room_matches, Device, Enricher};
use sonos_stream::{Display, Listener};
use tracing::{info, warn};

use crate::{SdkConfig, SdkError};

/// The Sonos players found on the network
///
/// # Example
///
/// ```rust,no_run
/// use sonos_sdk::{SdkConfig, SonosSystem};
/// use sonos_stream::AbsentDisplay;
///
/// # async fn run() -> Result<(), sonos_sdk::SdkError> {
/// let system = SonosSystem::discover(SdkConfig::new().with_room("Living Room"))?;
///
/// for status in system.room_statuses() {
///     println!("{}: {} | {}", status.room, status.state, status.track);
/// }
///
/// system
///     .listen(Box::new(AbsentDisplay), async {
///         let _ = tokio::signal::ctrl_c().await;
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SonosSystem {
    config: SdkConfig,
    client: SonosClient,
    devices: Vec<Device>,
}

impl SonosSystem {
    /// Discover and enrich the players on the local network.
    ///
    /// Enrichment failures are logged; the affected devices keep their
    /// SSDP-only data. Fails when the configuration is invalid, discovery
    /// itself fails, or nothing answers.
    pub fn discover(config: SdkConfig) -> Result<Self, SdkError> {
        config.validate()?;

        if let Some(room) = config.target_room() {
            info!(room, "filtering to room");
        }

        let devices = sonos_discovery::discover(&config.discovery_options())?;
        if devices.is_empty() {
            return Err(SdkError::NoDevices);
        }
        info!(count = devices.len(), "discovered UPnP responders");

        let enricher = Enricher::new()?;
        let (devices, first_error) =
            enricher.enrich_devices(&devices, &config.enrichment_options());
        if let Some(e) = first_error {
            warn!(error = %e, "failed to enrich all devices");
        }

        Self::from_devices(config, devices)
    }

    /// Build a system from devices discovered elsewhere
    pub fn from_devices(config: SdkConfig, devices: Vec<Device>) -> Result<Self, SdkError> {
        config.validate()?;
        let client = SonosClient::with_timeout(config.control_timeout);

        Ok(Self {
            config,
            client,
            devices,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Every responder, Sonos or not
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Room names of the Sonos players, in device order
    pub fn rooms(&self) -> Vec<String> {
        self.devices
            .iter()
            .filter(|device| device.is_sonos)
            .map(derive_room_name)
            .collect()
    }

    /// Current playback of each Sonos player, restricted to the configured
    /// room when there is one
    pub fn room_statuses(&self) -> Vec<RoomStatus> {
        let (statuses, _) = self
            .client
            .gather_room_statuses(&self.devices, self.config.target_room());
        statuses
    }

    /// First Sonos player in `room`
    pub fn device_for_room(&self, room: &str) -> Result<&Device, SdkError> {
        self.devices
            .iter()
            .filter(|device| device.is_sonos)
            .find(|device| room_matches(&derive_room_name(device), room))
            .ok_or_else(|| SdkError::RoomNotFound(room.trim().to_string()))
    }

    /// Follow the configured room until `cancel` resolves.
    ///
    /// Must run inside a Tokio runtime.
    pub async fn listen<F>(&self, display: Box<dyn Display + Send>, cancel: F) -> Result<(), SdkError>
    where
        F: Future<Output = ()>,
    {
        let room = self.config.target_room().ok_or_else(|| {
            SdkError::Configuration("a room is required to listen for events".to_string())
        })?;
        let device = self.device_for_room(room)?;

        let mut listener = Listener::new(self.config.listener_config())?
            .with_client(self.client.clone())
            .with_display(display);

        listener.run(device, &derive_room_name(device), cancel).await?;
        Ok(())
    }
}
