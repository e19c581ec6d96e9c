//! SDK configuration
//!
//! [`SdkConfig`] deserializes from any serde format; every field is
//! optional and falls back to its default. Durations are given in whole
//! seconds.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use sonos_discovery::{DiscoveryOptions, EnrichmentOptions};
use sonos_stream::ListenerConfig;

use crate::error::SdkError;

/// Configuration for [`SonosSystem`](crate::SonosSystem)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Room to report on and follow; all rooms when unset
    /// Default: None
    pub room: Option<String>,

    /// Display brightness in percent, passed to hardware back ends
    /// Default: None (back end default)
    pub brightness: Option<u32>,

    /// How long SSDP discovery listens for answers
    /// Default: 8 seconds
    #[serde(rename = "discovery_timeout_secs", deserialize_with = "seconds")]
    pub discovery_timeout: Duration,

    /// Description fetch timeout per device
    /// Default: 10 seconds
    #[serde(rename = "enrichment_timeout_secs", deserialize_with = "seconds")]
    pub enrichment_timeout: Duration,

    /// Lower bound on the overall enrichment window
    /// Default: 30 seconds
    #[serde(rename = "enrichment_min_window_secs", deserialize_with = "seconds")]
    pub enrichment_min_window: Duration,

    /// Timeout for each SOAP and GENA request
    /// Default: 5 seconds
    #[serde(rename = "control_timeout_secs", deserialize_with = "seconds")]
    pub control_timeout: Duration,

    pub listener: ListenerSettings,
}

/// Listener settings exposed through [`SdkConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListenerSettings {
    /// Default: "/sonos/events"
    pub callback_path: String,

    /// Default: 1800 seconds
    #[serde(rename = "subscription_timeout_secs", deserialize_with = "seconds")]
    pub subscription_timeout: Duration,

    /// Default: 600 seconds
    #[serde(rename = "idle_timeout_secs", deserialize_with = "seconds")]
    pub idle_timeout: Duration,

    /// Default: 16
    pub event_buffer_size: usize,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            room: None,
            brightness: None,
            discovery_timeout: Duration::from_secs(8),
            enrichment_timeout: Duration::from_secs(10),
            enrichment_min_window: Duration::from_secs(30),
            control_timeout: Duration::from_secs(5),
            listener: ListenerSettings::default(),
        }
    }
}

impl Default for ListenerSettings {
    fn default() -> Self {
        let defaults = ListenerConfig::default();
        Self {
            callback_path: defaults.callback_path,
            subscription_timeout: defaults.subscription_timeout,
            idle_timeout: defaults.idle_timeout,
            event_buffer_size: defaults.event_buffer_size,
        }
    }
}

impl SdkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), SdkError> {
        if let Some(brightness) = self.brightness {
            if !(1..=100).contains(&brightness) {
                return Err(SdkError::Configuration(format!(
                    "brightness must be between 1 and 100, got {}",
                    brightness
                )));
            }
        }

        if self.discovery_timeout.is_zero() {
            return Err(SdkError::Configuration(
                "discovery timeout must be greater than 0".to_string(),
            ));
        }

        if self.enrichment_timeout.is_zero() || self.control_timeout.is_zero() {
            return Err(SdkError::Configuration(
                "enrichment and control timeouts must be greater than 0".to_string(),
            ));
        }

        self.listener_config()
            .validate()
            .map_err(|e| SdkError::Configuration(e.to_string()))
    }

    /// Target room, trimmed; `None` when unset or blank
    pub fn target_room(&self) -> Option<&str> {
        self.room.as_deref().map(str::trim).filter(|room| !room.is_empty())
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        let options = DiscoveryOptions::with_timeout(self.discovery_timeout);
        match self.target_room() {
            Some(room) => options.target_room(room),
            None => options,
        }
    }

    pub fn enrichment_options(&self) -> EnrichmentOptions {
        EnrichmentOptions {
            per_device_timeout: self.enrichment_timeout,
            minimum_window: self.enrichment_min_window,
        }
    }

    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig::new()
            .with_callback_path(self.listener.callback_path.clone())
            .with_subscription_timeout(self.listener.subscription_timeout)
            .with_idle_timeout(self.listener.idle_timeout)
            .with_buffer_size(self.listener.event_buffer_size)
            .with_request_timeouts(self.control_timeout, self.control_timeout)
    }

    /// Builder pattern methods for fluent configuration

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn with_brightness(mut self, brightness: u32) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.listener.idle_timeout = timeout;
        self
    }
}

fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}
