//! Device description enrichment.
//!
//! Fetches each device's description document over HTTP and merges the
//! parsed [`DeviceMetadata`] into the [`Device`]. A failure on one device
//! never stops the batch.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::device::DeviceMetadata;
use crate::error::{DiscoveryError, Result};
use crate::Device;

/// Timing knobs for a batch enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentOptions {
    /// Upper bound on a single description fetch.
    ///
    /// Default: 10 seconds
    pub per_device_timeout: Duration,

    /// Lower bound on the overall batch window. The window is
    /// `per_device_timeout * device_count`, but never less than this.
    ///
    /// Default: 30 seconds
    pub minimum_window: Duration,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            per_device_timeout: Duration::from_secs(10),
            minimum_window: Duration::from_secs(30),
        }
    }
}

impl EnrichmentOptions {
    /// Overall window for a batch of `device_count` devices.
    pub fn window_for(&self, device_count: usize) -> Duration {
        let scaled = self
            .per_device_timeout
            .saturating_mul(u32::try_from(device_count).unwrap_or(u32::MAX));
        scaled.max(self.minimum_window)
    }
}

/// Fetches device description documents.
pub struct Enricher {
    http_client: reqwest::blocking::Client,
}

impl Enricher {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }

    /// Fetch and merge metadata for a single device.
    ///
    /// A device without a location is returned unchanged. The Sonos flag is
    /// only ever raised here, never cleared.
    pub fn enrich_device(&self, device: &Device, timeout: Duration) -> Result<Device> {
        if device.location.is_empty() {
            return Ok(device.clone());
        }

        let metadata = self.fetch_metadata(&device.location, timeout)?;

        let mut enriched = device.clone();
        enriched.is_sonos = enriched.is_sonos || metadata.looks_like_sonos();
        enriched.metadata = metadata;

        debug!(
            ip = %enriched.ip,
            friendly_name = %enriched.metadata.friendly_name,
            is_sonos = enriched.is_sonos,
            "Enriched device"
        );

        Ok(enriched)
    }

    /// Enrich every device, continuing past failures.
    ///
    /// All devices come back in their original order, failed ones
    /// unmodified, together with the first error seen. Once the batch window
    /// is spent the remaining devices are left as they are and a
    /// `DiscoveryError::Timeout` is reported if nothing failed earlier.
    pub fn enrich_devices(
        &self,
        devices: &[Device],
        options: &EnrichmentOptions,
    ) -> (Vec<Device>, Option<DiscoveryError>) {
        let deadline = Instant::now() + options.window_for(devices.len());
        let mut enriched = Vec::with_capacity(devices.len());
        let mut first_error = None;

        for device in devices {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                first_error.get_or_insert(DiscoveryError::Timeout);
                enriched.push(device.clone());
                continue;
            }

            match self.enrich_device(device, options.per_device_timeout.min(remaining)) {
                Ok(updated) => enriched.push(updated),
                Err(e) => {
                    warn!(location = %device.location, error = %e, "Failed to enrich device");
                    first_error.get_or_insert(e);
                    enriched.push(device.clone());
                }
            }
        }

        (enriched, first_error)
    }

    fn fetch_metadata(&self, location: &str, timeout: Duration) -> Result<DeviceMetadata> {
        let response = self
            .http_client
            .get(location)
            .timeout(timeout)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    DiscoveryError::Timeout
                } else {
                    DiscoveryError::NetworkError(format!("Failed to fetch device description: {}", e))
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(DiscoveryError::HttpStatus {
                status: status.as_u16(),
                location: location.to_string(),
            });
        }

        let xml = response
            .text()
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to read description body: {}", e)))?;

        DeviceMetadata::from_xml(&xml)
    }
}

/// Enrich a batch of devices with default timing.
pub fn enrich_devices(devices: &[Device]) -> (Vec<Device>, Option<DiscoveryError>) {
    match Enricher::new() {
        Ok(enricher) => enricher.enrich_devices(devices, &EnrichmentOptions::default()),
        Err(e) => (devices.to_vec(), Some(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_scales_with_device_count() {
        let options = EnrichmentOptions::default();

        assert_eq!(options.window_for(0), Duration::from_secs(30));
        assert_eq!(options.window_for(2), Duration::from_secs(30));
        assert_eq!(options.window_for(5), Duration::from_secs(50));
    }

    #[test]
    fn test_device_without_location_is_unchanged() {
        let enricher = Enricher::new().unwrap();
        let device = Device {
            ip: "192.168.1.40".to_string(),
            usn: "uuid:RINCON_X".to_string(),
            is_sonos: true,
            ..Default::default()
        };

        let enriched = enricher
            .enrich_device(&device, Duration::from_secs(1))
            .unwrap();
        assert_eq!(enriched, device);
    }
}
