//! Sonos device discovery library
//!
//! Finds ZonePlayers on the local network with SSDP and enriches them with
//! the fields of their UPnP device description.
//!
//! # Quick Start
//!
//! ```no_run
//! use sonos_discovery::{discover, enrich_devices, derive_room_name, DiscoveryOptions};
//!
//! let devices = discover(&DiscoveryOptions::default())?;
//! let (devices, _first_error) = enrich_devices(&devices);
//! for device in devices.iter().filter(|d| d.is_sonos) {
//!     println!("{} at {}", derive_room_name(device), device.ip);
//! }
//! # Ok::<(), sonos_discovery::DiscoveryError>(())
//! ```
//!
//! The Sonos classification is a heuristic over SSDP headers and description
//! fields; it can both miss exotic firmware and accept look-alike responders.

mod discovery;
mod error;
mod room;
mod ssdp;
pub mod device;
pub mod enrichment;

use std::collections::HashMap;

pub use device::DeviceMetadata;
pub use discovery::{discover, DiscoveryOptions};
pub use enrichment::{enrich_devices, Enricher, EnrichmentOptions};
pub use error::{DiscoveryError, Result};
pub use room::{derive_room_name, room_matches};
pub use ssdp::{looks_like_sonos_headers, ZONE_PLAYER_SEARCH_TARGET};

/// A UPnP responder found by SSDP.
///
/// Created by [`discover`] and updated in place by enrichment only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Device {
    /// Source address of the SSDP response
    pub ip: String,
    /// Description document URL (LOCATION header)
    pub location: String,
    /// SERVER header
    pub server: String,
    /// Search target the device answered for (ST header)
    pub st: String,
    /// Unique service name, e.g. "uuid:RINCON_000E58A0123456::urn:..."
    pub usn: String,
    /// All response headers, names upper-cased, first value kept
    pub headers: HashMap<String, String>,
    /// Fields from the device description, empty until enriched
    pub metadata: DeviceMetadata,
    /// Whether the device looks like a Sonos player
    pub is_sonos: bool,
}

impl Device {
    /// Key used to deduplicate responses: the USN, or the IP when absent.
    pub fn dedup_key(&self) -> &str {
        if self.usn.is_empty() {
            &self.ip
        } else {
            &self.usn
        }
    }
}
