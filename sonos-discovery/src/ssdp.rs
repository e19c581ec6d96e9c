//! SSDP (Simple Service Discovery Protocol) wire handling.
//!
//! Builds the M-SEARCH datagram, sends it, and turns unicast search responses
//! into [`Device`] records. Responses that are not `HTTP/1.1 200` are dropped
//! here and never reach the discovery loop.

use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::error::{DiscoveryError, Result};
use crate::Device;

/// Well-known SSDP multicast group and port.
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Search target used for Sonos speakers.
pub const ZONE_PLAYER_SEARCH_TARGET: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

/// Number of times the search datagram is sent. UDP gives no delivery
/// guarantee and players occasionally miss a single request.
const SEARCH_REPEAT: usize = 3;

const WRITE_TIMEOUT: Duration = Duration::from_millis(250);

/// Render the M-SEARCH request for a search target.
pub(crate) fn search_request(search_target: &str) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: 1\r\n\
         ST: {}\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR, search_target
    )
}

/// Send the search request to `target` several times.
pub(crate) fn send_search_requests(
    socket: &UdpSocket,
    target: SocketAddr,
    search_target: &str,
) -> Result<()> {
    let payload = search_request(search_target);

    socket
        .set_write_timeout(Some(WRITE_TIMEOUT))
        .map_err(|e| DiscoveryError::NetworkError(format!("Failed to set write timeout: {}", e)))?;

    for _ in 0..SEARCH_REPEAT {
        socket
            .send_to(payload.as_bytes(), target)
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to send M-SEARCH: {}", e)))?;
    }

    Ok(())
}

/// Parse a search response datagram.
///
/// Returns `None` unless the status line starts with `HTTP/1.1 200`. Header
/// names are upper-cased; when a header repeats, the first value is kept.
/// The returned device has no IP yet, the caller fills it from the UDP
/// source address.
pub(crate) fn parse_ssdp_response(response: &str) -> Option<Device> {
    let mut lines = response.lines();

    let status_line = lines.next()?.trim();
    if !status_line.to_ascii_uppercase().starts_with("HTTP/1.1 200") {
        return None;
    }

    let mut headers: HashMap<String, String> = HashMap::new();
    for line in lines {
        if line.trim().is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_uppercase();
        if name.is_empty() {
            continue;
        }
        headers
            .entry(name)
            .or_insert_with(|| value.trim().to_string());
    }

    let header = |name: &str| headers.get(name).cloned().unwrap_or_default();

    let mut device = Device {
        location: header("LOCATION"),
        server: header("SERVER"),
        st: header("ST"),
        usn: header("USN"),
        ..Device::default()
    };
    device.headers = headers;
    device.is_sonos = looks_like_sonos_headers(&device);

    Some(device)
}

/// Header-based Sonos heuristic.
///
/// This is approximate: any responder whose SERVER mentions Sonos, whose ST
/// mentions Sonos or ZonePlayer, or whose USN carries a RINCON identifier is
/// accepted. Enrichment may later confirm a device the headers missed.
pub fn looks_like_sonos_headers(device: &Device) -> bool {
    let server = device.server.to_lowercase();
    if server.contains("sonos") {
        return true;
    }

    let st = device.st.to_lowercase();
    if st.contains("sonos") || st.contains("zoneplayer") {
        return true;
    }

    device.usn.to_lowercase().contains("rincon")
}
