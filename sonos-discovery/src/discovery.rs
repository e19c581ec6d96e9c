//! The SSDP discovery loop.
//!
//! Sends the search request, then reads unicast responses until the overall
//! deadline passes or no new response has arrived for the quiet period.
//! Responses are deduplicated by USN (falling back to IP), with the most
//! recent advertisement winning.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::room::room_matches;
use crate::ssdp::{parse_ssdp_response, send_search_requests, SSDP_MULTICAST_ADDR, ZONE_PLAYER_SEARCH_TARGET};
use crate::Device;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Options for a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Overall deadline. A zero value falls back to the default.
    ///
    /// Default: 3 seconds
    pub timeout: Duration,

    /// Stop as soon as a response advertises this room.
    ///
    /// Default: None
    pub target_room: Option<String>,

    /// ST header of the search request.
    ///
    /// Default: `urn:schemas-upnp-org:device:ZonePlayer:1`
    pub search_target: String,

    /// Upper bound on a single socket read.
    ///
    /// Default: 250 milliseconds
    pub read_timeout: Duration,

    /// Silence after the last response that ends the run early.
    ///
    /// Default: 1 second
    pub quiet_period: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            target_room: None,
            search_target: ZONE_PLAYER_SEARCH_TARGET.to_string(),
            read_timeout: Duration::from_millis(250),
            quiet_period: Duration::from_secs(1),
        }
    }
}

impl DiscoveryOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    pub fn target_room(mut self, room: impl Into<String>) -> Self {
        self.target_room = Some(room.into());
        self
    }

    fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }
}

/// Accumulates responses, keyed by USN or IP.
#[derive(Debug, Default)]
struct ResponseCollector {
    devices: HashMap<String, Device>,
}

impl ResponseCollector {
    fn insert(&mut self, device: Device) {
        self.devices.insert(device.dedup_key().to_string(), device);
    }

    fn into_sorted(self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.devices.into_values().collect();
        devices.sort_by(|a, b| a.ip.cmp(&b.ip).then_with(|| a.location.cmp(&b.location)));
        devices
    }
}

/// Run SSDP discovery on the local network.
///
/// # Errors
///
/// Fails if the socket cannot be created, the search cannot be sent, or a
/// read fails for a reason other than a timeout. Malformed responses are
/// ignored.
pub fn discover(options: &DiscoveryOptions) -> Result<Vec<Device>> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .map_err(|e| DiscoveryError::NetworkError(format!("Failed to bind UDP socket: {}", e)))?;

    let target = SSDP_MULTICAST_ADDR
        .to_socket_addrs()
        .map_err(|e| DiscoveryError::NetworkError(format!("Invalid SSDP address: {}", e)))?
        .next()
        .ok_or_else(|| DiscoveryError::NetworkError("Invalid SSDP address".to_string()))?;

    discover_via(&socket, target, options)
}

/// Discovery against an explicit search destination.
pub(crate) fn discover_via(
    socket: &UdpSocket,
    target: SocketAddr,
    options: &DiscoveryOptions,
) -> Result<Vec<Device>> {
    send_search_requests(socket, target, &options.search_target)?;

    let deadline = Instant::now() + options.effective_timeout();
    let mut collector = ResponseCollector::default();
    let mut last_response: Option<Instant> = None;
    let mut buffer = [0u8; 2048];

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }

        let read_timeout = options.read_timeout.min(deadline - now);
        socket
            .set_read_timeout(Some(read_timeout))
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to set read timeout: {}", e)))?;

        let (size, source) = match socket.recv_from(&mut buffer) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                if last_response.is_some_and(|at| at.elapsed() >= options.quiet_period) {
                    break;
                }
                continue;
            }
            Err(e) => {
                return Err(DiscoveryError::NetworkError(format!("Failed to read SSDP response: {}", e)));
            }
        };

        let Ok(text) = std::str::from_utf8(&buffer[..size]) else {
            continue;
        };
        let Some(mut device) = parse_ssdp_response(text) else {
            continue;
        };
        device.ip = source.ip().to_string();

        debug!(
            ip = %device.ip,
            location = %device.location,
            usn = %device.usn,
            is_sonos = device.is_sonos,
            "SSDP response"
        );

        if let Some(target_room) = options.target_room.as_deref() {
            if advertises_room(&device, target_room) {
                debug!(room = target_room, ip = %device.ip, "Target room answered, stopping discovery");
                return Ok(vec![device]);
            }
        }

        collector.insert(device);
        last_response = Some(Instant::now());
    }

    Ok(collector.into_sorted())
}

fn advertises_room(device: &Device, target_room: &str) -> bool {
    ["FRIENDLYNAME", "ROOMNAME"].iter().any(|name| {
        device
            .headers
            .get(*name)
            .is_some_and(|value| room_matches(value, target_room))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn response(usn: &str, location: &str, extra: &str) -> String {
        let usn_line = if usn.is_empty() {
            String::new()
        } else {
            format!("USN: {}\r\n", usn)
        };
        format!(
            "HTTP/1.1 200 OK\r\n\
             LOCATION: {}\r\n\
             SERVER: Linux UPnP/1.0 Sonos/58.1-74220 (ZP90)\r\n\
             ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
             {}{}\r\n",
            location, usn_line, extra
        )
    }

    /// Answers the first search datagram with `responses`, in order.
    fn spawn_responder(responses: Vec<String>) -> (SocketAddr, thread::JoinHandle<()>) {
        let responder = UdpSocket::bind("127.0.0.1:0").unwrap();
        responder
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let addr = responder.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut buf = [0u8; 1024];
            let (_, client) = responder.recv_from(&mut buf).unwrap();
            for response in responses {
                responder.send_to(response.as_bytes(), client).unwrap();
            }
        });

        (addr, handle)
    }

    fn fast_options() -> DiscoveryOptions {
        DiscoveryOptions {
            timeout: Duration::from_secs(3),
            read_timeout: Duration::from_millis(50),
            quiet_period: Duration::from_millis(200),
            ..Default::default()
        }
    }

    #[test]
    fn test_dedup_by_usn_keeps_latest_advertisement() {
        let (addr, handle) = spawn_responder(vec![
            response("uuid:RINCON_B", "http://127.0.0.1:1400/b_old.xml", ""),
            response("uuid:RINCON_A", "http://127.0.0.1:1400/a.xml", ""),
            "HTTP/1.1 500 Internal Server Error\r\n\r\n".to_string(),
            response("uuid:RINCON_B", "http://127.0.0.1:1400/b_new.xml", ""),
            response("", "http://127.0.0.1:1400/c.xml", ""),
        ]);

        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let devices = discover_via(&socket, addr, &fast_options()).unwrap();
        handle.join().unwrap();

        let locations: Vec<&str> = devices.iter().map(|d| d.location.as_str()).collect();
        assert_eq!(
            locations,
            vec![
                "http://127.0.0.1:1400/a.xml",
                "http://127.0.0.1:1400/b_new.xml",
                "http://127.0.0.1:1400/c.xml",
            ]
        );
        assert!(devices.iter().all(|d| d.ip == "127.0.0.1"));
        assert!(devices.iter().all(|d| d.is_sonos));
    }

    #[test]
    fn test_same_usn_from_new_address_replaces_old() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let moved = UdpSocket::bind("127.0.0.2:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut buf = [0u8; 1024];
            let (_, client) = listener.recv_from(&mut buf).unwrap();
            let old = response("uuid:RINCON_B", "http://127.0.0.1:1400/b.xml", "");
            let new = response("uuid:RINCON_B", "http://127.0.0.2:1400/b.xml", "");
            listener.send_to(old.as_bytes(), client).unwrap();
            thread::sleep(Duration::from_millis(20));
            moved.send_to(new.as_bytes(), client).unwrap();
        });

        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let devices = discover_via(&socket, addr, &fast_options()).unwrap();
        handle.join().unwrap();

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip, "127.0.0.2");
        assert_eq!(devices[0].location, "http://127.0.0.2:1400/b.xml");
    }

    #[test]
    fn test_quiet_period_ends_discovery_early() {
        let (addr, handle) = spawn_responder(vec![response(
            "uuid:RINCON_A",
            "http://127.0.0.1:1400/a.xml",
            "",
        )]);

        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let options = DiscoveryOptions {
            timeout: Duration::from_secs(10),
            ..fast_options()
        };

        let started = Instant::now();
        let devices = discover_via(&socket, addr, &options).unwrap();
        let elapsed = started.elapsed();
        handle.join().unwrap();

        assert_eq!(devices.len(), 1);
        assert!(elapsed >= options.quiet_period);
        assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
    }

    #[test]
    fn test_target_room_returns_early() {
        let (addr, handle) = spawn_responder(vec![
            response("uuid:RINCON_A", "http://127.0.0.1:1400/a.xml", "ROOMNAME: Office\r\n"),
            response("uuid:RINCON_K", "http://127.0.0.1:1400/k.xml", "ROOMNAME:  kitchen \r\n"),
        ]);

        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let options = DiscoveryOptions {
            timeout: Duration::from_secs(10),
            ..fast_options()
        }
        .target_room("Kitchen");

        let started = Instant::now();
        let devices = discover_via(&socket, addr, &options).unwrap();
        handle.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].usn, "uuid:RINCON_K");
    }

    #[test]
    fn test_no_responses_runs_to_deadline() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let options = DiscoveryOptions {
            timeout: Duration::from_millis(300),
            ..fast_options()
        };

        let started = Instant::now();
        let devices = discover_via(&socket, silent.local_addr().unwrap(), &options).unwrap();
        assert!(devices.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let options = DiscoveryOptions::with_timeout(Duration::ZERO);
        assert_eq!(options.effective_timeout(), Duration::from_secs(3));
    }
}
