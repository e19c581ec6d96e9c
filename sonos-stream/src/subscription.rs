//! AVTransport subscription lifecycle on the async side
//!
//! GENA requests are blocking calls on [`SonosClient`]. They run on the
//! blocking pool with an explicit deadline so a hung device can delay the
//! listener loop by at most that long.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use callback_server::{local_ip_for, NotifyDecoder};
use sonos_api::{SonosClient, Subscription};
use sonos_discovery::Device;
use sonos_parser::{AVTransportEvent, ParseError};
use tracing::debug;
use url::{Host, Url};

use crate::error::{Result, StreamError};

/// Port Sonos players serve UPnP on
pub const DEFAULT_DEVICE_PORT: u16 = 1400;

/// Decodes NOTIFY bodies into [`AVTransportEvent`]s for the callback server
#[derive(Debug, Clone, Copy, Default)]
pub struct AvTransportDecoder;

impl NotifyDecoder for AvTransportDecoder {
    type Event = AVTransportEvent;
    type Error = ParseError;

    fn decode(&self, body: &str) -> std::result::Result<AVTransportEvent, ParseError> {
        AVTransportEvent::from_xml(body)
    }
}

/// Address the device is reached at: its IP (or the Location host when the
/// IP is unknown) and the Location port, else [`DEFAULT_DEVICE_PORT`].
pub fn callback_target(device: &Device) -> Result<SocketAddr> {
    let mut host = device.ip.trim().to_string();
    let mut port = DEFAULT_DEVICE_PORT;

    if let Ok(location) = Url::parse(device.location.trim()) {
        if host.is_empty() {
            host = match location.host() {
                Some(Host::Ipv4(ip)) => ip.to_string(),
                Some(Host::Ipv6(ip)) => ip.to_string(),
                Some(Host::Domain(name)) => name.to_string(),
                None => String::new(),
            };
        }
        if let Some(location_port) = location.port() {
            port = location_port;
        }
    }

    if host.is_empty() {
        return Err(StreamError::Configuration(
            "determine local callback address: device IP unknown".to_string(),
        ));
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    (host.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| StreamError::Configuration(format!("resolve {host}: {e}")))?
        .next()
        .ok_or_else(|| StreamError::Configuration(format!("resolve {host}: no addresses")))
}

/// Local IP the device can send NOTIFY requests back to
pub fn callback_ip(device: &Device) -> Result<IpAddr> {
    let target = callback_target(device)?;
    let ip = local_ip_for(target)?;
    debug!(%target, %ip, "resolved callback address");
    Ok(ip)
}

/// A live AVTransport subscription and the client that manages it.
///
/// Owned by one listener; [`unsubscribe`](Self::unsubscribe) consumes it.
#[derive(Debug)]
pub struct AvTransportSubscription {
    client: SonosClient,
    subscription: Subscription,
}

impl AvTransportSubscription {
    /// Subscribe `callback_url` to AVTransport events of `device`,
    /// requesting `lease`.
    pub async fn subscribe(
        client: &SonosClient,
        device: &Device,
        callback_url: &str,
        lease: Duration,
        deadline: Duration,
    ) -> Result<Self> {
        let task_client = client.clone();
        let device = device.clone();
        let callback_url = callback_url.to_string();

        let subscription = run_blocking("subscribe", deadline, move || {
            task_client.subscribe_av_transport(&device, &callback_url, lease)
        })
        .await?;

        Ok(Self {
            client: client.clone(),
            subscription,
        })
    }

    pub fn sid(&self) -> &str {
        &self.subscription.sid
    }

    /// Lease most recently granted by the device
    pub fn lease(&self) -> Duration {
        self.subscription.timeout
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Renew the lease, asking for `requested` (zero asks for the current
    /// lease). Returns the lease the device granted.
    pub async fn renew(&mut self, requested: Duration, deadline: Duration) -> Result<Duration> {
        let client = self.client.clone();
        let mut subscription = self.subscription.clone();

        let renewed = run_blocking("renew", deadline, move || {
            client
                .renew_subscription(&mut subscription, requested)
                .map(|_| subscription)
        })
        .await?;

        self.subscription = renewed;
        Ok(self.subscription.timeout)
    }

    /// Cancel the subscription
    pub async fn unsubscribe(self, deadline: Duration) -> Result<()> {
        let Self {
            client,
            subscription,
        } = self;
        run_blocking("unsubscribe", deadline, move || client.unsubscribe(&subscription)).await
    }
}

async fn run_blocking<T, F>(what: &'static str, deadline: Duration, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> sonos_api::Result<T> + Send + 'static,
{
    match tokio::time::timeout(deadline, tokio::task::spawn_blocking(call)).await {
        Ok(Ok(result)) => result.map_err(StreamError::from),
        Ok(Err(e)) => Err(StreamError::Subscription(format!("{what} task failed: {e}"))),
        Err(_) => Err(StreamError::Subscription(format!(
            "{what} timed out after {deadline:?}"
        ))),
    }
}
