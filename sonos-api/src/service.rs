/// UPnP services used by this crate
///
/// Sonos players expose more services than these; only the ones the
/// control and eventing paths talk to are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// AVTransport service - Playback state and current track
    AVTransport,
}

/// Contains the endpoint and service URI information for a UPnP service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// The HTTP control endpoint path for this service (relative to device base URL)
    pub endpoint: &'static str,

    /// The UPnP service URI used in SOAP requests
    pub service_uri: &'static str,

    /// The HTTP event endpoint path for UPnP event subscriptions
    pub event_endpoint: &'static str,

    /// Short lower-case name used in error messages
    pub name: &'static str,
}

impl Service {
    /// Get the service information (endpoint and URI) for this service
    pub fn info(&self) -> ServiceInfo {
        match self {
            Service::AVTransport => ServiceInfo {
                endpoint: "MediaRenderer/AVTransport/Control",
                service_uri: "urn:schemas-upnp-org:service:AVTransport:1",
                event_endpoint: "MediaRenderer/AVTransport/Event",
                name: "avtransport",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_av_transport_info() {
        let info = Service::AVTransport.info();
        assert_eq!(info.endpoint, "MediaRenderer/AVTransport/Control");
        assert_eq!(info.event_endpoint, "MediaRenderer/AVTransport/Event");
        assert_eq!(info.service_uri, "urn:schemas-upnp-org:service:AVTransport:1");
    }
}
