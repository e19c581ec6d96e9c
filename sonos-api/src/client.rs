use std::time::Duration;

use soap_client::SoapClient;
use sonos_discovery::{derive_room_name, room_matches, Device};
use sonos_parser::{parse_track_metadata, TrackInfo};
use tracing::{debug, info, warn};

use crate::endpoint;
use crate::format::{format_state_display, format_track_display};
use crate::operations::av_transport::{
    GetPositionInfoOperation, GetPositionInfoRequest, GetTransportInfoOperation,
    GetTransportInfoRequest,
};
use crate::{ApiError, Result, RoomStatus, Service, SonosOperation, Subscription};

/// A client for executing Sonos operations against actual devices
///
/// This client bridges the stateless operation definitions and the network
/// requests to Sonos speakers. Every request is bounded by the timeout of
/// the underlying [`SoapClient`] (5 seconds by default).
#[derive(Debug, Clone, Default)]
pub struct SonosClient {
    soap_client: SoapClient,
}

impl SonosClient {
    /// Create a new Sonos client with the default request timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client whose control and subscription requests are bounded
    /// by `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_soap_client(SoapClient::with_timeout(timeout))
    }

    /// Create a Sonos client with a custom SOAP client
    pub fn with_soap_client(soap_client: SoapClient) -> Self {
        Self { soap_client }
    }

    /// Execute a Sonos operation against a device
    ///
    /// The control URL is derived from the device's description location.
    pub fn execute<Op: SonosOperation>(
        &self,
        device: &Device,
        request: &Op::Request,
    ) -> Result<Op::Response> {
        let service_info = Op::SERVICE.info();
        let url = endpoint::control_url(&device.location, Op::SERVICE)?;
        let payload = Op::build_payload(request);

        let xml = self
            .soap_client
            .call(&url, service_info.service_uri, Op::ACTION, &payload)
            .map_err(|e| ApiError::from_soap(service_info.name, e))?;

        Op::parse_response(&xml)
    }

    /// Query the track currently playing on a device.
    ///
    /// The transport state is fetched with a second request; if that one
    /// fails the state is left empty.
    pub fn now_playing(&self, device: &Device) -> Result<TrackInfo> {
        debug!(ip = %device.ip, location = %device.location, "querying now playing");

        let position =
            self.execute::<GetPositionInfoOperation>(device, &GetPositionInfoRequest::default())?;
        let mut info = parse_track_metadata(&position.track_metadata, &position.track_uri)?;

        match self.execute::<GetTransportInfoOperation>(device, &GetTransportInfoRequest::default()) {
            Ok(transport) => info.state = transport.current_transport_state,
            Err(e) => debug!(ip = %device.ip, error = %e, "transport state fetch failed"),
        }

        Ok(info)
    }

    /// Summarise playback for each Sonos device, optionally restricted to
    /// `target_room`.
    ///
    /// Returns the statuses in input order together with the first device
    /// whose room matches `target_room`.
    pub fn gather_room_statuses(
        &self,
        devices: &[Device],
        target_room: Option<&str>,
    ) -> (Vec<RoomStatus>, Option<Device>) {
        let target_room = target_room.map(str::trim).filter(|r| !r.is_empty());
        let mut statuses = Vec::with_capacity(devices.len());
        let mut target_device = None;

        for device in devices {
            if !device.is_sonos {
                info!(ip = %device.ip, server = %device.server, "ignoring non-Sonos responder");
                continue;
            }

            let room = derive_room_name(device);
            if let Some(target) = target_room {
                if !room_matches(&room, target) {
                    continue;
                }
                if target_device.is_none() {
                    target_device = Some(device.clone());
                }
            }

            statuses.push(self.room_status(device, room));
        }

        (statuses, target_device)
    }

    fn room_status(&self, device: &Device, room: String) -> RoomStatus {
        let info = match self.now_playing(device) {
            Ok(info) => info,
            Err(e) => {
                warn!(room = %room, error = %e, "now playing failed");
                return RoomStatus::unavailable(room);
            }
        };

        let mut track = format_track_display(&info);
        if track.is_empty() {
            track = RoomStatus::IDLE_TRACK.to_string();
        }
        let mut state = format_state_display(&info.state);
        if state.is_empty() {
            state = RoomStatus::UNKNOWN_STATE.to_string();
        }

        RoomStatus { room, state, track }
    }

    /// Subscribe `callback_url` to AVTransport events of `device`.
    ///
    /// A zero `timeout` requests the default 30 minute lease.
    pub fn subscribe_av_transport(
        &self,
        device: &Device,
        callback_url: &str,
        timeout: Duration,
    ) -> Result<Subscription> {
        let event_url = endpoint::event_url(&device.location, Service::AVTransport)?;
        let response = self.soap_client.subscribe(&event_url, callback_url, timeout)?;

        Ok(Subscription {
            sid: response.sid,
            timeout: response.timeout,
            event_url,
        })
    }

    /// Renew `subscription` and record the lease the device granted.
    ///
    /// See [`Subscription::renewal_request`] for the lease that is asked for.
    pub fn renew_subscription(
        &self,
        subscription: &mut Subscription,
        timeout: Duration,
    ) -> Result<Duration> {
        let requested = subscription.renewal_request(timeout);
        let granted = self.soap_client.renew_subscription(
            &subscription.event_url,
            &subscription.sid,
            requested,
        )?;
        subscription.timeout = granted;
        Ok(granted)
    }

    /// Cancel `subscription`
    pub fn unsubscribe(&self, subscription: &Subscription) -> Result<()> {
        self.soap_client
            .unsubscribe(&subscription.event_url, &subscription.sid)?;
        Ok(())
    }
}
