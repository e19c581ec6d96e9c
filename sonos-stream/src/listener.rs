//! The AVTransport listener loop
//!
//! A [`Listener`] follows one player:
//!
//! 1. bind a callback server on the local address the player can reach
//! 2. subscribe to AVTransport events, stopping the server if that fails
//! 3. loop over incoming events, lease renewal, the idle timer, server
//!    faults and cancellation
//! 4. on cancellation stop the server and send one UNSUBSCRIBE
//!
//! Events are handled inline: art is fetched and rendered before the next
//! event is looked at. Events that pile up meanwhile are shed by the
//! callback server's bounded queue.

use std::future::Future;
use std::sync::Arc;

use callback_server::{CallbackServer, EventRouter};
use sonos_api::{resolve_album_art_url, SonosClient};
use sonos_discovery::Device;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::art::{ArtFetcher, HttpArtFetcher};
use crate::config::ListenerConfig;
use crate::display::{AbsentDisplay, Display};
use crate::error::{Result, StreamError};
use crate::subscription::{callback_ip, AvTransportDecoder, AvTransportSubscription};
use crate::tracker::{renewal_interval_with_floor, Decision, Observation, PlaybackTracker};

/// Why the event loop ended
enum Exit {
    Cancelled,
    ServerStopped,
}

/// Listens for AVTransport events of one player and drives a [`Display`].
pub struct Listener {
    client: SonosClient,
    config: ListenerConfig,
    display: Box<dyn Display + Send>,
    art_fetcher: Arc<dyn ArtFetcher>,
}

impl Listener {
    /// Create a listener with no display attached.
    ///
    /// Fails when `config` does not validate.
    pub fn new(config: ListenerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: SonosClient::new(),
            config,
            display: Box::new(AbsentDisplay),
            art_fetcher: Arc::new(HttpArtFetcher::new()?),
        })
    }

    pub fn with_display(mut self, display: Box<dyn Display + Send>) -> Self {
        self.display = display;
        self
    }

    pub fn with_art_fetcher(mut self, art_fetcher: Arc<dyn ArtFetcher>) -> Self {
        self.art_fetcher = art_fetcher;
        self
    }

    /// Use `client` for GENA requests
    pub fn with_client(mut self, client: SonosClient) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Follow `device` until `cancel` resolves.
    ///
    /// Returns `Ok(())` after an orderly shutdown. Fails when the callback
    /// server cannot start or stops on its own, or when the initial
    /// subscription is refused. Renewal, art and display failures are only
    /// logged.
    pub async fn run<F>(&mut self, device: &Device, room: &str, cancel: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let ip = callback_ip(device)?;
        let (event_tx, mut event_rx) = mpsc::channel(self.config.event_buffer_size);
        let mut server = CallbackServer::bind(
            ip,
            &self.config.callback_path,
            EventRouter::new(AvTransportDecoder, event_tx),
        )?;

        let subscribed = AvTransportSubscription::subscribe(
            &self.client,
            device,
            server.callback_url(),
            self.config.subscription_timeout,
            self.config.subscribe_timeout,
        )
        .await;
        let mut subscription = match subscribed {
            Ok(subscription) => subscription,
            Err(e) => {
                if let Err(shutdown_err) = server.shutdown(self.config.shutdown_timeout).await {
                    warn!(room, error = %shutdown_err, "callback server shutdown failed");
                }
                return Err(e);
            }
        };
        info!(
            room,
            sid = %subscription.sid(),
            lease = ?subscription.lease(),
            "subscribed to AVTransport events"
        );

        let mut tracker = PlaybackTracker::new();
        let mut renew_every =
            renewal_interval_with_floor(subscription.lease(), self.config.min_renewal_interval);
        let renew = sleep(renew_every);
        let idle = sleep(self.config.idle_timeout);
        let mut idle_armed = false;
        tokio::pin!(renew, idle, cancel);

        let exit = loop {
            tokio::select! {
                _ = &mut cancel => break Exit::Cancelled,

                Some(event) = event_rx.recv() => {
                    let observation = match tracker.observe(&event) {
                        Decision::Act(observation) => observation,
                        Decision::Skip => {
                            debug!(room, "skipping internal stream identifier");
                            continue;
                        }
                        Decision::Unchanged => continue,
                    };

                    self.act(device, room, &mut tracker, &observation).await;

                    if observation.is_playing() {
                        idle_armed = false;
                    } else {
                        idle.as_mut().reset(Instant::now() + self.config.idle_timeout);
                        idle_armed = true;
                    }
                }

                _ = &mut renew => {
                    match subscription
                        .renew(subscription.lease(), self.config.subscribe_timeout)
                        .await
                    {
                        Ok(granted) => {
                            debug!(room, lease = ?granted, "renewed subscription");
                            renew_every =
                                renewal_interval_with_floor(granted, self.config.min_renewal_interval);
                        }
                        Err(e) => warn!(room, error = %e, "renew subscription failed"),
                    }
                    renew.as_mut().reset(Instant::now() + renew_every);
                }

                _ = &mut idle, if idle_armed => {
                    idle_armed = false;
                    tracker.display_cleared();
                    if let Err(e) = self.display.clear() {
                        warn!(room, error = %e, "display clear failed");
                    }
                    info!(room, "no playback for {:?}; display cleared", self.config.idle_timeout);
                }

                _ = server.terminated() => break Exit::ServerStopped,
            }
        };

        match exit {
            Exit::Cancelled => {
                debug!(room, "listener cancelled");
                if let Err(e) = server.shutdown(self.config.shutdown_timeout).await {
                    warn!(room, error = %e, "callback server shutdown failed");
                }
                if let Err(e) = subscription.unsubscribe(self.config.unsubscribe_timeout).await {
                    warn!(room, error = %e, "unsubscribe failed");
                }
                Ok(())
            }
            Exit::ServerStopped => {
                if let Err(e) = subscription.unsubscribe(self.config.unsubscribe_timeout).await {
                    debug!(room, error = %e, "unsubscribe after server fault failed");
                }
                Err(StreamError::CallbackServer(
                    "callback server stopped unexpectedly".to_string(),
                ))
            }
        }
    }

    async fn act(
        &mut self,
        device: &Device,
        room: &str,
        tracker: &mut PlaybackTracker,
        observation: &Observation,
    ) {
        info!(room, state = %observation.state, track = %observation.display, "now playing");

        if !observation.needs_art {
            return;
        }
        match self.show_art(device, &observation.art_uri).await {
            Ok(()) => tracker.art_rendered(&observation.signature),
            Err(e) => warn!(room, error = %e, "album art"),
        }
    }

    async fn show_art(&mut self, device: &Device, art_uri: &str) -> Result<()> {
        let url = resolve_album_art_url(device, art_uri)?;
        let art = self.art_fetcher.fetch(device, &url).await?;
        self.display.render(&art)?;
        Ok(())
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
