//! Change detection between consecutive AVTransport events
//!
//! Sonos players send a NOTIFY for every position tick, volume nudge and
//! queue edit. [`PlaybackTracker`] boils each event down to the state and
//! track line a user would see and reports whether anything observable
//! changed, or whether album art still has to be shown.

use std::time::Duration;

use sonos_api::{format_state_display, format_track_display, should_skip_display, track_signature, RoomStatus};
use sonos_parser::AVTransportEvent;

/// Friendly state of a player that is playing
pub const PLAYING: &str = "Playing";

/// Renewal never happens more often than this, whatever lease the device
/// grants
pub const MIN_RENEWAL_INTERVAL: Duration = Duration::from_secs(60);

/// What one event looks like to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Friendly state, `Unknown` when the event carried none
    pub state: String,
    /// Track line, `(idle)` when the event carried no track
    pub display: String,
    /// Key used to detect track changes
    pub signature: String,
    /// Album art URI as reported, possibly relative
    pub art_uri: String,
    /// Art is available and differs from what was last rendered
    pub needs_art: bool,
}

impl Observation {
    pub fn is_playing(&self) -> bool {
        self.state == PLAYING
    }
}

/// Outcome of [`PlaybackTracker::observe`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The track line is an internal stream identifier
    Skip,
    /// Nothing visible changed and no art is pending
    Unchanged,
    /// Log the new state and, if asked, show art
    Act(Observation),
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackTracker {
    last_state: String,
    last_signature: String,
    art_signature: Option<String>,
    cleared_for_idle: bool,
}

impl PlaybackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `event` with what was acted on last.
    ///
    /// The state and signature are recorded whenever the result is
    /// [`Decision::Act`]; the art signature only through
    /// [`art_rendered`](Self::art_rendered).
    pub fn observe(&mut self, event: &AVTransportEvent) -> Decision {
        let mut state = format_state_display(&event.transport_state);
        if state.is_empty() {
            state = RoomStatus::UNKNOWN_STATE.to_string();
        }
        let mut display = format_track_display(&event.track);
        if display.is_empty() {
            display = RoomStatus::IDLE_TRACK.to_string();
        }

        if should_skip_display(&display) {
            return Decision::Skip;
        }

        let signature = track_signature(&event.track, &display);
        if self.cleared_for_idle && (state == PLAYING || signature != self.last_signature) {
            self.cleared_for_idle = false;
        }

        // A display cleared for idle stays dark until playback resumes or
        // the track changes.
        let art_uri = event.track.album_art_uri.trim().to_string();
        let needs_art = !self.cleared_for_idle
            && !art_uri.is_empty()
            && self.art_signature.as_deref() != Some(signature.as_str());

        if state == self.last_state && signature == self.last_signature && !needs_art {
            return Decision::Unchanged;
        }

        self.last_state.clone_from(&state);
        self.last_signature.clone_from(&signature);

        Decision::Act(Observation {
            state,
            display,
            signature,
            art_uri,
            needs_art,
        })
    }

    /// Record that art for `signature` is on the display
    pub fn art_rendered(&mut self, signature: &str) {
        self.art_signature = Some(signature.to_string());
    }

    /// Forget the rendered art after the idle timer cleared the display.
    ///
    /// Art is requested again only once the player is `Playing` or moves
    /// to another track.
    pub fn display_cleared(&mut self) {
        self.art_signature = None;
        self.cleared_for_idle = true;
    }

    pub fn is_cleared_for_idle(&self) -> bool {
        self.cleared_for_idle
    }

    pub fn art_signature(&self) -> Option<&str> {
        self.art_signature.as_deref()
    }
}

/// Renewal interval for a granted lease: half of it, but at least
/// [`MIN_RENEWAL_INTERVAL`].
pub fn renewal_interval(lease: Duration) -> Duration {
    renewal_interval_with_floor(lease, MIN_RENEWAL_INTERVAL)
}

pub fn renewal_interval_with_floor(lease: Duration, floor: Duration) -> Duration {
    (lease / 2).max(floor)
}
