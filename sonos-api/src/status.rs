//! Per-room playback summaries

use serde::Serialize;

/// Playback summary for one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomStatus {
    pub room: String,
    /// Friendly state (`Playing`, `Paused`, ...), `Unknown` or `Unavailable`
    pub state: String,
    /// Track display line, `(idle)` or `Unavailable`
    pub track: String,
}

impl RoomStatus {
    pub const UNAVAILABLE: &'static str = "Unavailable";
    pub const UNKNOWN_STATE: &'static str = "Unknown";
    pub const IDLE_TRACK: &'static str = "(idle)";

    /// Status for a room whose player could not be queried
    pub fn unavailable(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            state: Self::UNAVAILABLE.to_string(),
            track: Self::UNAVAILABLE.to_string(),
        }
    }
}
