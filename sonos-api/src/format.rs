//! Human-readable renderings of track and transport state

use sonos_parser::TrackInfo;

/// One-line description of a track.
///
/// Prefers `artist - title`, then whichever of the two is present, then the
/// stream description, then the raw URI. Empty when nothing is known.
pub fn format_track_display(info: &TrackInfo) -> String {
    let title = info.title.trim();
    let artist = info.artist.trim();

    match (title.is_empty(), artist.is_empty()) {
        (false, false) => format!("{} - {}", artist, title),
        (false, true) => title.to_string(),
        (true, false) => artist.to_string(),
        (true, true) => [info.stream_info.trim(), info.uri.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string(),
    }
}

/// Friendly name for a raw UPnP transport state.
///
/// Unknown states are returned unchanged; an empty state stays empty.
pub fn format_state_display(raw: &str) -> String {
    match raw.trim().to_ascii_uppercase().as_str() {
        "PLAYING" => "Playing".to_string(),
        "PAUSED_PLAYBACK" => "Paused".to_string(),
        "STOPPED" => "Stopped".to_string(),
        "TRANSITIONING" => "Transitioning".to_string(),
        "NO_MEDIA_PRESENT" => "No Media".to_string(),
        "" => String::new(),
        _ => raw.to_string(),
    }
}

/// Change-detection key for a track: lower-cased, trimmed
/// `title|artist|album|stream|uri|display`.
pub fn track_signature(info: &TrackInfo, display: &str) -> String {
    [
        info.title.as_str(),
        info.artist.as_str(),
        info.album.as_str(),
        info.stream_info.as_str(),
        info.uri.as_str(),
        display,
    ]
    .iter()
    .map(|field| field.trim().to_lowercase())
    .collect::<Vec<_>>()
    .join("|")
}

/// Displays that are really internal Sonos URIs (`x-sonos-...`) and not worth
/// showing.
pub fn should_skip_display(display: &str) -> bool {
    display.trim().to_lowercase().starts_with("x-sonos")
}
