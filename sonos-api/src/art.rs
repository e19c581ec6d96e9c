//! Album art URL resolution

use sonos_discovery::Device;
use url::Url;

use crate::{ApiError, Result};

/// Turn a track's album art URI into an absolute URL.
///
/// Absolute URIs are returned as they are. Relative ones (the usual
/// `/getaa?...` form) resolve against the device location's scheme and host,
/// or against `http://<ip>:1400/` when the location is unusable.
pub fn resolve_album_art_url(device: &Device, art_uri: &str) -> Result<String> {
    let art_uri = art_uri.trim();
    if art_uri.is_empty() {
        return Err(ApiError::InvalidParameter("album art uri empty".to_string()));
    }

    match Url::parse(art_uri) {
        Ok(absolute) => return Ok(absolute.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => {
            return Err(ApiError::InvalidParameter(format!("parse album art uri: {e}")));
        }
    }

    let base = album_art_base_url(device)?;
    base.join(art_uri)
        .map(String::from)
        .map_err(|e| ApiError::InvalidParameter(format!("resolve album art uri: {e}")))
}

fn album_art_base_url(device: &Device) -> Result<Url> {
    let location = device.location.trim();
    if !location.is_empty() {
        if let Ok(mut base) = Url::parse(location) {
            if base.has_host() {
                base.set_path("/");
                base.set_query(None);
                base.set_fragment(None);
                return Ok(base);
            }
        }
    }

    let ip = device.ip.trim();
    if !ip.is_empty() {
        let host = if ip.contains(':') {
            format!("[{ip}]")
        } else {
            ip.to_string()
        };
        return Url::parse(&format!("http://{host}:1400/"))
            .map_err(|e| ApiError::InvalidParameter(format!("construct album art base url: {e}")));
    }

    Err(ApiError::InvalidParameter("album art base url unavailable".to_string()))
}
