//! Control and event URLs derived from a device's description location

use url::Url;

use crate::{ApiError, Result, Service};

/// `http://host:port/<control endpoint>` for `service`, built from the
/// scheme and authority of `location`.
pub fn control_url(location: &str, service: Service) -> Result<String> {
    service_url(location, service.info().endpoint)
}

/// `http://host:port/<event endpoint>` for `service`.
pub fn event_url(location: &str, service: Service) -> Result<String> {
    service_url(location, service.info().event_endpoint)
}

fn service_url(location: &str, path: &str) -> Result<String> {
    let base = base_url(location)?;
    Ok(format!("{}/{}", base.as_str().trim_end_matches('/'), path))
}

/// The device location with path, query and fragment cleared.
pub(crate) fn base_url(location: &str) -> Result<Url> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ApiError::InvalidParameter("device location is empty".to_string()));
    }

    let mut base = Url::parse(location)
        .map_err(|e| ApiError::InvalidParameter(format!("parse device location {location:?}: {e}")))?;
    base.set_path("");
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}
