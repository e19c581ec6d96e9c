//! GENA subscription handle
//!
//! The handle records what the device granted; the renew and unsubscribe
//! calls live on [`crate::SonosClient`] so a single client (and its timeout)
//! is used for the whole lifecycle.

use std::time::Duration;

pub use soap_client::DEFAULT_SUBSCRIPTION_TIMEOUT;

/// An active event subscription on one service of one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// UPnP subscription ID (SID) returned by the device
    pub sid: String,
    /// Lease most recently granted by the device
    pub timeout: Duration,
    /// Event URL the subscription was made against
    pub event_url: String,
}

impl Subscription {
    /// Lease to request on renewal: `requested` when non-zero, else the
    /// current lease, else [`DEFAULT_SUBSCRIPTION_TIMEOUT`].
    pub fn renewal_request(&self, requested: Duration) -> Duration {
        [requested, self.timeout]
            .into_iter()
            .find(|d| !d.is_zero())
            .unwrap_or(DEFAULT_SUBSCRIPTION_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(600, 1800, 600)]
    #[case(0, 1800, 1800)]
    #[case(0, 0, 1800)]
    #[case(120, 0, 120)]
    fn test_renewal_request(#[case] requested: u64, #[case] lease: u64, #[case] expected: u64) {
        let subscription = Subscription {
            sid: "uuid:sub".to_string(),
            timeout: Duration::from_secs(lease),
            event_url: "http://10.0.0.2:1400/MediaRenderer/AVTransport/Event".to_string(),
        };
        assert_eq!(
            subscription.renewal_request(Duration::from_secs(requested)),
            Duration::from_secs(expected)
        );
    }
}
