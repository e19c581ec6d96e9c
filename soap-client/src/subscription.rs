//! GENA event subscriptions (SUBSCRIBE / renew / UNSUBSCRIBE)

use std::io::Read;
use std::time::Duration;

use tracing::debug;

use crate::{SoapClient, SoapError};

/// Lease requested when the caller does not ask for one
pub const DEFAULT_SUBSCRIPTION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Longest body excerpt carried by [`SoapError::Http`] for GENA calls
const GENA_SNIPPET_BYTES: u64 = 512;

/// Response from a UPnP subscription request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResponse {
    /// Subscription ID returned by the device
    pub sid: String,
    /// Lease granted by the device, or the requested one when the device
    /// did not state a usable value
    pub timeout: Duration,
}

impl SoapClient {
    /// Subscribe `callback_url` to the events published at `event_url`.
    ///
    /// A zero `timeout` requests [`DEFAULT_SUBSCRIPTION_TIMEOUT`].
    pub fn subscribe(
        &self,
        event_url: &str,
        callback_url: &str,
        timeout: Duration,
    ) -> Result<SubscriptionResponse, SoapError> {
        let requested = non_zero_or_default(timeout);

        debug!(url = event_url, callback = callback_url, "sending SUBSCRIBE");

        let response = self.gena_request(
            self.agent
                .request("SUBSCRIBE", event_url)
                .set("CALLBACK", &format!("<{}>", callback_url))
                .set("NT", "upnp:event")
                .set("TIMEOUT", &timeout_header(requested)),
        )?;

        let sid = response
            .header("SID")
            .map(str::trim)
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| SoapError::Parse("Missing SID header in SUBSCRIBE response".to_string()))?
            .to_string();

        let timeout = response
            .header("TIMEOUT")
            .and_then(parse_timeout_header)
            .unwrap_or(requested);

        Ok(SubscriptionResponse { sid, timeout })
    }

    /// Renew an existing subscription and return the lease the device granted.
    ///
    /// A zero `timeout` requests [`DEFAULT_SUBSCRIPTION_TIMEOUT`].
    pub fn renew_subscription(
        &self,
        event_url: &str,
        sid: &str,
        timeout: Duration,
    ) -> Result<Duration, SoapError> {
        let requested = non_zero_or_default(timeout);

        debug!(url = event_url, sid, "renewing subscription");

        let response = self.gena_request(
            self.agent
                .request("SUBSCRIBE", event_url)
                .set("SID", sid)
                .set("TIMEOUT", &timeout_header(requested)),
        )?;

        Ok(response
            .header("TIMEOUT")
            .and_then(parse_timeout_header)
            .unwrap_or(requested))
    }

    /// Cancel a subscription
    pub fn unsubscribe(&self, event_url: &str, sid: &str) -> Result<(), SoapError> {
        debug!(url = event_url, sid, "sending UNSUBSCRIBE");

        self.gena_request(self.agent.request("UNSUBSCRIBE", event_url).set("SID", sid))?;
        Ok(())
    }

    fn gena_request(&self, request: ureq::Request) -> Result<ureq::Response, SoapError> {
        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(SoapError::Http {
                    status,
                    snippet: gena_snippet(response),
                })
            }
            Err(e) => return Err(SoapError::Network(e.to_string())),
        };

        match response.status() {
            200 | 202 => Ok(response),
            status => Err(SoapError::Http {
                status,
                snippet: gena_snippet(response),
            }),
        }
    }
}

/// Parse a GENA `TIMEOUT` header such as `Second-1800`.
///
/// Returns `None` for `infinite`, an empty value or anything unparseable.
pub fn parse_timeout_header(value: &str) -> Option<Duration> {
    let value = value.trim().to_ascii_lowercase();
    let seconds = value.strip_prefix("second-").unwrap_or(&value);

    if seconds.is_empty() || seconds == "infinite" {
        return None;
    }

    seconds
        .parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}

fn non_zero_or_default(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_SUBSCRIPTION_TIMEOUT
    } else {
        timeout
    }
}

fn timeout_header(timeout: Duration) -> String {
    format!("Second-{}", timeout.as_secs().max(1))
}

fn gena_snippet(response: ureq::Response) -> String {
    let mut buf = Vec::new();
    let _ = response.into_reader().take(GENA_SNIPPET_BYTES).read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use rstest::rstest;

    const EVENT_PATH: &str = "/MediaRenderer/AVTransport/Event";

    #[rstest]
    #[case("Second-1800", Some(1800))]
    #[case("  second-300 ", Some(300))]
    #[case("SECOND-60", Some(60))]
    #[case("3600", Some(3600))]
    #[case("Second-infinite", None)]
    #[case("infinite", None)]
    #[case("", None)]
    #[case("Second-abc", None)]
    #[case("Second-0", None)]
    fn test_parse_timeout_header(#[case] input: &str, #[case] expected: Option<u64>) {
        assert_eq!(parse_timeout_header(input), expected.map(Duration::from_secs));
    }

    #[test]
    fn test_subscribe_sends_gena_headers() {
        let mut server = Server::new();
        let mock = server
            .mock("SUBSCRIBE", EVENT_PATH)
            .match_header("callback", "<http://192.168.1.20:40000/sonos/events>")
            .match_header("nt", "upnp:event")
            .match_header("timeout", "Second-1800")
            .with_status(200)
            .with_header("SID", "uuid:RINCON_123-sub-1")
            .with_header("TIMEOUT", "Second-3600")
            .create();

        let url = format!("{}{}", server.url(), EVENT_PATH);
        let response = SoapClient::new()
            .subscribe(&url, "http://192.168.1.20:40000/sonos/events", Duration::ZERO)
            .unwrap();

        mock.assert();
        assert_eq!(response.sid, "uuid:RINCON_123-sub-1");
        assert_eq!(response.timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_subscribe_infinite_timeout_keeps_requested() {
        let mut server = Server::new();
        let _mock = server
            .mock("SUBSCRIBE", EVENT_PATH)
            .with_status(202)
            .with_header("SID", "uuid:sub-2")
            .with_header("TIMEOUT", "infinite")
            .create();

        let url = format!("{}{}", server.url(), EVENT_PATH);
        let response = SoapClient::new()
            .subscribe(&url, "http://cb/", Duration::from_secs(600))
            .unwrap();

        assert_eq!(response.timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_subscribe_without_sid_fails() {
        let mut server = Server::new();
        let _mock = server.mock("SUBSCRIBE", EVENT_PATH).with_status(200).create();

        let url = format!("{}{}", server.url(), EVENT_PATH);
        let err = SoapClient::new()
            .subscribe(&url, "http://cb/", Duration::from_secs(60))
            .unwrap_err();

        assert!(matches!(err, SoapError::Parse(_)));
    }

    #[test]
    fn test_subscribe_rejected_carries_snippet() {
        let mut server = Server::new();
        let _mock = server
            .mock("SUBSCRIBE", EVENT_PATH)
            .with_status(412)
            .with_body(format!("  precondition failed{}", "!".repeat(1000)))
            .create();

        let url = format!("{}{}", server.url(), EVENT_PATH);
        match SoapClient::new()
            .subscribe(&url, "http://cb/", Duration::from_secs(60))
            .unwrap_err()
        {
            SoapError::Http { status, snippet } => {
                assert_eq!(status, 412);
                assert!(snippet.starts_with("precondition failed"));
                assert!(snippet.len() <= 512);
            }
            other => panic!("Expected SoapError::Http, got {other:?}"),
        }
    }

    #[test]
    fn test_renew_sends_sid_and_parses_lease() {
        let mut server = Server::new();
        let mock = server
            .mock("SUBSCRIBE", EVENT_PATH)
            .match_header("sid", "uuid:sub-3")
            .match_header("timeout", "Second-1800")
            .match_header("callback", mockito::Matcher::Missing)
            .with_status(200)
            .with_header("TIMEOUT", "Second-900")
            .create();

        let url = format!("{}{}", server.url(), EVENT_PATH);
        let lease = SoapClient::new()
            .renew_subscription(&url, "uuid:sub-3", Duration::from_secs(1800))
            .unwrap();

        mock.assert();
        assert_eq!(lease, Duration::from_secs(900));
    }

    #[test]
    fn test_renew_without_timeout_header_returns_requested() {
        let mut server = Server::new();
        let _mock = server.mock("SUBSCRIBE", EVENT_PATH).with_status(200).create();

        let url = format!("{}{}", server.url(), EVENT_PATH);
        let lease = SoapClient::new()
            .renew_subscription(&url, "uuid:sub-4", Duration::ZERO)
            .unwrap();

        assert_eq!(lease, DEFAULT_SUBSCRIPTION_TIMEOUT);
    }

    #[test]
    fn test_unsubscribe() {
        let mut server = Server::new();
        let mock = server
            .mock("UNSUBSCRIBE", EVENT_PATH)
            .match_header("sid", "uuid:sub-5")
            .with_status(200)
            .create();

        let url = format!("{}{}", server.url(), EVENT_PATH);
        SoapClient::new().unsubscribe(&url, "uuid:sub-5").unwrap();
        mock.assert();
    }

    #[test]
    fn test_unsubscribe_unknown_sid_is_http_error() {
        let mut server = Server::new();
        let _mock = server.mock("UNSUBSCRIBE", EVENT_PATH).with_status(412).create();

        let url = format!("{}{}", server.url(), EVENT_PATH);
        let err = SoapClient::new().unsubscribe(&url, "uuid:gone").unwrap_err();
        assert!(matches!(err, SoapError::Http { status: 412, .. }));
    }
}
