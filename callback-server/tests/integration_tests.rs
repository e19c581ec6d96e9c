//! Integration tests for the callback server.
//!
//! These tests start a real HTTP server, send actual HTTP requests,
//! and verify end-to-end functionality.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use callback_server::{CallbackServer, EventRouter, NotifyDecoder, DEFAULT_CALLBACK_PATH};
use reqwest::Method;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Accepts bodies that look like a property set
struct PropertySetDecoder;

impl NotifyDecoder for PropertySetDecoder {
    type Event = String;
    type Error = String;

    fn decode(&self, body: &str) -> Result<String, String> {
        if body.contains("propertyset") {
            Ok(body.to_string())
        } else {
            Err("not a property set".to_string())
        }
    }
}

const EVENT_XML: &str = r#"<?xml version="1.0"?>
<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
    <e:property>
        <LastChange>&lt;Event/&gt;</LastChange>
    </e:property>
</e:propertyset>"#;

fn notify() -> Method {
    Method::from_bytes(b"NOTIFY").unwrap()
}

fn start(capacity: usize) -> (CallbackServer, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity);
    let server = CallbackServer::bind(
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        DEFAULT_CALLBACK_PATH,
        EventRouter::new(PropertySetDecoder, tx),
    )
    .expect("Failed to bind callback server");
    (server, rx)
}

#[tokio::test]
async fn test_callback_server_end_to_end() {
    let (server, mut rx) = start(16);
    let url = server.callback_url().to_string();

    assert!(url.starts_with("http://127.0.0.1:"));
    assert!(url.ends_with("/sonos/events"));
    assert_ne!(server.local_addr().port(), 0);

    let response = reqwest::Client::new()
        .request(notify(), &url)
        .header("SID", "uuid:RINCON_1-sub-1")
        .header("NT", "upnp:event")
        .header("NTS", "upnp:propchange")
        .header("Content-Type", "text/xml")
        .body(EVENT_XML)
        .send()
        .await
        .expect("Failed to send HTTP request");
    assert_eq!(response.status(), 200);

    let event = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("Timeout waiting for notification")
        .expect("No notification received");
    assert!(event.contains("LastChange"));

    server.shutdown(Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn test_wrong_method_and_path() {
    let (server, mut rx) = start(16);
    let client = reqwest::Client::new();

    let response = client.get(server.callback_url()).send().await.unwrap();
    assert_eq!(response.status(), 405);

    let response = client
        .post(server.callback_url())
        .body(EVENT_XML)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);

    let other = format!("http://{}/other", server.local_addr());
    let response = client.request(notify(), &other).body(EVENT_XML).send().await.unwrap();
    assert_eq!(response.status(), 404);

    assert!(rx.try_recv().is_err());
    server.shutdown(Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn test_undecodable_body_still_acknowledged() {
    let (server, mut rx) = start(16);

    let response = reqwest::Client::new()
        .request(notify(), server.callback_url())
        .header("SID", "uuid:sub-2")
        .body("garbage")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(rx.try_recv().is_err());
    server.shutdown(Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn test_full_queue_drops_newest() {
    let (server, mut rx) = start(1);
    let client = reqwest::Client::new();

    for marker in ["first", "second"] {
        let response = client
            .request(notify(), server.callback_url())
            .body(format!("{EVENT_XML}<!-- {marker} -->"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let event = rx.recv().await.unwrap();
    assert!(event.contains("first"));
    assert!(rx.try_recv().is_err());
    server.shutdown(Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn test_terminated_only_after_shutdown() {
    let (mut server, _rx) = start(1);

    let early = timeout(Duration::from_millis(100), server.terminated()).await;
    assert!(early.is_err(), "server ended without being asked to");

    server.shutdown(Duration::from_secs(5)).await.unwrap();
}
