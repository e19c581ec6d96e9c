//! Enrichment tests against a mock description endpoint.

use std::net::TcpListener;
use std::time::Duration;

use mockito::Server;
use rstest::rstest;
use sonos_discovery::{derive_room_name, Device, DiscoveryError, Enricher, EnrichmentOptions};

const SONOS_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion>
    <major>1</major>
    <minor>0</minor>
  </specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:ZonePlayer:1</deviceType>
    <friendlyName>Kitchen</friendlyName>
    <roomName>Kitchen</roomName>
    <manufacturer>Sonos, Inc.</manufacturer>
    <modelName>Sonos One</modelName>
    <modelNumber>S13</modelNumber>
    <serialNumber>RINCON_12345</serialNumber>
    <softwareVersion>65.1-123456</softwareVersion>
    <deviceList>
      <device>
        <deviceType>urn:schemas-upnp-org:device:MediaServer:1</deviceType>
        <friendlyName>Nested Server</friendlyName>
      </device>
    </deviceList>
  </device>
</root>"#;

const OTHER_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Generic Speaker</friendlyName>
    <roomName>Living Room</roomName>
    <manufacturer>Acme</manufacturer>
    <modelName>Speaker 2000</modelName>
  </device>
</root>"#;

fn device_at(location: String) -> Device {
    Device {
        ip: "127.0.0.1".to_string(),
        location,
        ..Default::default()
    }
}

#[test]
fn test_nested_device_does_not_override_outer_fields() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/xml/device_description.xml")
        .with_status(200)
        .with_body(SONOS_XML)
        .create();

    let enricher = Enricher::new().unwrap();
    let device = device_at(format!("{}/xml/device_description.xml", server.url()));
    let enriched = enricher
        .enrich_device(&device, Duration::from_secs(2))
        .unwrap();

    mock.assert();
    assert!(enriched.is_sonos);
    assert_eq!(enriched.metadata.friendly_name, "Kitchen");
    assert_eq!(enriched.metadata.room_name, "Kitchen");
    assert_eq!(enriched.metadata.device_type, "urn:schemas-upnp-org:device:ZonePlayer:1");
    assert_eq!(enriched.metadata.model_name, "Sonos One");
    assert_eq!(derive_room_name(&enriched), "Kitchen");
}

#[test]
fn test_non_sonos_description_keeps_flag_clear() {
    let mut server = Server::new();
    server.mock("GET", "/").with_body(OTHER_XML).create();

    let enricher = Enricher::new().unwrap();
    let enriched = enricher
        .enrich_device(&device_at(server.url()), Duration::from_secs(2))
        .unwrap();

    assert!(!enriched.is_sonos);
    assert_eq!(enriched.metadata.friendly_name, "Generic Speaker");
    assert_eq!(enriched.metadata.room_name, "Living Room");
}

#[test]
fn test_enrichment_never_clears_header_flag() {
    let mut server = Server::new();
    server.mock("GET", "/").with_body(OTHER_XML).create();

    let mut device = device_at(server.url());
    device.is_sonos = true;

    let enriched = Enricher::new()
        .unwrap()
        .enrich_device(&device, Duration::from_secs(2))
        .unwrap();
    assert!(enriched.is_sonos);
}

#[rstest]
#[case(404)]
#[case(500)]
fn test_non_200_status_is_error(#[case] status: usize) {
    let mut server = Server::new();
    server.mock("GET", "/").with_status(status).create();

    let result = Enricher::new()
        .unwrap()
        .enrich_device(&device_at(server.url()), Duration::from_secs(2));

    match result {
        Err(DiscoveryError::HttpStatus { status: got, .. }) => assert_eq!(got as usize, status),
        other => panic!("expected HttpStatus error, got {:?}", other),
    }
}

#[test]
fn test_slow_device_times_out() {
    // Accepts connections but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let location = format!("http://{}/desc.xml", listener.local_addr().unwrap());

    let result = Enricher::new()
        .unwrap()
        .enrich_device(&device_at(location), Duration::from_millis(100));

    assert!(result.is_err());
    drop(listener);
}

#[test]
fn test_batch_continues_past_failures() {
    let mut server = Server::new();
    server.mock("GET", "/good.xml").with_body(SONOS_XML).create();
    server.mock("GET", "/missing.xml").with_status(404).create();
    server.mock("GET", "/other.xml").with_body(OTHER_XML).create();

    let devices = vec![
        device_at(format!("{}/missing.xml", server.url())),
        device_at(format!("{}/good.xml", server.url())),
        Device::default(),
        device_at(format!("{}/other.xml", server.url())),
    ];

    let enricher = Enricher::new().unwrap();
    let (enriched, first_error) = enricher.enrich_devices(&devices, &EnrichmentOptions::default());

    assert_eq!(enriched.len(), 4);
    assert!(matches!(first_error, Some(DiscoveryError::HttpStatus { status: 404, .. })));
    assert_eq!(enriched[0], devices[0]);
    assert_eq!(enriched[1].metadata.friendly_name, "Kitchen");
    assert!(enriched[1].is_sonos);
    assert_eq!(enriched[2], Device::default());
    assert_eq!(enriched[3].metadata.friendly_name, "Generic Speaker");
}

#[test]
fn test_description_without_identity_leaves_device_unmodified() {
    let mut server = Server::new();
    server
        .mock("GET", "/bare.xml")
        .with_body(r#"<root xmlns="urn:schemas-upnp-org:device-1-0"><device><UDN>uuid:RINCON_1</UDN></device></root>"#)
        .create();

    let mut device = device_at(format!("{}/bare.xml", server.url()));
    device.is_sonos = true;

    let (enriched, first_error) = Enricher::new()
        .unwrap()
        .enrich_devices(&[device.clone()], &EnrichmentOptions::default());

    assert_eq!(enriched, vec![device]);
    assert!(matches!(first_error, Some(DiscoveryError::ParseError(_))));
}
