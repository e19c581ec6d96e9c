//! UPnP device description parsing.
//!
//! Description documents nest embedded devices (media server, media renderer)
//! inside the top-level `<device>`. Only the direct children of the device
//! directly under `<root>` are read, so nested entries never overwrite the
//! player's own name or room.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{DiscoveryError, Result};

/// Fields extracted from a device description document.
///
/// Empty strings mean the element was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceMetadata {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub room_name: String,
    pub model_name: String,
    pub model_number: String,
    pub serial_number: String,
    pub software_version: String,
}

impl DeviceMetadata {
    /// Parse the top-level device fields out of a description document.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::ParseError` when the XML is malformed or when
    /// neither `deviceType` nor `friendlyName` could be found.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut stack: Vec<String> = Vec::new();
        let mut device_depth: Option<usize> = None;
        let mut meta = DeviceMetadata::default();

        loop {
            let event = reader.read_event().map_err(|e| {
                DiscoveryError::ParseError(format!("Failed to decode device XML: {}", e))
            })?;

            match event {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    let parent_is_root = stack.last().map(String::as_str) == Some("root");
                    stack.push(name);
                    if device_depth.is_none() && parent_is_root && stack.last().map(String::as_str) == Some("device") {
                        device_depth = Some(stack.len());
                    }
                }
                Event::End(_) => {
                    if device_depth == Some(stack.len()) {
                        break;
                    }
                    stack.pop();
                }
                Event::Text(text) => {
                    let Some(depth) = device_depth else { continue };
                    if stack.len() != depth + 1 {
                        continue;
                    }
                    let value = text.unescape().map_err(|e| {
                        DiscoveryError::ParseError(format!("Invalid text in device XML: {}", e))
                    })?;
                    if let Some(field) = stack.last() {
                        meta.assign(field, value.trim());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if meta.device_type.is_empty() && meta.friendly_name.is_empty() {
            return Err(DiscoveryError::ParseError(
                "Device XML is missing top-level device information".to_string(),
            ));
        }

        Ok(meta)
    }

    fn assign(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        let slot = match field {
            "deviceType" => &mut self.device_type,
            "friendlyName" => &mut self.friendly_name,
            "manufacturer" => &mut self.manufacturer,
            "roomName" => &mut self.room_name,
            "modelName" => &mut self.model_name,
            "modelNumber" => &mut self.model_number,
            "serialNumber" => &mut self.serial_number,
            "softwareVersion" => &mut self.software_version,
            _ => return,
        };
        *slot = value.to_string();
    }

    /// Metadata-based Sonos heuristic, used to confirm a device after enrichment.
    pub fn looks_like_sonos(&self) -> bool {
        if self.manufacturer.to_lowercase().contains("sonos") {
            return true;
        }

        let device_type = self.device_type.to_lowercase();
        if device_type.contains("zoneplayer") || device_type.contains("sonos") {
            return true;
        }

        self.model_name.to_lowercase().contains("sonos")
    }
}
