//! Room naming for discovered devices.

use crate::Device;

/// Best human-facing room name for a device.
///
/// Prefers the described room name, then the `ROOMNAME` SSDP header, then
/// the described friendly name without its trailing word (players are
/// usually named "<Room> <Model>"), then the `FRIENDLYNAME` header, and
/// finally the USN.
pub fn derive_room_name(device: &Device) -> String {
    let room = device.metadata.room_name.trim();
    if !room.is_empty() {
        return room.to_string();
    }

    if let Some(room) = device.headers.get("ROOMNAME") {
        let room = room.trim();
        if !room.is_empty() {
            return room.to_string();
        }
    }

    let words: Vec<&str> = device.metadata.friendly_name.split_whitespace().collect();
    if words.len() > 1 {
        return words[..words.len() - 1].join(" ");
    }

    if let Some(friendly) = device.headers.get("FRIENDLYNAME") {
        if !friendly.trim().is_empty() {
            return friendly.clone();
        }
    }

    device.usn.clone()
}

/// Case-insensitive comparison of trimmed room names.
pub fn room_matches(room: &str, target: &str) -> bool {
    room.trim().to_lowercase() == target.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceMetadata;
    use rstest::rstest;

    fn device_with(room: &str, friendly: &str, headers: &[(&str, &str)]) -> Device {
        Device {
            usn: "uuid:RINCON_000E58A0123456".to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            metadata: DeviceMetadata {
                room_name: room.to_string(),
                friendly_name: friendly.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[rstest]
    #[case(device_with("  Kitchen ", "Kitchen One", &[("ROOMNAME", "Den")]), "Kitchen")]
    #[case(device_with("", "Kitchen One", &[("ROOMNAME", " Den ")]), "Den")]
    #[case(device_with("", "Office Pato Amp", &[]), "Office Pato")]
    #[case(device_with("", "Solo", &[("FRIENDLYNAME", "Solo Speaker")]), "Solo Speaker")]
    #[case(device_with("", "", &[]), "uuid:RINCON_000E58A0123456")]
    fn test_derive_room_name(#[case] device: Device, #[case] expected: &str) {
        assert_eq!(derive_room_name(&device), expected);
    }

    #[rstest]
    #[case("Kitchen", "kitchen", true)]
    #[case(" Living Room ", "living room", true)]
    #[case("Office", "Office Pato", false)]
    fn test_room_matches(#[case] room: &str, #[case] target: &str, #[case] expected: bool) {
        assert_eq!(room_matches(room, target), expected);
    }
}
