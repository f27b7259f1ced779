//! IKEv2 header and NAT-T non-ESP marker detection (spec.md §4.B), ported
//! from the `IKEv2Header` layout in `original_source/VPN4500and500.cpp`.

use crate::byte_reader::{DecodeError, PacketCursor};

const HEADER_LEN: usize = 28;
const NON_ESP_MARKER_LEN: usize = 4;

pub struct Ikev2Header {
    pub major_version: u8,
    pub exchange_type: u8,
    pub message_id: u32,
}

impl Ikev2Header {
    pub fn exchange_type_name(&self) -> &'static str {
        match self.exchange_type {
            34 => "IKE_SA_INIT",
            35 => "IKE_AUTH",
            36 => "CREATE_CHILD_SA",
            37 => "INFORMATIONAL",
            _ => "UNKNOWN",
        }
    }
}

/// Parses the 28-byte IKEv2 header: two 8-byte SPIs, next-payload,
/// version, exchange-type, flags, then a 4-byte message id and a 4-byte
/// length.
pub fn parse_ikev2_header(cur: PacketCursor) -> Result<Ikev2Header, DecodeError> {
    if cur.remaining() < HEADER_LEN {
        return Err(DecodeError::short("truncated ikev2 header"));
    }
    let version_byte = cur.u8_at(17)?;
    let exchange_type = cur.u8_at(18)?;
    let message_id = cur.u32_be_at(20)?;
    Ok(Ikev2Header {
        major_version: version_byte >> 4,
        exchange_type,
        message_id,
    })
}

/// On UDP/4500, IKEv2 control traffic is preceded by a 4-byte all-zero
/// non-ESP marker to distinguish it from ESP-in-UDP. Returns the payload
/// with the marker stripped if present.
pub fn strip_non_esp_marker(payload: &[u8]) -> Option<&[u8]> {
    if payload.len() >= NON_ESP_MARKER_LEN && payload[..NON_ESP_MARKER_LEN] == [0, 0, 0, 0] {
        Some(&payload[NON_ESP_MARKER_LEN..])
    } else {
        None
    }
}
