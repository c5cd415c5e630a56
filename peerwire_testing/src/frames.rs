//! Raw header builders for framing tests.

use peerwire::{MARKER, byte_order::write_network_u16};

/// Header bytes declaring `length` and `type_code` behind a valid marker.
#[must_use]
pub fn header_bytes(length: u16, type_code: u8) -> Vec<u8> {
    let mut bytes = MARKER.to_vec();
    bytes.extend_from_slice(&write_network_u16(length));
    bytes.push(type_code);
    bytes
}

/// A complete keepalive message.
#[must_use]
pub fn keepalive() -> Vec<u8> { header_bytes(19, 4) }
