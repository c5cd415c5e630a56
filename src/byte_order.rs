//! Helpers for explicit network byte-order conversions.
//!
//! The frame header carries its length as a network-order `u16`; keeping the
//! conversion here scopes the Clippy expectation to the one place it applies.

/// Serialise a `u16` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use peerwire::byte_order::write_network_u16;
///
/// assert_eq!(write_network_u16(0x0013), [0x00, 0x13]);
/// ```
#[must_use]
pub fn write_network_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use peerwire::byte_order::read_network_u16;
///
/// assert_eq!(read_network_u16([0x10, 0x00]), 4096);
/// ```
#[must_use]
pub fn read_network_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u16::from_be_bytes(bytes)
}
