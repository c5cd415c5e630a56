//! Message-type registry consulted while framing.
//!
//! The frame envelope is fixed: a 16-byte marker, a network-order length and
//! a one-byte type code. What varies per message type is the minimum (or
//! exact) length a well-formed message may declare, and the name used in
//! diagnostics. Both are supplied through [`MessageRegistry`] so the framer
//! stays ignorant of message semantics.

use std::borrow::Cow;

/// Length of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 19;

/// Synchronisation pattern opening every frame header.
pub const MARKER: [u8; 16] = [0xFF; 16];

/// Largest total length a frame may declare, header included.
pub const MAX_LEN: usize = 4096;

/// Per-type knowledge the framer needs to validate a header.
pub trait MessageRegistry {
    /// Whether `length` is acceptable for a message of `type_code`.
    ///
    /// The default accepts anything at least [`HEADER_LEN`] long.
    fn length_valid(&self, type_code: u8, length: usize) -> bool {
        let _ = type_code;
        length >= HEADER_LEN
    }

    /// Human-readable name for `type_code`, used in error text only.
    fn name(&self, type_code: u8) -> Cow<'static, str>;
}

impl<R: MessageRegistry + ?Sized> MessageRegistry for &R {
    fn length_valid(&self, type_code: u8, length: usize) -> bool {
        (**self).length_valid(type_code, length)
    }

    fn name(&self, type_code: u8) -> Cow<'static, str> { (**self).name(type_code) }
}

/// Message types known to [`BgpMessages`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Session negotiation.
    Open = 1,
    /// Route advertisement and withdrawal.
    Update = 2,
    /// Error report preceding session teardown.
    Notification = 3,
    /// Liveness probe with no body.
    Keepalive = 4,
    /// Request to re-advertise an address family.
    RouteRefresh = 5,
}

impl MessageType {
    /// Registry name of this message type.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Update => "UPDATE",
            Self::Notification => "NOTIFICATION",
            Self::Keepalive => "KEEPALIVE",
            Self::RouteRefresh => "ROUTE_REFRESH",
        }
    }

    /// Whether a message of this type may declare a total `length`.
    #[must_use]
    pub fn accepts_length(self, length: usize) -> bool {
        match self {
            Self::Open => length >= 29,
            Self::Update => length >= 23,
            Self::Notification => length >= 21,
            Self::Keepalive => length == HEADER_LEN,
            Self::RouteRefresh => length == 23,
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Open),
            2 => Ok(Self::Update),
            3 => Ok(Self::Notification),
            4 => Ok(Self::Keepalive),
            5 => Ok(Self::RouteRefresh),
            other => Err(other),
        }
    }
}

/// Registry for the standard routing-protocol message types.
///
/// Unknown type codes fall back to the default length rule so the session
/// layer, not the framer, decides what to do with them.
#[derive(Clone, Copy, Debug, Default)]
pub struct BgpMessages;

impl MessageRegistry for BgpMessages {
    fn length_valid(&self, type_code: u8, length: usize) -> bool {
        MessageType::try_from(type_code)
            .map_or(length >= HEADER_LEN, |kind| kind.accepts_length(length))
    }

    fn name(&self, type_code: u8) -> Cow<'static, str> {
        match MessageType::try_from(type_code) {
            Ok(kind) => Cow::Borrowed(kind.name()),
            Err(code) => Cow::Owned(format!("unknown message type {code:#04x}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::open_minimum(1, 29, true)]
    #[case::open_short(1, 28, false)]
    #[case::update_minimum(2, 23, true)]
    #[case::update_short(2, 22, false)]
    #[case::notification_minimum(3, 21, true)]
    #[case::notification_short(3, 20, false)]
    #[case::keepalive_exact(4, 19, true)]
    #[case::keepalive_with_body(4, 20, false)]
    #[case::route_refresh_exact(5, 23, true)]
    #[case::route_refresh_long(5, 24, false)]
    #[case::unknown_header_only(42, 19, true)]
    #[case::unknown_large(42, 4096, true)]
    fn bgp_length_rules(#[case] type_code: u8, #[case] length: usize, #[case] valid: bool) {
        assert_eq!(BgpMessages.length_valid(type_code, length), valid);
    }

    #[test]
    fn names_known_and_unknown_types() {
        assert_eq!(BgpMessages.name(4), "KEEPALIVE");
        assert_eq!(BgpMessages.name(0x2a), "unknown message type 0x2a");
    }

    struct OnlyNames;

    impl MessageRegistry for OnlyNames {
        fn name(&self, _type_code: u8) -> Cow<'static, str> { Cow::Borrowed("any") }
    }

    #[test]
    fn default_length_rule_requires_a_full_header() {
        assert!(OnlyNames.length_valid(9, HEADER_LEN));
        assert!(!OnlyNames.length_valid(9, HEADER_LEN - 1));
        assert!((&OnlyNames).length_valid(9, MAX_LEN));
    }
}
