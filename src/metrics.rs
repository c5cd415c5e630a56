//! Metric helpers for `peerwire`.
//!
//! This module defines metric names and thin wrappers around the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! every helper compiles to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::socket::Direction;

/// Name of the counter tracking bytes moved through sockets.
pub const BYTES_TOTAL: &str = "peerwire_bytes_total";
/// Name of the counter tracking complete frames received.
pub const FRAMES_RECEIVED: &str = "peerwire_frames_received_total";
/// Name of the counter tracking transport errors by kind.
pub const ERRORS_TOTAL: &str = "peerwire_errors_total";
/// Name of the counter tracking sockets released.
pub const CONNECTIONS_CLOSED: &str = "peerwire_connections_closed_total";

/// Record `count` bytes transferred in `direction`.
pub fn add_bytes(direction: Direction, count: usize) {
    #[cfg(feature = "metrics")]
    counter!(BYTES_TOTAL, "direction" => direction.as_str())
        .increment(u64::try_from(count).unwrap_or(u64::MAX));
    #[cfg(not(feature = "metrics"))]
    let _ = (direction, count);
}

/// Record a fully assembled frame.
pub fn inc_frames() {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_RECEIVED).increment(1);
}

/// Record an error of the given kind label.
pub fn inc_errors(kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a socket release.
pub fn inc_closed() {
    #[cfg(feature = "metrics")]
    counter!(CONNECTIONS_CLOSED).increment(1);
}
