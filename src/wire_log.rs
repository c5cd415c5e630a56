//! Pluggable sink for wire-level trace output.
//!
//! A [`Connection`](crate::Connection) reports lifecycle lines (closing,
//! slow peer, lost session) and hex dumps of every completed transfer to a
//! [`WireLog`]. The default [`NoopWireLog`] keeps the core silent;
//! [`TracingWireLog`] forwards to `tracing` under the `peerwire::wire`
//! target.

use std::fmt;

use crate::socket::Direction;

/// Receiver of wire-level trace output.
pub trait WireLog: Send + Sync {
    /// Record a free-form line about `peer`.
    fn line(&self, peer: &str, message: fmt::Arguments<'_>);

    /// Record the bytes of a completed transfer.
    ///
    /// Implementations should format `bytes` lazily; [`HexDump`] renders
    /// only when displayed.
    fn dump(&self, peer: &str, direction: Direction, bytes: &[u8]);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopWireLog;

impl WireLog for NoopWireLog {
    fn line(&self, _peer: &str, _message: fmt::Arguments<'_>) {}

    fn dump(&self, _peer: &str, _direction: Direction, _bytes: &[u8]) {}
}

/// Forwards wire output to `tracing`.
///
/// Lines are emitted at `DEBUG`, dumps at `TRACE`; a dump is only rendered
/// when a subscriber enables that level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingWireLog;

impl WireLog for TracingWireLog {
    fn line(&self, peer: &str, message: fmt::Arguments<'_>) {
        tracing::debug!(target: "peerwire::wire", peer, "{peer:>15} {message}");
    }

    fn dump(&self, peer: &str, direction: Direction, bytes: &[u8]) {
        let label = match direction {
            Direction::Read => "RECEIVED",
            Direction::Write => "SENDING",
        };
        tracing::trace!(
            target: "peerwire::wire",
            peer,
            direction = direction.as_str(),
            len = bytes.len(),
            "Peer {peer:>15} {label} {}",
            HexDump(bytes)
        );
    }
}

/// Display adapter rendering bytes as space-separated uppercase hex.
#[derive(Clone, Copy, Debug)]
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, byte) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn hex_dump_renders_pairs() {
        assert_eq!(HexDump(&[0xff, 0x00, 0x13]).to_string(), "FF 00 13");
        assert_eq!(HexDump(&[]).to_string(), "");
    }

    #[traced_test]
    #[test]
    fn tracing_sink_emits_lines_and_dumps() {
        let log = TracingWireLog;
        log.line("192.0.2.7", format_args!("peer is too slow"));
        log.dump("192.0.2.7", Direction::Read, &[0xff, 0x04]);
        assert!(logs_contain("peer is too slow"));
        assert!(logs_contain("RECEIVED FF 04"));
    }
}
