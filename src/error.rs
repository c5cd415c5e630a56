//! Error types surfaced by the transport core.
//!
//! [`TransportError`] covers socket-level failures and wraps
//! [`FrameFormatError`] for malformed headers. Would-block conditions never
//! appear here; they are reported as [`Poll::Pending`](std::task::Poll).
//!
//! # Closing policy
//!
//! Every fatal socket condition closes the connection before it is
//! returned, so callers never need to close after seeing one. Frame format
//! errors and writer failures that do not indicate connection loss leave the
//! socket open; see [`TransportError::closes_connection`].

use std::{io, time::Duration};

use thiserror::Error;

use crate::socket::Direction;

/// Failures reported by readiness checks, reads, writes and framing.
#[derive(Debug, Error)]
pub enum TransportError {
    /// An operation was attempted after the connection was closed.
    #[error("trying to use a closed TCP connection to {peer}")]
    NotConnected {
        /// Peer the connection belonged to.
        peer: String,
    },

    /// The peer made no progress within the configured timeout.
    #[error("peer {peer} is too slow: no progress {direction} for more than {timeout:?}")]
    TooSlow {
        /// Slow peer.
        peer: String,
        /// Direction that stalled.
        direction: Direction,
        /// Configured timeout that elapsed.
        timeout: Duration,
    },

    /// The peer closed the transport or the pipe broke.
    #[error("lost the TCP connection to {peer}")]
    LostConnection {
        /// Peer whose transport went away.
        peer: String,
    },

    /// Any other I/O failure.
    #[error("network failure {direction} {peer}: {source}")]
    NetworkFailure {
        /// Peer the failure occurred with.
        peer: String,
        /// Direction of the failed operation.
        direction: Direction,
        /// Underlying operating-system error.
        #[source]
        source: io::Error,
        /// Whether the connection was closed before surfacing this error.
        closed: bool,
    },

    /// The received header is malformed.
    #[error(transparent)]
    Frame(#[from] FrameFormatError),
}

impl TransportError {
    /// Whether the connection is closed once this error has been returned.
    #[must_use]
    pub fn closes_connection(&self) -> bool {
        match self {
            Self::NotConnected { .. } | Self::TooSlow { .. } | Self::LostConnection { .. } => true,
            Self::NetworkFailure { closed, .. } => *closed,
            Self::Frame(_) => false,
        }
    }

    /// Whether the error means the transport itself is gone.
    ///
    /// Broken-pipe failures on the write path are reported as
    /// [`TransportError::NetworkFailure`] but still count as connection loss.
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::LostConnection { .. } => true,
            Self::NetworkFailure { source, .. } => ErrorClass::of(source) == ErrorClass::Lost,
            _ => false,
        }
    }

    /// Stable label for metrics.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::NotConnected { .. } => "not_connected",
            Self::TooSlow { .. } => "too_slow",
            Self::LostConnection { .. } => "lost_connection",
            Self::NetworkFailure { .. } => "network_failure",
            Self::Frame(_) => "frame_format",
        }
    }
}

/// Malformed frame header.
///
/// The framer does not close the connection for these; the session layer
/// is expected to report them to the peer and tear down.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameFormatError {
    /// The header does not open with the 16-byte marker.
    #[error("the packet received does not contain a valid marker")]
    MissingMarker,

    /// The declared length falls outside the envelope bounds.
    #[error("{name} has an invalid message length of {length}")]
    InvalidLength {
        /// Registry name of the declared type.
        name: String,
        /// Declared type code.
        type_code: u8,
        /// Offending total length.
        length: usize,
    },

    /// The registry rejected the declared length for this type.
    #[error("{name} has an invalid message length of {length}")]
    LengthRejected {
        /// Registry name of the declared type.
        name: String,
        /// Declared type code.
        type_code: u8,
        /// Offending total length.
        length: usize,
    },
}

impl FrameFormatError {
    /// Error code and subcode a session layer reports for this failure:
    /// message header error with "connection not synchronised" for a bad
    /// marker, "bad message length" otherwise.
    #[must_use]
    pub fn notification(&self) -> (u8, u8) {
        match self {
            Self::MissingMarker => (1, 1),
            Self::InvalidLength { .. } | Self::LengthRejected { .. } => (1, 2),
        }
    }

    /// The faulty length to echo back to the peer, if the error concerns one.
    #[must_use]
    pub fn length(&self) -> Option<usize> {
        match self {
            Self::MissingMarker => None,
            Self::InvalidLength { length, .. } | Self::LengthRejected { length, .. } => {
                Some(*length)
            }
        }
    }
}

/// Semantic bucket for an operating-system error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ErrorClass {
    /// Retry on a later turn.
    Transient,
    /// The socket-level timeout fired.
    TimedOut,
    /// The transport is gone.
    Lost,
    /// Anything else.
    Fatal,
}

impl ErrorClass {
    pub(crate) fn of(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Self::Transient,
            io::ErrorKind::TimedOut => Self::TimedOut,
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof => Self::Lost,
            _ => Self::Fatal,
        }
    }
}
