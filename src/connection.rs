//! Connection handle owning one peer socket.
//!
//! A [`Connection`] pairs the socket with the peer's identity and the
//! bookkeeping the transfer operations share: when the current read or
//! write first made contact with the socket, and the timeout after which a
//! stalled transfer is abandoned. The operations themselves live in
//! [`crate::poller`], [`crate::reader`], [`crate::writer`] and
//! [`crate::frame`].

use std::{fmt, io, sync::Arc, time::Duration};

use bytes::Bytes;
use futures::future::poll_fn;
use tokio::{net::TcpStream, time::Instant};

use crate::{
    config::{ConfigSource, DEFAULT_READ_TIMEOUT, resolve_read_timeout},
    error::TransportError,
    frame::{FrameReader, MessageFrame},
    message::MessageRegistry,
    metrics,
    reader::ReadExact,
    socket::{AddressFamily, Direction, Socket},
    wire_log::{NoopWireLog, WireLog},
    writer::WriteAll,
};

/// One peer's transport: an exclusively owned socket plus transfer state.
///
/// The socket is released exactly once, by [`close`](Self::close), by any
/// fatal transfer error, or when the connection is dropped.
pub struct Connection<S = TcpStream> {
    family: AddressFamily,
    peer: String,
    local: String,
    socket: Option<S>,
    read_timeout: Duration,
    pending_read: Option<Instant>,
    pending_write: Option<Instant>,
    log: Arc<dyn WireLog>,
}

impl<S: Socket> Connection<S> {
    /// Wrap an established socket.
    ///
    /// The connection starts with [`DEFAULT_READ_TIMEOUT`] and a silent wire
    /// log; use the `with_*` builders to change either before first use.
    pub fn new(
        family: AddressFamily,
        peer: impl Into<String>,
        local: impl Into<String>,
        socket: S,
    ) -> Self {
        Self {
            family,
            peer: peer.into(),
            local: local.into(),
            socket: Some(socket),
            read_timeout: DEFAULT_READ_TIMEOUT,
            pending_read: None,
            pending_write: None,
            log: Arc::new(NoopWireLog),
        }
    }

    /// Take the timeout from `source`, or the default when there is none.
    #[must_use]
    pub fn with_config(mut self, source: Option<&dyn ConfigSource>) -> Self {
        self.read_timeout = resolve_read_timeout(source);
        self
    }

    /// Set the slow-peer timeout directly.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Route wire-level trace output to `log`.
    #[must_use]
    pub fn with_wire_log(mut self, log: Arc<dyn WireLog>) -> Self {
        self.log = log;
        self
    }

    /// Release the socket. Safe to call any number of times.
    pub fn close(&mut self) {
        self.pending_read = None;
        self.pending_write = None;
        if self.socket.take().is_some() {
            self.log
                .line(&self.peer, format_args!("closing connection to {}", self.peer));
            metrics::inc_closed();
        }
    }

    /// Whether the socket is still held.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.socket.is_some() }

    /// Address family of the endpoints.
    #[must_use]
    pub fn family(&self) -> AddressFamily { self.family }

    /// Remote endpoint identifier.
    #[must_use]
    pub fn peer(&self) -> &str { &self.peer }

    /// Local endpoint identifier.
    #[must_use]
    pub fn local(&self) -> &str { &self.local }

    /// Slow-peer timeout in force.
    #[must_use]
    pub fn read_timeout(&self) -> Duration { self.read_timeout }

    /// When the in-flight transfer in `direction` first found the socket ready.
    #[must_use]
    pub fn pending_since(&self, direction: Direction) -> Option<Instant> {
        match direction {
            Direction::Read => self.pending_read,
            Direction::Write => self.pending_write,
        }
    }

    /// Read exactly `count` bytes.
    ///
    /// # Errors
    ///
    /// Returns any [`TransportError`] the underlying [`ReadExact`] reports.
    pub async fn read_exact(&mut self, count: usize) -> Result<Bytes, TransportError> {
        let mut read = ReadExact::new(count);
        poll_fn(|cx| read.poll(self, cx)).await
    }

    /// Send all of `payload`.
    ///
    /// # Errors
    ///
    /// Returns any [`TransportError`] the underlying [`WriteAll`] reports.
    pub async fn write_all(&mut self, payload: impl Into<Bytes>) -> Result<(), TransportError> {
        let mut write = WriteAll::new(payload);
        poll_fn(|cx| write.poll(self, cx)).await
    }

    /// Read one complete frame, validated against `registry`.
    ///
    /// # Errors
    ///
    /// Returns any [`TransportError`] the underlying [`FrameReader`]
    /// reports, including [`TransportError::Frame`] for a malformed header.
    pub async fn read_frame<R: MessageRegistry>(
        &mut self,
        registry: &R,
    ) -> Result<MessageFrame, TransportError> {
        let mut reader = FrameReader::new(registry);
        poll_fn(|cx| reader.poll(self, cx)).await
    }

    pub(crate) fn socket(&self) -> Result<&S, TransportError> {
        self.socket.as_ref().ok_or_else(|| self.not_connected())
    }

    pub(crate) fn pending_mut(&mut self, direction: Direction) -> &mut Option<Instant> {
        match direction {
            Direction::Read => &mut self.pending_read,
            Direction::Write => &mut self.pending_write,
        }
    }

    /// Mark the transfer in `direction` complete.
    pub(crate) fn finish(&mut self, direction: Direction) { *self.pending_mut(direction) = None; }

    pub(crate) fn wire_line(&self, message: fmt::Arguments<'_>) {
        self.log.line(&self.peer, message);
    }

    pub(crate) fn wire_dump(&self, direction: Direction, bytes: &[u8]) {
        self.log.dump(&self.peer, direction, bytes);
    }

    pub(crate) fn not_connected(&self) -> TransportError {
        self.record(TransportError::NotConnected {
            peer: self.peer.clone(),
        })
    }

    pub(crate) fn too_slow(&mut self, direction: Direction) -> TransportError {
        self.close();
        self.wire_line(format_args!("peer is too slow"));
        self.record(TransportError::TooSlow {
            peer: self.peer.clone(),
            direction,
            timeout: self.read_timeout,
        })
    }

    pub(crate) fn lost_connection(&mut self) -> TransportError {
        self.close();
        self.wire_line(format_args!("lost TCP session with peer"));
        self.record(TransportError::LostConnection {
            peer: self.peer.clone(),
        })
    }

    /// Surface `source` as a network failure, closing first when `close` is set.
    ///
    /// Without a close the failed transfer is abandoned, so its clock stops
    /// and the next transfer in `direction` starts a fresh window.
    pub(crate) fn network_failure(
        &mut self,
        direction: Direction,
        source: io::Error,
        close: bool,
    ) -> TransportError {
        if close {
            self.close();
        } else {
            self.finish(direction);
        }
        self.wire_line(format_args!("problem {direction} on socket: {source}"));
        self.record(TransportError::NetworkFailure {
            peer: self.peer.clone(),
            direction,
            source,
            closed: close,
        })
    }

    fn record(&self, err: TransportError) -> TransportError {
        metrics::inc_errors(err.kind_label());
        err
    }
}

impl Connection<TcpStream> {
    /// Wrap an accepted or connected TCP stream, taking identity from it.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint address cannot be read.
    pub fn from_tcp(stream: TcpStream) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        let local = stream.local_addr()?;
        Ok(Self::new(
            AddressFamily::of(&peer),
            peer.ip().to_string(),
            local.ip().to_string(),
            stream,
        ))
    }
}

impl<S> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("family", &self.family)
            .field("peer", &self.peer)
            .field("local", &self.local)
            .field("connected", &self.socket.is_some())
            .field("read_timeout", &self.read_timeout)
            .field("pending_read", &self.pending_read)
            .field("pending_write", &self.pending_write)
            .finish_non_exhaustive()
    }
}
