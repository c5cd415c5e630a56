//! Exact-count reads driven across scheduler turns.

use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};

use crate::{
    connection::Connection,
    error::{ErrorClass, TransportError},
    message::MAX_LEN,
    metrics,
    socket::{Direction, Socket},
};

/// Most bytes requested from the socket in one attempt.
const READ_CHUNK: usize = MAX_LEN;

/// Accumulates exactly `wanted` bytes from a connection.
///
/// Each call to [`poll`](Self::poll) makes at most one receive attempt and
/// returns [`Poll::Pending`] until the count is reached. Bytes arrive in
/// stream order however the peer splits them. Once complete the operation
/// starts over, so polling again reads the next `wanted` bytes.
#[derive(Debug)]
pub struct ReadExact {
    wanted: usize,
    buf: BytesMut,
}

impl ReadExact {
    /// Prepare to read `wanted` bytes.
    #[must_use]
    pub fn new(wanted: usize) -> Self {
        Self {
            wanted,
            buf: BytesMut::with_capacity(wanted.min(READ_CHUNK)),
        }
    }

    /// Total bytes this operation reads.
    #[must_use]
    pub fn wanted(&self) -> usize { self.wanted }

    /// Bytes accumulated so far.
    #[must_use]
    pub fn received(&self) -> usize { self.buf.len() }

    /// Advance the read by at most one receive.
    ///
    /// A zero-byte read completes immediately without touching the socket.
    ///
    /// # Errors
    ///
    /// - [`TransportError::NotConnected`] if the connection is closed.
    /// - [`TransportError::LostConnection`] if the peer closed the stream or
    ///   the pipe broke.
    /// - [`TransportError::TooSlow`] if the read stalled past the timeout.
    /// - [`TransportError::NetworkFailure`] for any other socket error.
    ///
    /// All of these except the first close the connection.
    pub fn poll<S: Socket>(
        &mut self,
        conn: &mut Connection<S>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Bytes, TransportError>> {
        if self.wanted == 0 {
            return Poll::Ready(Ok(Bytes::new()));
        }
        ready!(conn.poll_readable(cx))?;

        let start = self.buf.len();
        let room = (self.wanted - start).min(READ_CHUNK);
        self.buf.resize(start + room, 0);
        let outcome = conn.socket().map(|socket| socket.try_read(&mut self.buf[start..]));
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                self.buf.truncate(start);
                return Poll::Ready(Err(err));
            }
        };

        match outcome {
            Ok(0) => {
                self.buf.truncate(start);
                Poll::Ready(Err(conn.lost_connection()))
            }
            Ok(count) => {
                self.buf.truncate(start + count);
                metrics::add_bytes(Direction::Read, count);
                if self.buf.len() < self.wanted {
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
                conn.finish(Direction::Read);
                conn.wire_dump(Direction::Read, &self.buf);
                Poll::Ready(Ok(self.buf.split().freeze()))
            }
            Err(err) => {
                self.buf.truncate(start);
                match ErrorClass::of(&err) {
                    ErrorClass::Transient => {
                        cx.waker().wake_by_ref();
                        Poll::Pending
                    }
                    ErrorClass::TimedOut => Poll::Ready(Err(conn.too_slow(Direction::Read))),
                    ErrorClass::Lost => Poll::Ready(Err(conn.lost_connection())),
                    ErrorClass::Fatal => {
                        Poll::Ready(Err(conn.network_failure(Direction::Read, err, true)))
                    }
                }
            }
        }
    }
}
