//! Zero-wait readiness checks and the slow-peer timeout.
//!
//! Both directions follow the same steps:
//!
//! 1. If a transfer in this direction first saw the socket ready more than
//!    the read timeout ago, close and fail with
//!    [`TransportError::TooSlow`].
//! 2. Ask the socket, without waiting, whether it is ready.
//! 3. A transient error or "not ready" yields [`Poll::Pending`] and leaves
//!    the pending timestamp alone.
//! 4. Any other error closes and fails with
//!    [`TransportError::NetworkFailure`].
//! 5. On readiness, start the clock if it is not already running.
//!
//! The clock only starts once the socket has been seen ready. A socket that
//! never becomes ready is idle rather than slow and never times out here.

use std::task::{Context, Poll};

use tokio::time::Instant;

use crate::{
    connection::Connection,
    error::{ErrorClass, TransportError},
    socket::{Direction, Socket},
};

impl<S: Socket> Connection<S> {
    /// Check, without waiting, whether the socket is readable.
    ///
    /// # Errors
    ///
    /// Fails with [`TransportError::NotConnected`] after close,
    /// [`TransportError::TooSlow`] once a started read has stalled past the
    /// timeout, and [`TransportError::NetworkFailure`] for a hard readiness
    /// error. The last two close the connection.
    pub fn poll_readable(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        self.poll_ready(cx, Direction::Read)
    }

    /// Check, without waiting, whether the socket is writable.
    ///
    /// # Errors
    ///
    /// As for [`poll_readable`](Self::poll_readable), measured against the
    /// in-flight write.
    pub fn poll_writable(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        self.poll_ready(cx, Direction::Write)
    }

    fn poll_ready(
        &mut self,
        cx: &mut Context<'_>,
        direction: Direction,
    ) -> Poll<Result<(), TransportError>> {
        let now = Instant::now();
        if let Some(since) = self.pending_since(direction)
            && now.saturating_duration_since(since) > self.read_timeout()
        {
            return Poll::Ready(Err(self.too_slow(direction)));
        }

        let readiness = match self.socket() {
            Ok(socket) => match direction {
                Direction::Read => socket.poll_read_ready(cx),
                Direction::Write => socket.poll_write_ready(cx),
            },
            Err(err) => return Poll::Ready(Err(err)),
        };

        match readiness {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(err)) if ErrorClass::of(&err) == ErrorClass::Transient => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Poll::Ready(Err(err)) => Poll::Ready(Err(self.network_failure(direction, err, true))),
            Poll::Ready(Ok(())) => {
                self.pending_mut(direction).get_or_insert(now);
                Poll::Ready(Ok(()))
            }
        }
    }
}
