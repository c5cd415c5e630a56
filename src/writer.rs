//! Whole-payload sends driven across scheduler turns.

use std::task::{Context, Poll, ready};

use bytes::Bytes;

use crate::{
    connection::Connection,
    error::{ErrorClass, TransportError},
    metrics,
    socket::{Direction, Socket},
};

/// Sends one payload in full, resuming wherever the socket stopped
/// accepting bytes.
///
/// Writing to a closed connection succeeds immediately without sending;
/// a session being torn down may still flush a final message, and that
/// must not block the teardown.
#[derive(Debug)]
pub struct WriteAll {
    payload: Bytes,
    sent: usize,
    announced: bool,
}

impl WriteAll {
    /// Prepare to send `payload`.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            sent: 0,
            announced: false,
        }
    }

    /// Bytes the socket has accepted so far.
    #[must_use]
    pub fn sent(&self) -> usize { self.sent }

    /// Bytes still to send.
    #[must_use]
    pub fn remaining(&self) -> usize { self.payload.len() - self.sent }

    /// Advance the send by at most one write attempt.
    ///
    /// # Errors
    ///
    /// - [`TransportError::LostConnection`] if the socket accepts zero bytes
    ///   while writable; the connection is closed.
    /// - [`TransportError::TooSlow`] if the write stalled past the timeout;
    ///   the connection is closed.
    /// - [`TransportError::NetworkFailure`] for socket errors. Broken pipes
    ///   close the connection; other failures leave it open.
    pub fn poll<S: Socket>(
        &mut self,
        conn: &mut Connection<S>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), TransportError>> {
        if !conn.is_connected() {
            return Poll::Ready(Ok(()));
        }
        ready!(conn.poll_writable(cx))?;

        if !self.announced {
            conn.wire_dump(Direction::Write, &self.payload);
            self.announced = true;
        }
        if self.remaining() == 0 {
            conn.finish(Direction::Write);
            return Poll::Ready(Ok(()));
        }

        let outcome = match conn.socket() {
            Ok(socket) => socket.try_write(&self.payload[self.sent..]),
            Err(err) => return Poll::Ready(Err(err)),
        };

        match outcome {
            Ok(0) => Poll::Ready(Err(conn.lost_connection())),
            Ok(count) => {
                self.sent += count;
                metrics::add_bytes(Direction::Write, count);
                if self.remaining() > 0 {
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
                conn.finish(Direction::Write);
                Poll::Ready(Ok(()))
            }
            Err(err) => match ErrorClass::of(&err) {
                ErrorClass::Transient => {
                    if self.sent == 0 {
                        conn.wire_line(format_args!(
                            "problem sending message ({err}), will retry later"
                        ));
                    } else {
                        conn.wire_line(format_args!(
                            "blocking io problem mid-way through a message, trying to complete"
                        ));
                    }
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
                ErrorClass::Lost => {
                    Poll::Ready(Err(conn.network_failure(Direction::Write, err, true)))
                }
                ErrorClass::TimedOut | ErrorClass::Fatal => {
                    Poll::Ready(Err(conn.network_failure(Direction::Write, err, false)))
                }
            },
        }
    }
}
