//! The socket seam between the transport core and the operating system.
//!
//! [`Socket`] captures the four non-blocking primitives the core needs: a
//! zero-wait readiness check per direction and a single read or write
//! attempt. [`tokio::net::TcpStream`] provides all four natively.

use std::{
    fmt,
    io,
    net::SocketAddr,
    task::{Context, Poll},
};

use tokio::net::TcpStream;

/// Non-blocking socket operations used by a [`Connection`](crate::Connection).
///
/// Readiness checks must not block. Returning [`Poll::Pending`] means "not
/// ready right now"; implementations backed by a reactor should arrange for
/// the waker in `cx` to fire when that changes.
pub trait Socket {
    /// Check whether the socket can be read without blocking.
    fn poll_read_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// Check whether the socket can be written without blocking.
    fn poll_write_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// Attempt one receive into `buf`. `Ok(0)` means the peer closed.
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Attempt one send from `buf`, returning how many bytes were accepted.
    fn try_write(&self, buf: &[u8]) -> io::Result<usize>;
}

impl Socket for TcpStream {
    fn poll_read_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        TcpStream::poll_read_ready(self, cx)
    }

    fn poll_write_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        TcpStream::poll_write_ready(self, cx)
    }

    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> { TcpStream::try_read(self, buf) }

    fn try_write(&self, buf: &[u8]) -> io::Result<usize> { TcpStream::try_write(self, buf) }
}

/// Protocol family of a connection's endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4 endpoints.
    Ipv4,
    /// IPv6 endpoints.
    Ipv6,
}

impl AddressFamily {
    /// Family of `addr`.
    #[must_use]
    pub fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => Self::Ipv4,
            SocketAddr::V6(_) => Self::Ipv6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
        })
    }
}

/// Transfer direction on a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Bytes arriving from the peer.
    Read,
    /// Bytes leaving for the peer.
    Write,
}

impl Direction {
    /// Short label used for metrics and structured log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "reading",
            Self::Write => "writing",
        })
    }
}
