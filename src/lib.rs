#![doc(html_root_url = "https://docs.rs/peerwire/latest")]
//! Non-blocking peer transport for a routing-protocol speaker.
//!
//! `peerwire` owns one TCP socket per remote peer and turns byte arrivals
//! into framed protocol messages. Every operation is poll-based: a driver
//! calls it repeatedly, each call makes at most one non-blocking I/O attempt,
//! and the result is either [`Poll::Pending`](std::task::Poll) or a final
//! value or [`TransportError`]. Many connections can thus be served from a
//! single control loop.
//!
//! ```no_run
//! use peerwire::{BgpMessages, Connection, FrameReader};
//! use tokio::net::TcpStream;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = TcpStream::connect("192.0.2.1:179").await?;
//! let mut conn = Connection::from_tcp(stream)?;
//! let frame = conn.read_frame(&BgpMessages).await?;
//! println!("type {} with {} body bytes", frame.type_code(), frame.body().len());
//! # Ok(())
//! # }
//! ```

pub mod byte_order;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod message;
pub mod metrics;
pub mod poller;
pub mod reader;
pub mod socket;
pub mod wire_log;
pub mod writer;

pub use config::{ConfigSource, DEFAULT_READ_TIMEOUT, TcpConfig};
pub use connection::Connection;
pub use error::{FrameFormatError, TransportError};
pub use frame::{FrameReader, MessageFrame, parse_header};
pub use message::{BgpMessages, HEADER_LEN, MARKER, MAX_LEN, MessageRegistry, MessageType};
pub use reader::ReadExact;
pub use socket::{AddressFamily, Direction, Socket};
pub use wire_log::{HexDump, NoopWireLog, TracingWireLog, WireLog};
pub use writer::WriteAll;
