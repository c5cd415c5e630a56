//! Test doubles and drivers for exercising `peerwire` connections without a
//! network.
//!
//! [`scripted`] returns a [`ScriptedSocket`] to hand to a
//! [`Connection`](peerwire::Connection) and a [`ScriptHandle`] the test
//! keeps to queue socket behaviour and inspect what happened.
//!
//! ```rust
//! use peerwire::{AddressFamily, Connection, ReadExact};
//! use peerwire_testing::{ReadStep, drive, scripted};
//!
//! let (socket, handle) = scripted();
//! handle.push_read(ReadStep::Data(vec![1, 2]));
//! handle.push_read(ReadStep::Data(vec![3]));
//! let mut conn = Connection::new(AddressFamily::Ipv4, "192.0.2.1", "192.0.2.2", socket);
//! let mut read = ReadExact::new(3);
//! let (bytes, _turns) = drive(|cx| read.poll(&mut conn, cx), 8).expect("completes");
//! assert_eq!(&bytes.expect("read")[..], &[1, 2, 3]);
//! ```

mod drive;
mod frames;
mod socket;

pub use drive::{DEFAULT_TURNS, drive, noop_context, poll_once};
pub use frames::{header_bytes, keepalive};
pub use socket::{ReadStep, ScriptHandle, ScriptedSocket, WriteStep, connection, scripted};
