//! Frame envelope: header validation, assembly and encoding.
//!
//! ```text
//! +----------------------+----------------+-----------+------------------+
//! | marker (16 x 0xFF)   | length (u16 BE)| type (u8) | body             |
//! +----------------------+----------------+-----------+------------------+
//!  0                      16               18          19      length - 19
//! ```
//!
//! The length counts the header itself and must lie in
//! [`HEADER_LEN`]`..=`[`MAX_LEN`]. [`FrameReader`] reads the header, checks
//! it, then reads exactly the declared body.

use std::task::{Context, Poll, ready};

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    byte_order::{read_network_u16, write_network_u16},
    connection::Connection,
    error::{FrameFormatError, TransportError},
    message::{BgpMessages, HEADER_LEN, MARKER, MAX_LEN, MessageRegistry},
    metrics,
    reader::ReadExact,
    socket::Socket,
};

/// A complete message: validated header and its full body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageFrame {
    length: u16,
    type_code: u8,
    header: Bytes,
    body: Bytes,
}

impl MessageFrame {
    /// Total length declared by the header.
    #[must_use]
    pub fn length(&self) -> u16 { self.length }

    /// Message type code.
    #[must_use]
    pub fn type_code(&self) -> u8 { self.type_code }

    /// The 19 header bytes as received.
    #[must_use]
    pub fn header(&self) -> &Bytes { &self.header }

    /// The body, `length - 19` bytes long.
    #[must_use]
    pub fn body(&self) -> &Bytes { &self.body }

    /// Split into header and body.
    #[must_use]
    pub fn into_parts(self) -> (Bytes, Bytes) { (self.header, self.body) }

    /// Build the wire bytes for a message of `type_code` carrying `body`.
    ///
    /// `registry` only supplies the type name for the error.
    ///
    /// # Errors
    ///
    /// Returns [`FrameFormatError::InvalidLength`] if the body would push
    /// the total past [`MAX_LEN`].
    ///
    /// # Examples
    ///
    /// ```
    /// use peerwire::{frame::MessageFrame, message::BgpMessages};
    ///
    /// let keepalive = MessageFrame::encode(&BgpMessages, 4, &[]).expect("fits");
    /// assert_eq!(keepalive.len(), 19);
    /// assert_eq!(&keepalive[16..], &[0x00, 0x13, 0x04]);
    /// ```
    pub fn encode<R>(registry: &R, type_code: u8, body: &[u8]) -> Result<Bytes, FrameFormatError>
    where
        R: MessageRegistry + ?Sized,
    {
        let length = HEADER_LEN + body.len();
        let wire_length = u16::try_from(length)
            .ok()
            .filter(|_| length <= MAX_LEN)
            .ok_or_else(|| FrameFormatError::InvalidLength {
                name: registry.name(type_code).into_owned(),
                type_code,
                length,
            })?;
        let mut buf = BytesMut::with_capacity(length);
        buf.put_slice(&MARKER);
        buf.put_slice(&write_network_u16(wire_length));
        buf.put_u8(type_code);
        buf.put_slice(body);
        Ok(buf.freeze())
    }
}

/// Validate a complete header, returning the declared length and type code.
///
/// # Errors
///
/// - [`FrameFormatError::MissingMarker`] if the first 16 bytes are not the
///   marker (or the header is short).
/// - [`FrameFormatError::InvalidLength`] if the length is outside
///   `19..=4096`.
/// - [`FrameFormatError::LengthRejected`] if `registry` refuses the length
///   for this type.
pub fn parse_header<R>(header: &[u8], registry: &R) -> Result<(u16, u8), FrameFormatError>
where
    R: MessageRegistry + ?Sized,
{
    if header.get(..MARKER.len()) != Some(&MARKER[..]) {
        return Err(FrameFormatError::MissingMarker);
    }
    let Some(&[high, low, type_code]) = header.get(MARKER.len()..HEADER_LEN) else {
        return Err(FrameFormatError::MissingMarker);
    };
    let length = read_network_u16([high, low]);
    let total = usize::from(length);

    if !(HEADER_LEN..=MAX_LEN).contains(&total) {
        return Err(FrameFormatError::InvalidLength {
            name: registry.name(type_code).into_owned(),
            type_code,
            length: total,
        });
    }
    if !registry.length_valid(type_code, total) {
        return Err(FrameFormatError::LengthRejected {
            name: registry.name(type_code).into_owned(),
            type_code,
            length: total,
        });
    }
    Ok((length, type_code))
}

#[derive(Debug)]
enum State {
    Header(ReadExact),
    Body {
        header: Bytes,
        length: u16,
        type_code: u8,
        body: ReadExact,
    },
}

impl State {
    fn start() -> Self { Self::Header(ReadExact::new(HEADER_LEN)) }
}

/// Reads frames from a connection, one header and one body at a time.
///
/// Poll until it yields a frame or an error; it then resets and can be
/// polled again for the next frame. Nothing is returned until both header
/// and body are complete, and the body is never read when the header fails
/// validation.
#[derive(Debug)]
pub struct FrameReader<R = BgpMessages> {
    registry: R,
    state: State,
}

impl Default for FrameReader<BgpMessages> {
    fn default() -> Self { Self::new(BgpMessages) }
}

impl<R: MessageRegistry> FrameReader<R> {
    /// Create a reader validating headers against `registry`.
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            state: State::start(),
        }
    }

    /// Advance toward the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Frame`] for a malformed header, leaving the
    /// connection open, and otherwise whatever [`ReadExact::poll`] reports.
    pub fn poll<S: Socket>(
        &mut self,
        conn: &mut Connection<S>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<MessageFrame, TransportError>> {
        loop {
            match &mut self.state {
                State::Header(read) => {
                    let header = match ready!(read.poll(conn, cx)) {
                        Ok(header) => header,
                        Err(err) => return self.fail(err),
                    };
                    let (length, type_code) = match parse_header(&header, &self.registry) {
                        Ok(parsed) => parsed,
                        Err(err) => return self.fail(err.into()),
                    };
                    self.state = State::Body {
                        header,
                        length,
                        type_code,
                        body: ReadExact::new(usize::from(length) - HEADER_LEN),
                    };
                }
                State::Body {
                    header,
                    length,
                    type_code,
                    body,
                } => {
                    let body = match ready!(body.poll(conn, cx)) {
                        Ok(body) => body,
                        Err(err) => return self.fail(err),
                    };
                    let frame = MessageFrame {
                        length: *length,
                        type_code: *type_code,
                        header: std::mem::take(header),
                        body,
                    };
                    self.state = State::start();
                    metrics::inc_frames();
                    return Poll::Ready(Ok(frame));
                }
            }
        }
    }

    fn fail(&mut self, err: TransportError) -> Poll<Result<MessageFrame, TransportError>> {
        self.state = State::start();
        Poll::Ready(Err(err))
    }
}
