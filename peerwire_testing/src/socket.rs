//! A socket whose behaviour is queued up front by the test.

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex, MutexGuard},
    task::{Context, Poll},
};

use peerwire::{AddressFamily, Connection, Socket};
use rstest::fixture;

/// One scripted event on the read side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadStep {
    /// One readiness check reports "not ready".
    Idle,
    /// Readable; receives return these bytes, split across calls if the
    /// reader asks for fewer.
    Data(Vec<u8>),
    /// Readable; the next receive returns zero bytes.
    Eof,
    /// Readable; the next receive fails with this error.
    Fail(io::ErrorKind),
    /// The readiness check itself fails with this error.
    ReadinessFail(io::ErrorKind),
}

/// One scripted event on the write side.
///
/// With nothing queued the socket is writable and accepts everything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteStep {
    /// One readiness check reports "not ready".
    Idle,
    /// Writable; the next send accepts at most this many bytes.
    Accept(usize),
    /// Writable; the next send fails with this error.
    Fail(io::ErrorKind),
    /// The readiness check itself fails with this error.
    ReadinessFail(io::ErrorKind),
}

#[derive(Debug, Default)]
struct Script {
    reads: VecDeque<ReadStep>,
    writes: VecDeque<WriteStep>,
    written: Vec<u8>,
    read_calls: usize,
    write_calls: usize,
    closed: bool,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().expect("script lock poisoned")
}

/// Socket driven entirely by queued [`ReadStep`]s and [`WriteStep`]s.
///
/// With no read steps queued it never becomes readable. Dropping it marks
/// the script closed.
#[derive(Debug)]
pub struct ScriptedSocket {
    script: Arc<Mutex<Script>>,
}

/// Test-side view of a [`ScriptedSocket`].
#[derive(Clone, Debug)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
}

/// Create a socket and the handle that controls it.
#[must_use]
pub fn scripted() -> (ScriptedSocket, ScriptHandle) {
    let script = Arc::new(Mutex::new(Script::default()));
    (
        ScriptedSocket {
            script: Arc::clone(&script),
        },
        ScriptHandle { script },
    )
}

/// Fixture: an IPv4 connection to `192.0.2.1` over a fresh scripted socket.
#[fixture]
pub fn connection() -> (Connection<ScriptedSocket>, ScriptHandle) {
    let (socket, handle) = scripted();
    (
        Connection::new(AddressFamily::Ipv4, "192.0.2.1", "192.0.2.254", socket),
        handle,
    )
}

impl ScriptHandle {
    /// Queue a read-side event.
    pub fn push_read(&self, step: ReadStep) { lock(&self.script).reads.push_back(step); }

    /// Queue each chunk as a separate delivery.
    pub fn push_chunks<I>(&self, chunks: I)
    where
        I: IntoIterator,
        I::Item: Into<Vec<u8>>,
    {
        let mut script = lock(&self.script);
        for chunk in chunks {
            script.reads.push_back(ReadStep::Data(chunk.into()));
        }
    }

    /// Queue a write-side event.
    pub fn push_write(&self, step: WriteStep) { lock(&self.script).writes.push_back(step); }

    /// Everything the socket has accepted, in order.
    #[must_use]
    pub fn written(&self) -> Vec<u8> { lock(&self.script).written.clone() }

    /// Number of receive attempts made.
    #[must_use]
    pub fn read_calls(&self) -> usize { lock(&self.script).read_calls }

    /// Number of send attempts made.
    #[must_use]
    pub fn write_calls(&self) -> usize { lock(&self.script).write_calls }

    /// Read steps not yet consumed.
    #[must_use]
    pub fn pending_reads(&self) -> usize { lock(&self.script).reads.len() }

    /// Whether the socket has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool { lock(&self.script).closed }
}

impl Socket for ScriptedSocket {
    fn poll_read_ready(&self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut script = lock(&self.script);
        match script.reads.front() {
            None => Poll::Pending,
            Some(ReadStep::Idle) => {
                script.reads.pop_front();
                Poll::Pending
            }
            Some(ReadStep::ReadinessFail(kind)) => {
                let kind = *kind;
                script.reads.pop_front();
                Poll::Ready(Err(kind.into()))
            }
            Some(_) => Poll::Ready(Ok(())),
        }
    }

    fn poll_write_ready(&self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut script = lock(&self.script);
        match script.writes.front() {
            Some(WriteStep::Idle) => {
                script.writes.pop_front();
                Poll::Pending
            }
            Some(WriteStep::ReadinessFail(kind)) => {
                let kind = *kind;
                script.writes.pop_front();
                Poll::Ready(Err(kind.into()))
            }
            _ => Poll::Ready(Ok(())),
        }
    }

    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut script = lock(&self.script);
        script.read_calls += 1;
        match script.reads.pop_front() {
            Some(ReadStep::Data(mut bytes)) => {
                let count = bytes.len().min(buf.len());
                buf[..count].copy_from_slice(&bytes[..count]);
                if count < bytes.len() {
                    script.reads.push_front(ReadStep::Data(bytes.split_off(count)));
                }
                Ok(count)
            }
            Some(ReadStep::Eof) => Ok(0),
            Some(ReadStep::Fail(kind)) => Err(kind.into()),
            Some(step) => {
                script.reads.push_front(step);
                Err(io::ErrorKind::WouldBlock.into())
            }
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut script = lock(&self.script);
        script.write_calls += 1;
        let limit = match script.writes.pop_front() {
            Some(WriteStep::Accept(limit)) => limit,
            Some(WriteStep::Fail(kind)) => return Err(kind.into()),
            Some(step) => {
                script.writes.push_front(step);
                return Err(io::ErrorKind::WouldBlock.into());
            }
            None => buf.len(),
        };
        let count = limit.min(buf.len());
        script.written.extend_from_slice(&buf[..count]);
        Ok(count)
    }
}

impl Drop for ScriptedSocket {
    fn drop(&mut self) {
        if let Ok(mut script) = self.script.lock() {
            script.closed = true;
        }
    }
}
