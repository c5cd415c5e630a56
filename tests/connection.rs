//! Connection construction, identity and close semantics.

use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use peerwire::{
    AddressFamily,
    Connection,
    DEFAULT_READ_TIMEOUT,
    Direction,
    ReadExact,
    TcpConfig,
    WireLog,
    WriteAll,
};
use peerwire_testing::{DEFAULT_TURNS, ScriptHandle, ScriptedSocket, connection, drive, scripted};
use rstest::rstest;

type Scripted = (Connection<ScriptedSocket>, ScriptHandle);

#[derive(Default)]
struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    fn lines(&self) -> Vec<String> { self.lines.lock().expect("log lock").clone() }
}

impl WireLog for RecordingLog {
    fn line(&self, peer: &str, message: fmt::Arguments<'_>) {
        self.lines
            .lock()
            .expect("log lock")
            .push(format!("{peer} {message}"));
    }

    fn dump(&self, peer: &str, direction: Direction, bytes: &[u8]) {
        self.lines
            .lock()
            .expect("log lock")
            .push(format!("{peer} {} {}", direction.as_str(), bytes.len()));
    }
}

#[rstest]
fn close_is_idempotent(connection: Scripted) {
    let (mut conn, handle) = connection;
    assert!(conn.is_connected());

    conn.close();
    conn.close();
    conn.close();

    assert!(!conn.is_connected());
    assert!(handle.is_closed());
}

#[rstest]
fn identity_is_kept(connection: Scripted) {
    let (conn, _handle) = connection;
    assert_eq!(conn.family(), AddressFamily::Ipv4);
    assert_eq!(conn.peer(), "192.0.2.1");
    assert_eq!(conn.local(), "192.0.2.254");
    assert_eq!(conn.read_timeout(), DEFAULT_READ_TIMEOUT);

    let debug = format!("{conn:?}");
    assert!(debug.contains("192.0.2.1"));
    assert!(debug.contains("connected: true"));
}

#[rstest]
#[case::no_source(None, Duration::from_secs(1))]
#[case::configured(Some(TcpConfig { timeout: 5 }), Duration::from_secs(5))]
#[case::zero_means_unset(Some(TcpConfig { timeout: 0 }), Duration::from_secs(1))]
fn timeout_comes_from_configuration(
    #[case] tcp: Option<TcpConfig>,
    #[case] expected: Duration,
) {
    let (socket, _handle) = scripted();
    let conn = Connection::new(AddressFamily::Ipv4, "192.0.2.1", "192.0.2.2", socket)
        .with_config(tcp.as_ref().map(|cfg| cfg as &dyn peerwire::ConfigSource));
    assert_eq!(conn.read_timeout(), expected);
}

#[rstest]
fn dropping_the_connection_releases_the_socket(connection: Scripted) {
    let (conn, handle) = connection;
    drop(conn);
    assert!(handle.is_closed());
}

#[rstest]
fn wire_log_sees_transfers_and_close(connection: Scripted) {
    let (conn, handle) = connection;
    let log = Arc::new(RecordingLog::default());
    let mut conn = conn.with_wire_log(Arc::clone(&log) as Arc<dyn WireLog>);
    handle.push_chunks([vec![1, 2, 3]]);

    let mut read = ReadExact::new(3);
    drive(|cx| read.poll(&mut conn, cx), DEFAULT_TURNS)
        .expect("read completes")
        .0
        .expect("read succeeds");
    let mut write = WriteAll::new(vec![4, 5]);
    drive(|cx| write.poll(&mut conn, cx), DEFAULT_TURNS)
        .expect("write completes")
        .0
        .expect("write succeeds");
    conn.close();
    conn.close();

    assert_eq!(
        log.lines(),
        vec![
            "192.0.2.1 read 3".to_owned(),
            "192.0.2.1 write 2".to_owned(),
            "192.0.2.1 closing connection to 192.0.2.1".to_owned(),
        ]
    );
}
