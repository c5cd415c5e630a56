//! Exact-count reads over a scripted socket.

use std::{io, task::Poll, time::Duration};

use peerwire::{AddressFamily, Connection, Direction, ReadExact, TransportError};
use peerwire_testing::{
    DEFAULT_TURNS,
    ReadStep,
    ScriptHandle,
    ScriptedSocket,
    connection,
    drive,
    poll_once,
    scripted,
};
use proptest::prelude::*;
use rstest::rstest;
use tokio::time;

type Scripted = (Connection<ScriptedSocket>, ScriptHandle);

/// Split `bytes` at the given (unsorted, possibly repeated) cut points.
fn split_at_cuts(bytes: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = cuts
        .iter()
        .map(|cut| cut % bytes.len())
        .filter(|cut| *cut > 0)
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        chunks.push(bytes[start..cut].to_vec());
        start = cut;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

proptest! {
    #[test]
    fn any_split_reassembles_in_order(
        bytes in proptest::collection::vec(any::<u8>(), 1..512),
        cuts in proptest::collection::vec(any::<usize>(), 0..16),
    ) {
        let (socket, handle) = scripted();
        let mut conn = Connection::new(AddressFamily::Ipv4, "192.0.2.1", "192.0.2.254", socket);
        let chunks = split_at_cuts(&bytes, &cuts);
        let deliveries = chunks.len();
        handle.push_chunks(chunks);

        let mut read = ReadExact::new(bytes.len());
        let (result, turns) = drive(|cx| read.poll(&mut conn, cx), DEFAULT_TURNS)
            .expect("read completes");
        let received = result.expect("read succeeds");

        prop_assert_eq!(&received[..], &bytes[..]);
        prop_assert_eq!(turns, deliveries);
        prop_assert!(conn.pending_since(Direction::Read).is_none());
        prop_assert!(conn.is_connected());
    }
}

#[rstest]
fn zero_byte_read_never_touches_the_socket(connection: Scripted) {
    let (mut conn, handle) = connection;
    let mut read = ReadExact::new(0);

    let result = poll_once(|cx| read.poll(&mut conn, cx));
    assert!(matches!(result, Poll::Ready(Ok(ref bytes)) if bytes.is_empty()));

    conn.close();
    let result = poll_once(|cx| read.poll(&mut conn, cx));
    assert!(matches!(result, Poll::Ready(Ok(ref bytes)) if bytes.is_empty()));
    assert_eq!(handle.read_calls(), 0);
}

#[rstest]
fn unreadable_socket_is_pending(connection: Scripted) {
    let (mut conn, handle) = connection;
    handle.push_read(ReadStep::Idle);
    let mut read = ReadExact::new(4);

    assert!(poll_once(|cx| read.poll(&mut conn, cx)).is_pending());
    assert_eq!(read.received(), 0);
    assert_eq!(handle.read_calls(), 0);
}

#[rstest]
fn partial_progress_is_reported(connection: Scripted) {
    let (mut conn, handle) = connection;
    handle.push_read(ReadStep::Data(vec![1, 2, 3]));
    let mut read = ReadExact::new(10);

    assert!(poll_once(|cx| read.poll(&mut conn, cx)).is_pending());
    assert_eq!(read.received(), 3);
    assert_eq!(read.wanted(), 10);
    assert!(conn.pending_since(Direction::Read).is_some());
}

#[rstest]
fn huge_read_grows_with_the_data(connection: Scripted) {
    let (mut conn, handle) = connection;
    handle.push_read(ReadStep::Data(vec![7; 5000]));
    let mut read = ReadExact::new(usize::MAX);

    assert!(poll_once(|cx| read.poll(&mut conn, cx)).is_pending());
    assert_eq!(read.received(), 4096);
    assert!(poll_once(|cx| read.poll(&mut conn, cx)).is_pending());
    assert_eq!(read.received(), 5000);
    assert_eq!(handle.pending_reads(), 0);
}

#[rstest]
fn peer_close_is_lost_connection(connection: Scripted) {
    let (mut conn, handle) = connection;
    handle.push_chunks([vec![1, 2]]);
    handle.push_read(ReadStep::Eof);
    let mut read = ReadExact::new(4);

    let (result, _) = drive(|cx| read.poll(&mut conn, cx), DEFAULT_TURNS).expect("terminates");
    assert!(matches!(result, Err(TransportError::LostConnection { .. })));
    assert!(!conn.is_connected());
    assert!(handle.is_closed());
}

#[rstest]
#[case::timed_out(io::ErrorKind::TimedOut, "too_slow")]
#[case::broken_pipe(io::ErrorKind::BrokenPipe, "lost_connection")]
#[case::reset(io::ErrorKind::ConnectionReset, "lost_connection")]
#[case::other(io::ErrorKind::PermissionDenied, "network_failure")]
fn receive_errors_close_the_connection(
    connection: Scripted,
    #[case] kind: io::ErrorKind,
    #[case] label: &str,
) {
    let (mut conn, handle) = connection;
    handle.push_read(ReadStep::Fail(kind));
    let mut read = ReadExact::new(4);

    let err = match poll_once(|cx| read.poll(&mut conn, cx)) {
        Poll::Ready(Err(err)) => err,
        other => panic!("expected an error, got {other:?}"),
    };
    assert_eq!(err.kind_label(), label);
    assert!(err.closes_connection());
    assert!(handle.is_closed());
}

#[rstest]
#[case::would_block(io::ErrorKind::WouldBlock)]
#[case::interrupted(io::ErrorKind::Interrupted)]
fn transient_receive_errors_are_retried(connection: Scripted, #[case] kind: io::ErrorKind) {
    let (mut conn, handle) = connection;
    handle.push_read(ReadStep::Fail(kind));
    handle.push_chunks([vec![7, 8]]);
    let mut read = ReadExact::new(2);

    assert!(poll_once(|cx| read.poll(&mut conn, cx)).is_pending());
    let (result, _) = drive(|cx| read.poll(&mut conn, cx), DEFAULT_TURNS).expect("completes");
    assert_eq!(&result.expect("read succeeds")[..], &[7, 8]);
}

#[rstest]
fn reading_after_close_is_not_connected(connection: Scripted) {
    let (mut conn, handle) = connection;
    handle.push_chunks([vec![1]]);
    conn.close();
    conn.close();
    let mut read = ReadExact::new(1);

    assert!(matches!(
        poll_once(|cx| read.poll(&mut conn, cx)),
        Poll::Ready(Err(TransportError::NotConnected { .. }))
    ));
    assert_eq!(handle.read_calls(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn read_stalled_mid_transfer_times_out(connection: Scripted) {
    let (mut conn, handle) = connection;
    handle.push_chunks([vec![1, 2, 3]]);
    let mut read = ReadExact::new(5);

    assert!(poll_once(|cx| read.poll(&mut conn, cx)).is_pending());
    assert!(poll_once(|cx| read.poll(&mut conn, cx)).is_pending());

    time::advance(Duration::from_millis(1001)).await;
    assert!(matches!(
        poll_once(|cx| read.poll(&mut conn, cx)),
        Poll::Ready(Err(TransportError::TooSlow { direction: Direction::Read, .. }))
    ));
    assert!(handle.is_closed());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn each_read_gets_a_fresh_window(connection: Scripted) {
    let (conn, handle) = connection;
    let mut conn = conn.with_read_timeout(Duration::from_secs(2));
    handle.push_chunks([vec![1, 2], vec![3, 4]]);
    let mut read = ReadExact::new(2);

    let (first, _) = drive(|cx| read.poll(&mut conn, cx), DEFAULT_TURNS).expect("first read");
    assert_eq!(&first.expect("first")[..], &[1, 2]);
    assert!(conn.pending_since(Direction::Read).is_none());

    time::advance(Duration::from_secs(5)).await;
    let (second, _) = drive(|cx| read.poll(&mut conn, cx), DEFAULT_TURNS).expect("second read");
    assert_eq!(&second.expect("second")[..], &[3, 4]);
}

#[rstest]
#[tokio::test]
async fn async_read_exact_completes(connection: Scripted) {
    let (mut conn, handle) = connection;
    handle.push_chunks([vec![0xde], vec![0xad, 0xbe], vec![0xef]]);

    let bytes = conn.read_exact(4).await.expect("read");
    assert_eq!(&bytes[..], &[0xde, 0xad, 0xbe, 0xef]);
}
