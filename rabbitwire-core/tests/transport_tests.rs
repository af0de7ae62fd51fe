// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the socket transport's event dispatch, write queue
//! continuation, error handling and disconnect sequencing, driven
//! through mock collaborators.

use std::io;
use std::net::TcpListener;
use std::time::Duration;

use rabbitwire_core::{
    ConnectionPhase, DisconnectReason, EventSet, MockReactor, MockSink, ReadStep, ScriptedStream,
    SocketError, SocketTransport, TransportConfig, TransportError, WriteStep,
};

const FD: i32 = 7;

fn transport() -> SocketTransport<MockReactor, MockSink> {
    transport_with_sink(MockSink::new())
}

fn transport_with_sink(sink: MockSink) -> SocketTransport<MockReactor, MockSink> {
    let config = TransportConfig::new("localhost", 5672);
    SocketTransport::new(config, MockReactor::new(), sink)
}

fn os_error(kind: io::ErrorKind) -> SocketError {
    SocketError::Os(io::Error::from(kind))
}

#[test]
fn test_open_with_registers_base_mask_and_signals_opened() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));

    assert!(transport.is_open());
    assert_eq!(transport.sink().opened, 1);
    assert_eq!(transport.reactor().registrations, vec![(FD, EventSet::BASE)]);
    assert!(transport.reactor().interest_updates.is_empty());
}

#[test]
fn test_enqueue_without_connection_fails() {
    let mut transport = transport();
    let result = transport.enqueue(b"frame".to_vec());
    assert!(matches!(result, Err(TransportError::NotConnected)));
}

#[test]
fn test_write_interest_added_once_and_removed_after_flush() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD);
    let written = stream.written_log();
    transport.open_with(Box::new(stream));

    transport.enqueue(b"hello ".to_vec()).unwrap();
    transport.enqueue(b"world".to_vec()).unwrap();

    // Two enqueues, one interest change.
    assert_eq!(
        transport.reactor().interest_updates,
        vec![(FD, EventSet::BASE | EventSet::WRITE)]
    );

    transport.handle_events(FD, EventSet::WRITE, None, false);

    // Everything flushed in enqueue order; interest back to base.
    assert_eq!(*written.lock().unwrap(), b"hello world".to_vec());
    assert!(transport.outbound().is_empty());
    assert_eq!(
        transport.reactor().interest_updates,
        vec![
            (FD, EventSet::BASE | EventSet::WRITE),
            (FD, EventSet::BASE),
        ]
    );
}

#[test]
fn test_partial_write_requeues_suffix_and_preserves_order() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD).push_write(WriteStep::Accept(2));
    let written = stream.written_log();
    transport.open_with(Box::new(stream));

    transport.enqueue(b"abcdef".to_vec()).unwrap();
    transport.enqueue(b"ghi".to_vec()).unwrap();
    transport.enqueue(b"jkl".to_vec()).unwrap();

    transport.handle_events(FD, EventSet::WRITE, None, false);

    // Only the first two bytes went out; the suffix leads the queue.
    assert_eq!(*written.lock().unwrap(), b"ab".to_vec());
    let frames: Vec<&[u8]> = transport.outbound().frames().collect();
    assert_eq!(frames, vec![b"cdef".as_ref(), b"ghi".as_ref(), b"jkl".as_ref()]);

    // The next writable event drains the rest, in order.
    transport.handle_events(FD, EventSet::WRITE, None, false);
    assert_eq!(*written.lock().unwrap(), b"abcdefghijkl".to_vec());
    assert!(transport.outbound().is_empty());
}

#[test]
fn test_no_mask_churn_across_partial_writes() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD)
        .push_write(WriteStep::Accept(2))
        .push_write(WriteStep::WouldBlock);
    transport.open_with(Box::new(stream));

    transport.enqueue(b"abcdef".to_vec()).unwrap();
    transport.handle_events(FD, EventSet::WRITE, None, false); // partial
    transport.handle_events(FD, EventSet::WRITE, None, false); // would-block
    transport.handle_events(FD, EventSet::WRITE, None, false); // drains

    // Exactly two updates: WRITE added on enqueue, removed after the
    // final flush. No churn in between.
    assert_eq!(
        transport.reactor().interest_updates,
        vec![
            (FD, EventSet::BASE | EventSet::WRITE),
            (FD, EventSet::BASE),
        ]
    );
}

#[test]
fn test_would_block_requeues_entire_frame() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD).push_write(WriteStep::WouldBlock);
    transport.open_with(Box::new(stream));

    transport.enqueue(b"frame".to_vec()).unwrap();
    transport.handle_events(FD, EventSet::WRITE, None, false);

    assert!(transport.is_open());
    let frames: Vec<&[u8]> = transport.outbound().frames().collect();
    assert_eq!(frames, vec![b"frame".as_ref()]);
}

#[test]
fn test_interrupted_write_is_retried_inline() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD).push_write(WriteStep::Interrupted);
    let written = stream.written_log();
    transport.open_with(Box::new(stream));

    transport.enqueue(b"frame".to_vec()).unwrap();
    transport.handle_events(FD, EventSet::WRITE, None, false);

    assert_eq!(*written.lock().unwrap(), b"frame".to_vec());
    assert!(transport.outbound().is_empty());
}

#[test]
fn test_write_timeout_requeues_frame() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD).push_write(WriteStep::TimedOut);
    transport.open_with(Box::new(stream));

    transport.enqueue(b"frame".to_vec()).unwrap();
    transport.handle_events(FD, EventSet::WRITE, None, false);

    assert!(transport.is_open());
    assert_eq!(transport.outbound().len(), 1);
}

#[test]
fn test_read_delivers_bytes_in_arrival_order() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD)
        .push_read(ReadStep::Data(b"first".to_vec()))
        .push_read(ReadStep::Data(b"second".to_vec()));
    transport.open_with(Box::new(stream));

    transport.handle_events(FD, EventSet::READ, None, false);
    transport.handle_events(FD, EventSet::READ, None, false);

    assert_eq!(
        transport.sink().delivered,
        vec![b"first".to_vec(), b"second".to_vec()]
    );
}

#[test]
fn test_interrupted_read_is_retried_inline() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD)
        .push_read(ReadStep::Interrupted)
        .push_read(ReadStep::Data(b"data".to_vec()));
    transport.open_with(Box::new(stream));

    transport.handle_events(FD, EventSet::READ, None, false);

    assert_eq!(transport.sink().delivered, vec![b"data".to_vec()]);
}

#[test]
fn test_would_block_read_waits_for_next_notification() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD).push_read(ReadStep::WouldBlock);
    transport.open_with(Box::new(stream));

    transport.handle_events(FD, EventSet::READ, None, false);

    assert!(transport.is_open());
    assert!(transport.sink().delivered.is_empty());
    assert!(transport.sink().closed.is_empty());
}

#[test]
fn test_eof_disconnects_and_discards_pending_writes() {
    let mut transport = transport();
    let stream = ScriptedStream::new(FD).push_read(ReadStep::Eof);
    let shutdowns = stream.shutdown_counter();
    transport.open_with(Box::new(stream));

    transport.enqueue(b"never sent".to_vec()).unwrap();
    transport.handle_events(FD, EventSet::READ, None, false);

    assert!(!transport.is_open());
    assert!(transport.outbound().is_empty());
    assert_eq!(transport.sink().closed.len(), 1);
    assert_eq!(transport.reactor().unregistered, vec![FD]);
    assert_eq!(shutdowns.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn test_ignorable_error_event_leaves_connection_open() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));

    for kind in [io::ErrorKind::WouldBlock, io::ErrorKind::Interrupted] {
        transport.handle_events(FD, EventSet::ERROR, Some(os_error(kind)), false);
        assert!(transport.is_open());
        assert!(transport.sink().closed.is_empty());
    }
}

#[test]
fn test_abort_error_event_disconnects_exactly_once() {
    for kind in [io::ErrorKind::ConnectionAborted, io::ErrorKind::BrokenPipe] {
        let mut transport = transport();
        let stream = ScriptedStream::new(FD);
        let shutdowns = stream.shutdown_counter();
        transport.open_with(Box::new(stream));

        transport.handle_events(FD, EventSet::ERROR, Some(os_error(kind)), false);

        assert!(!transport.is_open());
        assert_eq!(transport.sink().closed.len(), 1);
        assert_eq!(shutdowns.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}

#[test]
fn test_unknown_error_event_disconnects() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));

    transport.handle_events(
        FD,
        EventSet::ERROR,
        Some(os_error(io::ErrorKind::ConnectionReset)),
        false,
    );

    assert!(!transport.is_open());
    assert_eq!(transport.sink().closed.len(), 1);
}

#[test]
fn test_error_event_without_value_is_logged_and_ignored() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));

    transport.handle_events(FD, EventSet::ERROR, None, false);

    assert!(transport.is_open());
    assert!(transport.sink().closed.is_empty());
}

#[test]
fn test_tls_want_signals_update_interest_without_disconnecting() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));

    transport.handle_events(FD, EventSet::ERROR, Some(SocketError::TlsWantWrite), false);
    assert!(transport.is_open());
    assert_eq!(
        transport.reactor().interest_updates,
        vec![(FD, EventSet::BASE | EventSet::WRITE)]
    );

    transport.handle_events(FD, EventSet::ERROR, Some(SocketError::TlsWantRead), false);
    assert!(transport.is_open());
    assert_eq!(
        transport.reactor().interest_updates,
        vec![
            (FD, EventSet::BASE | EventSet::WRITE),
            (FD, EventSet::BASE),
        ]
    );
    assert!(transport.sink().closed.is_empty());
}

#[test]
fn test_write_only_dispatch_with_read_and_error_disconnects() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));

    transport.handle_events(FD, EventSet::READ | EventSet::ERROR, None, true);

    assert!(!transport.is_open());
    assert_eq!(transport.sink().closed.len(), 1);
}

#[test]
fn test_disconnect_reason_follows_protocol_phase() {
    let cases = [
        (
            ConnectionPhase::ProtocolHandshake,
            Some(DisconnectReason::IncompatibleProtocol),
        ),
        (
            ConnectionPhase::Authenticating,
            Some(DisconnectReason::ProbableAuthenticationFailure),
        ),
        (
            ConnectionPhase::Tuning,
            Some(DisconnectReason::ProbableAccessDenied),
        ),
        (ConnectionPhase::Open, None),
        (ConnectionPhase::Closing, None),
    ];

    for (phase, expected) in cases {
        let mut transport = transport_with_sink(MockSink::in_phase(phase));
        transport.open_with(Box::new(ScriptedStream::new(FD)));

        transport.handle_events(
            FD,
            EventSet::ERROR,
            Some(os_error(io::ErrorKind::BrokenPipe)),
            false,
        );

        assert_eq!(transport.sink().closed, vec![expected], "phase {phase}");
    }
}

#[test]
fn test_close_is_idempotent_and_stops_reactor() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));

    transport.close(200, "Normal shutdown");
    transport.close(200, "Normal shutdown");

    assert_eq!(transport.sink().closed.len(), 1);
    assert_eq!(transport.reactor().stop_calls, 1);
    assert_eq!(transport.reactor().unregistered, vec![FD]);
}

#[test]
fn test_close_can_leave_reactor_running() {
    let config = TransportConfig::new("localhost", 5672).keep_reactor_on_close();
    let mut transport = SocketTransport::new(config, MockReactor::new(), MockSink::new());
    transport.open_with(Box::new(ScriptedStream::new(FD)));

    transport.close(200, "Normal shutdown");

    assert_eq!(transport.reactor().stop_calls, 0);
    assert_eq!(transport.sink().closed.len(), 1);
}

#[test]
fn test_stale_events_after_close_are_ignored() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));
    transport.close(200, "Normal shutdown");

    transport.handle_events(FD, EventSet::READ | EventSet::WRITE, None, false);

    assert!(transport.sink().delivered.is_empty());
    assert_eq!(transport.sink().closed.len(), 1);
}

#[test]
fn test_enqueue_after_close_fails() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));
    transport.close(200, "Normal shutdown");

    assert!(matches!(
        transport.enqueue(b"late".to_vec()),
        Err(TransportError::NotConnected)
    ));
}

#[test]
fn test_timer_delegation() {
    let mut transport = transport();
    let handle = transport.add_timer(Duration::from_secs(5), Box::new(|| {}));

    assert_eq!(transport.reactor().timers.len(), 1);
    assert_eq!(transport.reactor().timers[0].0, handle);

    transport.cancel_timer(handle);
    assert_eq!(transport.reactor().cancelled_timers, vec![handle]);
}

#[test]
fn test_liveness_timer_cancelled_on_disconnect() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));

    let handle = transport.add_timer(Duration::from_secs(30), Box::new(|| {}));
    transport.track_liveness_timer(handle);
    transport.close(200, "Normal shutdown");

    assert_eq!(transport.reactor().cancelled_timers, vec![handle]);
}

#[test]
fn test_open_failure_reports_through_sink_and_leaves_no_registration() {
    let config = TransportConfig::new("host-that-does-not-resolve.invalid", 5672);
    let mut transport = SocketTransport::new(config, MockReactor::new(), MockSink::new());

    transport.open();

    assert!(!transport.is_open());
    assert_eq!(transport.sink().open_failures.len(), 1);
    assert_eq!(transport.sink().opened, 0);
    assert!(transport.reactor().registrations.is_empty());
    assert!(transport.reactor().interest_updates.is_empty());
}

#[test]
fn test_open_dials_and_registers_with_base_interest() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = TransportConfig::new("127.0.0.1", port);
    let mut transport = SocketTransport::new(config, MockReactor::new(), MockSink::new());

    transport.open();
    listener.accept().unwrap();

    assert!(transport.is_open());
    assert_eq!(transport.sink().opened, 1);
    assert!(transport.sink().open_failures.is_empty());
    assert_eq!(transport.reactor().registrations.len(), 1);
    assert_eq!(transport.reactor().registrations[0].1, EventSet::BASE);
    // No TLS, so no handshake hint and no interest change on attach.
    assert!(transport.reactor().interest_updates.is_empty());
}

#[test]
fn test_reattach_tears_down_the_previous_stream() {
    let mut transport = transport();
    let first = ScriptedStream::new(FD);
    let shutdowns = first.shutdown_counter();
    transport.open_with(Box::new(first));

    transport.open_with(Box::new(ScriptedStream::new(FD + 1)));

    // The replaced stream is shut down and its registration removed.
    assert_eq!(shutdowns.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(transport.reactor().unregistered, vec![FD]);
    assert_eq!(
        transport.reactor().registrations,
        vec![(FD, EventSet::BASE), (FD + 1, EventSet::BASE)]
    );
    assert_eq!(transport.sink().opened, 2);
}

#[test]
fn test_read_larger_than_buffer_is_delivered_in_chunks() {
    let config = TransportConfig::new("localhost", 5672).read_buffer_size(4);
    let mut transport = SocketTransport::new(config, MockReactor::new(), MockSink::new());
    let stream = ScriptedStream::new(FD).push_read(ReadStep::Data(b"abcdefgh".to_vec()));
    transport.open_with(Box::new(stream));

    transport.handle_events(FD, EventSet::READ, None, false);
    transport.handle_events(FD, EventSet::READ, None, false);

    assert_eq!(
        transport.sink().delivered,
        vec![b"abcd".to_vec(), b"efgh".to_vec()]
    );
}

#[test]
fn test_transport_is_reusable_after_disconnect() {
    let mut transport = transport();
    transport.open_with(Box::new(ScriptedStream::new(FD)));
    transport.close(200, "Normal shutdown");

    transport.open_with(Box::new(ScriptedStream::new(FD + 1)));

    assert!(transport.is_open());
    assert_eq!(transport.sink().opened, 2);
    assert_eq!(transport.reactor().registrations.len(), 2);
    transport.enqueue(b"fresh".to_vec()).unwrap();
    assert_eq!(transport.outbound().len(), 1);
}
