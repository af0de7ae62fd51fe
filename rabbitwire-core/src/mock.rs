// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Collaborators
//!
//! Recording implementations of the reactor, protocol sink and socket
//! stream for testing transports without a network or an event loop.

use std::collections::VecDeque;
use std::io;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{SocketError, TransportError};
use crate::events::EventSet;
use crate::phase::{ConnectionPhase, DisconnectReason};
use crate::reactor::{Reactor, TimerHandle};
use crate::stream::SocketStream;
use crate::transport::ProtocolSink;

/// Reactor that records every call made to it.
#[derive(Default)]
pub struct MockReactor {
    /// `register_initial` calls.
    pub registrations: Vec<(RawFd, EventSet)>,
    /// `update_interest` calls.
    pub interest_updates: Vec<(RawFd, EventSet)>,
    /// `unregister` calls.
    pub unregistered: Vec<RawFd>,
    /// Deadlines of scheduled timers.
    pub timers: Vec<(TimerHandle, Duration)>,
    /// Cancelled timer handles.
    pub cancelled_timers: Vec<TimerHandle>,
    /// Number of `stop` calls.
    pub stop_calls: usize,
    next_timer: u64,
}

impl MockReactor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reactor for MockReactor {
    fn register_initial(&mut self, fd: RawFd, mask: EventSet) {
        self.registrations.push((fd, mask));
    }

    fn update_interest(&mut self, fd: RawFd, mask: EventSet) {
        self.interest_updates.push((fd, mask));
    }

    fn unregister(&mut self, fd: RawFd) {
        self.unregistered.push(fd);
    }

    fn add_timer(&mut self, deadline: Duration, _callback: Box<dyn FnOnce()>) -> TimerHandle {
        self.next_timer += 1;
        let handle = TimerHandle(self.next_timer);
        self.timers.push((handle, deadline));
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.cancelled_timers.push(handle);
    }

    fn stop(&mut self) {
        self.stop_calls += 1;
    }
}

/// Protocol sink that records delivered bytes and lifecycle events.
pub struct MockSink {
    /// Buffers passed to `deliver`, in order.
    pub delivered: Vec<Vec<u8>>,
    /// Number of `connection_opened` calls.
    pub opened: usize,
    /// Errors passed to `connection_open_failed`.
    pub open_failures: Vec<TransportError>,
    /// Reasons passed to `connection_closed`, one entry per call.
    pub closed: Vec<Option<DisconnectReason>>,
    /// Phase reported to the transport.
    pub phase: ConnectionPhase,
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSink {
    pub fn new() -> Self {
        MockSink {
            delivered: Vec::new(),
            opened: 0,
            open_failures: Vec::new(),
            closed: Vec::new(),
            phase: ConnectionPhase::Open,
        }
    }

    /// Start in the given phase.
    pub fn in_phase(phase: ConnectionPhase) -> Self {
        MockSink {
            phase,
            ..Self::new()
        }
    }

    /// All delivered bytes, concatenated.
    pub fn delivered_bytes(&self) -> Vec<u8> {
        self.delivered.concat()
    }
}

impl ProtocolSink for MockSink {
    fn deliver(&mut self, data: &[u8]) {
        self.delivered.push(data.to_vec());
    }

    fn connection_opened(&mut self) {
        self.opened += 1;
    }

    fn connection_open_failed(&mut self, error: TransportError) {
        self.open_failures.push(error);
    }

    fn connection_closed(&mut self, reason: Option<DisconnectReason>) {
        self.closed.push(reason);
    }

    fn current_phase(&self) -> ConnectionPhase {
        self.phase
    }
}

/// One scripted outcome for a read attempt.
pub enum ReadStep {
    /// Deliver these bytes.
    Data(Vec<u8>),
    /// Nothing available right now.
    WouldBlock,
    /// Interrupted syscall; the caller is expected to retry.
    Interrupted,
    /// Peer closed the connection.
    Eof,
    /// Fail with this error.
    Fail(SocketError),
}

/// One scripted outcome for a write attempt.
pub enum WriteStep {
    /// Accept up to this many bytes.
    Accept(usize),
    /// The socket will not take more right now.
    WouldBlock,
    /// Interrupted syscall; the caller is expected to retry.
    Interrupted,
    /// Blocking-mode timeout.
    TimedOut,
    /// Fail with this error.
    Fail(SocketError),
}

/// Socket stream following a prewritten script.
///
/// Reads and writes consume their scripts front to back; an exhausted
/// script would-blocks on read and accepts everything on write. Bytes
/// accepted by writes are recorded.
pub struct ScriptedStream {
    fd: RawFd,
    reads: VecDeque<ReadStep>,
    writes: VecDeque<WriteStep>,
    written: Arc<Mutex<Vec<u8>>>,
    shutdown_calls: Arc<AtomicUsize>,
}

impl ScriptedStream {
    pub fn new(fd: RawFd) -> Self {
        ScriptedStream {
            fd,
            reads: VecDeque::new(),
            writes: VecDeque::new(),
            written: Arc::new(Mutex::new(Vec::new())),
            shutdown_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Append a read outcome to the script.
    pub fn push_read(mut self, step: ReadStep) -> Self {
        self.reads.push_back(step);
        self
    }

    /// Append a write outcome to the script.
    pub fn push_write(mut self, step: WriteStep) -> Self {
        self.writes.push_back(step);
        self
    }

    /// Counter shared with the stream; usable after the stream has been
    /// handed to a transport.
    pub fn shutdown_counter(&self) -> Arc<AtomicUsize> {
        self.shutdown_calls.clone()
    }

    /// Log of every byte accepted by a write, shared with the stream so
    /// it stays readable after the stream has been handed to a transport.
    pub fn written_log(&self) -> Arc<Mutex<Vec<u8>>> {
        self.written.clone()
    }
}

impl SocketStream for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SocketError> {
        match self.reads.pop_front() {
            Some(ReadStep::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                // A step larger than the buffer stays available for the
                // next read, like bytes left in a socket's receive buffer.
                if n < data.len() {
                    self.reads.push_front(ReadStep::Data(data[n..].to_vec()));
                }
                Ok(n)
            }
            Some(ReadStep::WouldBlock) | None => {
                Err(SocketError::Os(io::Error::from(io::ErrorKind::WouldBlock)))
            }
            Some(ReadStep::Interrupted) => {
                Err(SocketError::Os(io::Error::from(io::ErrorKind::Interrupted)))
            }
            Some(ReadStep::Eof) => Ok(0),
            Some(ReadStep::Fail(err)) => Err(err),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, SocketError> {
        match self.writes.pop_front() {
            Some(WriteStep::Accept(limit)) => {
                let n = limit.min(buf.len());
                self.written.lock().unwrap().extend_from_slice(&buf[..n]);
                Ok(n)
            }
            None => {
                self.written.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            Some(WriteStep::WouldBlock) => {
                Err(SocketError::Os(io::Error::from(io::ErrorKind::WouldBlock)))
            }
            Some(WriteStep::Interrupted) => {
                Err(SocketError::Os(io::Error::from(io::ErrorKind::Interrupted)))
            }
            Some(WriteStep::TimedOut) => {
                Err(SocketError::Os(io::Error::from(io::ErrorKind::TimedOut)))
            }
            Some(WriteStep::Fail(err)) => Err(err),
        }
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn fd(&self) -> RawFd {
        self.fd
    }
}
