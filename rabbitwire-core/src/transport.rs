// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Socket Transport
//!
//! Owns the connected socket and bridges the reactor's readiness
//! notifications to the protocol layer: reads are forwarded verbatim
//! through [`ProtocolSink::deliver`], outbound frames drain through the
//! write queue with partial-write continuation, and socket-level
//! disconnection is translated into a phase-specific failure before the
//! protocol layer hears about it.
//!
//! Everything here runs on the reactor's callback thread; there is no
//! internal locking because there is no concurrent mutation.

use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::classify::{classify, ErrorDisposition};
use crate::config::TransportConfig;
use crate::dialer;
use crate::error::{SocketError, TransportError, TransportResult};
use crate::events::{Direction, EventSet, InterestTracker};
use crate::phase::{resolve_disconnect, ConnectionPhase, DisconnectReason};
use crate::queue::OutboundQueue;
use crate::reactor::{Reactor, TimerHandle};
use crate::stream::SocketStream;

/// Callbacks into the protocol layer.
///
/// The transport holds the sink by value and drives it; the protocol
/// layer never subclasses the transport.
pub trait ProtocolSink {
    /// Inbound bytes, in arrival order, unframed.
    fn deliver(&mut self, data: &[u8]);

    /// The connection is established and registered with the reactor.
    fn connection_opened(&mut self);

    /// The connection could not be established.
    fn connection_open_failed(&mut self, error: TransportError);

    /// The connection is gone. `reason` carries the phase-specific
    /// interpretation when there is one.
    fn connection_closed(&mut self, reason: Option<DisconnectReason>);

    /// The protocol layer's current lifecycle phase (read-only here).
    fn current_phase(&self) -> ConnectionPhase;
}

/// Non-blocking socket transport driven by an external reactor.
pub struct SocketTransport<R: Reactor, S: ProtocolSink> {
    config: TransportConfig,
    reactor: R,
    sink: S,
    stream: Option<Box<dyn SocketStream>>,
    queue: OutboundQueue,
    interest: InterestTracker,
    liveness_timer: Option<TimerHandle>,
}

impl<R: Reactor, S: ProtocolSink> SocketTransport<R, S> {
    /// Create a transport. Nothing is connected until [`open`](Self::open).
    pub fn new(config: TransportConfig, reactor: R, sink: S) -> Self {
        SocketTransport {
            config,
            reactor,
            sink,
            stream: None,
            queue: OutboundQueue::new(),
            interest: InterestTracker::new(),
            liveness_timer: None,
        }
    }

    /// True while a socket is attached.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn reactor(&self) -> &R {
        &self.reactor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Frames still waiting to go out.
    pub fn outbound(&self) -> &OutboundQueue {
        &self.queue
    }

    /// Dial the configured endpoint and register with the reactor.
    ///
    /// Success and failure are both reported through the sink; a failed
    /// open leaves no socket or registration behind.
    pub fn open(&mut self) {
        match dialer::dial(&self.config) {
            Ok(outcome) => {
                self.attach(Box::new(outcome.stream), outcome.handshake_hint);
            }
            Err(err) => {
                error!(address = %self.config.address(), %err, "connection failed");
                self.sink.connection_open_failed(err);
            }
        }
    }

    /// Attach an externally established stream instead of dialing.
    pub fn open_with(&mut self, stream: Box<dyn SocketStream>) {
        self.attach(stream, None);
    }

    fn attach(&mut self, stream: Box<dyn SocketStream>, hint: Option<Direction>) {
        // Attaching over a live stream tears the old one down first so no
        // stale registration survives on the reactor.
        if let Some(mut old) = self.stream.take() {
            let old_fd = old.fd();
            debug!(fd = old_fd, "replacing an already-attached stream");
            if let Err(e) = old.shutdown() {
                debug!(%e, "shutdown failed on replaced stream");
            }
            self.reactor.unregister(old_fd);
        }

        let fd = stream.fd();
        self.stream = Some(stream);
        self.queue.clear();
        self.interest.reset();
        self.reactor.register_initial(fd, self.interest.current());
        if let Some(direction) = hint {
            if let Some(mask) = self.interest.apply_hint(direction) {
                self.reactor.update_interest(fd, mask);
            }
        }
        self.sink.connection_opened();
    }

    /// Queue a frame for transmission. Never blocks.
    ///
    /// The reactor's interest mask is updated (once) when the queue goes
    /// from empty to non-empty.
    pub fn enqueue(&mut self, frame: Vec<u8>) -> TransportResult<()> {
        if self.stream.is_none() {
            return Err(TransportError::NotConnected);
        }
        self.queue.enqueue(frame);
        self.update_interest();
        Ok(())
    }

    /// Reactor-driven event dispatch for this transport's descriptor.
    ///
    /// `write_only` restricts the call to flushing the outbound queue —
    /// with one exception: a write-only dispatch that nevertheless
    /// carries READ and ERROR together is taken as an unreliable reactor
    /// reporting a severed socket, and goes straight to disconnect.
    pub fn handle_events(
        &mut self,
        fd: RawFd,
        events: EventSet,
        error: Option<SocketError>,
        write_only: bool,
    ) {
        if self.stream.is_none() {
            // A stale registration can race a close.
            error!(fd, %events, "received events on closed socket");
            return;
        }

        if events.contains(EventSet::WRITE) {
            self.handle_write();
            self.update_interest();
        }

        if self.is_open() && !write_only && events.contains(EventSet::READ) {
            self.handle_read();
        }

        if self.is_open()
            && write_only
            && events.contains(EventSet::READ)
            && events.contains(EventSet::ERROR)
        {
            error!(fd, "write-only dispatch carried READ|ERROR, assuming severed socket");
            self.disconnect();
            return;
        }

        if self.is_open() && events.contains(EventSet::ERROR) {
            match error {
                Some(err) => {
                    error!(fd, %events, %err, "error event");
                    self.handle_error(err);
                }
                None => error!(fd, "error event carried no error value"),
            }
        }
    }

    /// Disconnect deliberately.
    ///
    /// Idempotent. Defaults used by protocol layers are 200 / "Normal
    /// shutdown".
    pub fn close(&mut self, reply_code: u16, reply_text: &str) {
        if self.stream.is_none() {
            debug!("close on already-closed transport");
            return;
        }
        info!(reply_code, reply_text, "closing transport");
        self.disconnect();
    }

    /// Schedule a timer on the reactor.
    pub fn add_timer(&mut self, deadline: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
        self.reactor.add_timer(deadline, callback)
    }

    /// Cancel a timer previously returned by [`add_timer`](Self::add_timer).
    pub fn cancel_timer(&mut self, handle: TimerHandle) {
        self.reactor.cancel_timer(handle);
    }

    /// Register the protocol layer's heartbeat timer so a disconnect can
    /// cancel it.
    pub fn track_liveness_timer(&mut self, handle: TimerHandle) {
        self.liveness_timer = Some(handle);
    }

    /// One bounded read attempt, forwarding any data to the sink.
    ///
    /// Returns the number of bytes delivered.
    fn handle_read(&mut self) -> usize {
        let mut buf = vec![0u8; self.config.read_buffer_size];

        let outcome = match self.stream.as_mut() {
            Some(stream) => loop {
                match stream.read(&mut buf) {
                    Err(err) if err.is_interrupt() => continue,
                    other => break other,
                }
            },
            None => return 0,
        };

        match outcome {
            Ok(0) => {
                // Peer closed cleanly. Pending writes are discarded, not
                // flushed.
                error!("read empty data, calling disconnect");
                self.disconnect();
                0
            }
            Ok(n) => {
                self.sink.deliver(&buf[..n]);
                n
            }
            Err(err) if err.is_would_block() => 0,
            Err(SocketError::TlsWantRead) => {
                // TLS wants more data than the socket currently has; wait
                // for the next readiness notification.
                0
            }
            Err(SocketError::Os(e)) if e.kind() == io::ErrorKind::TimedOut => {
                self.handle_timeout();
                0
            }
            Err(err) => {
                self.handle_error(err);
                0
            }
        }
    }

    /// Drain as much of the outbound queue as the socket accepts.
    ///
    /// A short write requeues the unsent suffix at the front and stops so
    /// ordering is preserved; would-block requeues the whole frame.
    /// Returns the total bytes sent this call.
    fn handle_write(&mut self) -> usize {
        let mut bytes_written = 0;

        while let Some(frame) = self.queue.pop_front() {
            let outcome = match self.stream.as_mut() {
                Some(stream) => loop {
                    match stream.write(&frame) {
                        Err(err) if err.is_interrupt() => continue,
                        other => break other,
                    }
                },
                None => {
                    self.queue.requeue_front(frame);
                    break;
                }
            };

            match outcome {
                Ok(n) if n < frame.len() => {
                    debug!(sent = n, total = frame.len(), "partial write, requeuing remainder");
                    bytes_written += n;
                    self.queue.requeue_front(frame[n..].to_vec());
                    break;
                }
                Ok(n) => {
                    bytes_written += n;
                }
                Err(err) if err.is_would_block() => {
                    debug!("would block, requeuing frame");
                    self.queue.requeue_front(frame);
                    break;
                }
                Err(SocketError::TlsWantWrite) => {
                    debug!("TLS wants flush, requeuing frame");
                    self.queue.requeue_front(frame);
                    break;
                }
                Err(SocketError::Os(e)) if e.kind() == io::ErrorKind::TimedOut => {
                    // Only reachable while the socket is still blocking.
                    debug!("socket timeout, requeuing frame");
                    self.queue.requeue_front(frame);
                    self.handle_timeout();
                    break;
                }
                Err(err) => {
                    self.handle_error(err);
                    break;
                }
            }
        }

        bytes_written
    }

    /// Timeouts only occur while the socket is in blocking mode during
    /// connect, so the non-blocking handlers have nothing to do.
    fn handle_timeout(&self) {}

    fn handle_error(&mut self, err: SocketError) {
        match classify(&err) {
            ErrorDisposition::Ignore => {
                debug!(%err, "ignoring transient socket error");
            }
            ErrorDisposition::Abort => {
                error!(%err, "fatal socket error");
                self.disconnect();
            }
            ErrorDisposition::Renegotiate(direction) => {
                if let Some(stream) = &self.stream {
                    let fd = stream.fd();
                    if let Some(mask) = self.interest.apply_hint(direction) {
                        self.reactor.update_interest(fd, mask);
                    }
                }
            }
            ErrorDisposition::Unknown => {
                error!(%err, "unrecognized socket error");
                self.disconnect();
            }
        }
    }

    /// The disconnect sequence. Always runs to completion in order,
    /// whichever path triggered it, leaving the instance reusable for a
    /// fresh open.
    fn disconnect(&mut self) {
        if let Some(handle) = self.liveness_timer.take() {
            self.reactor.cancel_timer(handle);
        }

        // Shutdown failures are swallowed; the socket is being discarded.
        let fd = self.stream.take().map(|mut stream| {
            let fd = stream.fd();
            if let Err(e) = stream.shutdown() {
                debug!(%e, "shutdown failed on teardown");
            }
            fd
        });

        let reason = resolve_disconnect(self.sink.current_phase());

        if let Some(fd) = fd {
            self.reactor.unregister(fd);
        }
        if self.config.stop_reactor_on_close {
            self.reactor.stop();
        } else {
            debug!("connection closed, reactor left running");
        }
        self.queue.clear();
        self.interest.reset();

        self.sink.connection_closed(reason);
    }

    fn update_interest(&mut self) {
        if let Some(stream) = &self.stream {
            let fd = stream.fd();
            if let Some(mask) = self.interest.recompute(!self.queue.is_empty()) {
                self.reactor.update_interest(fd, mask);
            }
        }
    }
}
