// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rabbitwire Core
//!
//! Non-blocking socket transport for an AMQP-style messaging client. The
//! transport owns the raw socket and bridges an external reactor
//! (readiness-notification event loop) to the protocol layer above it.
//!
//! # Architecture
//!
//! - **Dialer**: resolves host:port into ordered address candidates,
//!   connects to the first that accepts, and performs the bounded
//!   blocking TLS handshake before switching the socket non-blocking.
//! - **SocketTransport**: dispatches reactor readiness events to the
//!   read/write paths, drains the outbound queue with partial-write
//!   continuation, and sequences disconnects.
//! - **OutboundQueue**: FIFO of byte frames; a short write's unsent
//!   suffix returns to the front so frames never reorder.
//! - **InterestTracker**: recomputes the READ/WRITE/ERROR interest mask
//!   from queue occupancy and re-registers only on change.
//! - **Classifier**: sorts socket errors into ignorable, fatal and
//!   TLS-negotiation-signal categories.
//! - **Phase resolver**: translates "the peer hung up" into the failure
//!   the protocol phase implies (handshake rejection, credential
//!   rejection, access denied) at disconnect time.
//!
//! # Example
//!
//! ```ignore
//! use rabbitwire_core::{SocketTransport, TransportConfig, TlsConfig};
//!
//! let config = TransportConfig::new("broker.example.com", 5671)
//!     .tls(TlsConfig::new());
//!
//! let mut transport = SocketTransport::new(config, reactor, sink);
//! transport.open();
//! transport.enqueue(frame_bytes)?;
//! // ... the reactor now drives transport.handle_events(...)
//! ```
//!
//! The reactor and the protocol layer are collaborators, not parts of
//! this crate: the reactor is consumed through the [`Reactor`] trait and
//! the protocol layer through the [`ProtocolSink`] callbacks. Framing,
//! heartbeat scheduling and channel flow control all live above.

pub mod classify;
pub mod config;
pub mod dialer;
pub mod error;
pub mod events;
pub mod mock;
pub mod phase;
pub mod queue;
pub mod reactor;
pub mod stream;
pub mod transport;

pub use classify::{classify, ErrorDisposition};
pub use config::{TlsConfig, TransportConfig};
pub use dialer::{connect_candidates, dial, DialOutcome};
pub use error::{SocketError, TransportError, TransportResult};
pub use events::{Direction, EventSet, InterestTracker};
pub use mock::{MockReactor, MockSink, ReadStep, ScriptedStream, WriteStep};
pub use phase::{resolve_disconnect, ConnectionPhase, DisconnectReason};
pub use queue::OutboundQueue;
pub use reactor::{Reactor, TimerHandle};
pub use stream::{SocketStream, WireStream};
pub use transport::{ProtocolSink, SocketTransport};
