// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Error Types
//!
//! Error types for connection establishment and socket I/O.

use std::io;

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors surfaced across the transport's public boundary.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Address resolution failed: {0}")]
    Resolution(String),

    #[error("No socket addresses available")]
    NoAddresses,

    #[error("Connection to {host}:{port} failed: {reason}")]
    ConnectionFailed {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("TLS handshake with {host}:{port} failed: {reason}")]
    TlsHandshake {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Invalid TLS server name: {0}")]
    InvalidServerName(String),

    #[error("Transport not connected")]
    NotConnected,
}

/// Errors produced by the socket layer itself.
///
/// TLS want-signals are carried here because they arrive through the same
/// channel as real socket errors, even though they are not failures.
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("Socket error: {0}")]
    Os(#[from] io::Error),

    #[error("TLS wants more input")]
    TlsWantRead,

    #[error("TLS wants to flush output")]
    TlsWantWrite,

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),
}

impl SocketError {
    /// True for an interrupted-syscall condition (EINTR).
    pub fn is_interrupt(&self) -> bool {
        matches!(self, SocketError::Os(e) if e.kind() == io::ErrorKind::Interrupted)
    }

    /// True for a would-block condition (EAGAIN/EWOULDBLOCK).
    pub fn is_would_block(&self) -> bool {
        matches!(self, SocketError::Os(e) if e.kind() == io::ErrorKind::WouldBlock)
    }
}

/// Conditions that should be transparently retried.
pub(crate) trait Interruptible {
    fn is_interrupt(&self) -> bool;
}

impl Interruptible for io::Error {
    fn is_interrupt(&self) -> bool {
        self.kind() == io::ErrorKind::Interrupted
    }
}

impl Interruptible for SocketError {
    fn is_interrupt(&self) -> bool {
        SocketError::is_interrupt(self)
    }
}

/// Retry an operation for as long as it fails with an interrupted syscall.
///
/// Used uniformly by resolution, connect, read and write paths so the
/// retry loop exists in exactly one place.
pub(crate) fn retry_on_interrupt<T, E, F>(mut op: F) -> Result<T, E>
where
    E: Interruptible,
    F: FnMut() -> Result<T, E>,
{
    loop {
        match op() {
            Err(e) if e.is_interrupt() => continue,
            other => return other,
        }
    }
}
