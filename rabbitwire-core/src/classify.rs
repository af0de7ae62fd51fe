// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Socket Error Classification
//!
//! Maps OS-level socket errors into the small set of reactions the
//! transport knows how to take.

use std::io;

use crate::error::SocketError;
use crate::events::Direction;

/// What to do with a socket error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Transient condition; keep going as if nothing happened.
    Ignore,
    /// The socket is gone; disconnect.
    Abort,
    /// Not an error: TLS needs the socket ready in this direction.
    Renegotiate(Direction),
    /// Unrecognized; logged and treated as fatal rather than swallowed.
    Unknown,
}

/// Classify a socket error.
///
/// The ignore set (would-block, interrupted) normally never reaches this
/// point because the read/write paths retry those inline; if one leaks
/// through anyway it is still ignored, not escalated.
pub fn classify(error: &SocketError) -> ErrorDisposition {
    match error {
        SocketError::TlsWantRead => ErrorDisposition::Renegotiate(Direction::Read),
        SocketError::TlsWantWrite => ErrorDisposition::Renegotiate(Direction::Write),
        SocketError::Os(e) => classify_os(e),
        SocketError::Tls(_) => ErrorDisposition::Unknown,
    }
}

fn classify_os(error: &io::Error) -> ErrorDisposition {
    match error.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => ErrorDisposition::Ignore,
        io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe => ErrorDisposition::Abort,
        // EBADF has no stable ErrorKind mapping.
        _ if error.raw_os_error() == Some(libc::EBADF) => ErrorDisposition::Abort,
        _ => ErrorDisposition::Unknown,
    }
}
