// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wire Streams
//!
//! The socket handle the transport drives: a plain TCP stream or one
//! wrapped by TLS, behind a single trait so tests can substitute a
//! scripted stand-in.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::fd::{AsRawFd, RawFd};

use rustls::{ClientConnection, StreamOwned};

use crate::error::SocketError;

/// Byte stream backed by a connected socket.
///
/// All calls are non-blocking once the dial phase has handed the socket
/// over; suspension is expressed as a would-block error, never by
/// blocking the caller.
pub trait SocketStream {
    /// Read into `buf`, returning the number of bytes read. Zero means
    /// the peer closed the connection.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SocketError>;

    /// Write from `buf`, returning the number of bytes accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, SocketError>;

    /// Shut the socket down in both directions.
    fn shutdown(&mut self) -> io::Result<()>;

    /// The underlying descriptor, for reactor registration.
    fn fd(&self) -> RawFd;
}

/// A connected stream that may or may not be TLS-encrypted.
pub enum WireStream {
    Plain(TcpStream),
    Tls(StreamOwned<ClientConnection, TcpStream>),
}

impl WireStream {
    fn tcp(&self) -> &TcpStream {
        match self {
            WireStream::Plain(stream) => stream,
            WireStream::Tls(stream) => &stream.sock,
        }
    }

    /// Switch the underlying socket between blocking and non-blocking
    /// mode. TLS readiness semantics follow the descriptor's.
    pub(crate) fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        self.tcp().set_nonblocking(nonblocking)
    }
}

impl SocketStream for WireStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SocketError> {
        let n = match self {
            WireStream::Plain(stream) => stream.read(buf)?,
            WireStream::Tls(stream) => stream.read(buf)?,
        };
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, SocketError> {
        let n = match self {
            WireStream::Plain(stream) => stream.write(buf)?,
            WireStream::Tls(stream) => stream.write(buf)?,
        };
        Ok(n)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.tcp().shutdown(Shutdown::Both)
    }

    fn fd(&self) -> RawFd {
        self.tcp().as_raw_fd()
    }
}

impl std::fmt::Debug for WireStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireStream::Plain(_) => write!(f, "WireStream::Plain(fd={})", self.fd()),
            WireStream::Tls(_) => write!(f, "WireStream::Tls(fd={})", self.fd()),
        }
    }
}
