// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Address Dialer
//!
//! Resolves host:port into an ordered candidate list, walks the
//! candidates until one connects, applies socket options, and performs
//! the bounded-blocking TLS handshake before handing the socket over to
//! the non-blocking phase.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use rustls::pki_types::ServerName;
use rustls::ClientConnection;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{error, info, warn};

use crate::config::{TlsConfig, TransportConfig};
use crate::error::{retry_on_interrupt, TransportError, TransportResult};
use crate::events::Direction;
use crate::stream::WireStream;

/// A successfully dialed connection.
#[derive(Debug)]
pub struct DialOutcome {
    /// The connected stream, already switched to non-blocking mode.
    pub stream: WireStream,
    /// Interest hint left over from the TLS handshake: `Write` means the
    /// session still has buffered records to flush.
    pub handshake_hint: Option<Direction>,
}

/// Resolve the configured endpoint and connect to the first candidate
/// that accepts.
///
/// Resolution retries transparently on interrupted syscalls; any other
/// resolution failure is fatal. Candidate failures keep the last error
/// seen, which becomes the overall failure if every candidate is
/// exhausted.
pub fn dial(config: &TransportConfig) -> TransportResult<DialOutcome> {
    let candidates = resolve(&config.host, config.port)?;
    connect_candidates(config, &candidates)
}

/// Walk an already resolved candidate list in order.
pub fn connect_candidates(
    config: &TransportConfig,
    candidates: &[SocketAddr],
) -> TransportResult<DialOutcome> {
    let mut last_error = TransportError::NoAddresses;

    for &addr in candidates {
        match connect_candidate(config, addr) {
            Ok(outcome) => return Ok(outcome),
            Err(err) => {
                warn!(%addr, %err, "candidate failed");
                last_error = err;
            }
        }
    }

    Err(last_error)
}

fn resolve(host: &str, port: u16) -> TransportResult<Vec<SocketAddr>> {
    let addrs = retry_on_interrupt(|| (host, port).to_socket_addrs()).map_err(|e| {
        error!(host, %e, "could not get addresses to use");
        TransportError::Resolution(e.to_string())
    })?;
    Ok(addrs.collect())
}

fn connect_candidate(config: &TransportConfig, addr: SocketAddr) -> TransportResult<DialOutcome> {
    let with_tls = config.tls.is_some();
    info!(%addr, tls = with_tls, "connecting");

    // The socket stays in blocking mode with a timeout until connect (and
    // the TLS handshake, if any) has completed.
    let tcp = open_socket(config, addr).map_err(|e| connection_failed(config, addr, &e))?;

    let (stream, handshake_hint) = match &config.tls {
        Some(tls) => {
            let (tls_stream, hint) = tls_handshake(config, tls, tcp, addr)?;
            (WireStream::Tls(tls_stream), hint)
        }
        None => (WireStream::Plain(tcp), None),
    };

    // Hand-off point from the synchronous dial phase to the event-driven
    // phase.
    stream
        .set_nonblocking(true)
        .map_err(|e| connection_failed(config, addr, &e))?;

    Ok(DialOutcome {
        stream,
        handshake_hint,
    })
}

fn open_socket(config: &TransportConfig, addr: SocketAddr) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_tcp_nodelay(true)?;
    socket.set_read_timeout(Some(config.connect_timeout))?;
    socket.set_write_timeout(Some(config.connect_timeout))?;

    retry_on_interrupt(|| socket.connect_timeout(&addr.into(), config.connect_timeout))?;

    Ok(socket.into())
}

/// Drive the TLS handshake to completion on the still-blocking socket.
///
/// Want-read/want-write signals from the session are serviced directly
/// and remembered as the interest hint for the non-blocking phase; any
/// other handshake failure aborts this candidate only.
fn tls_handshake(
    config: &TransportConfig,
    tls: &TlsConfig,
    mut tcp: TcpStream,
    addr: SocketAddr,
) -> TransportResult<(rustls::StreamOwned<ClientConnection, TcpStream>, Option<Direction>)> {
    let name = tls.server_name.clone().unwrap_or_else(|| config.host.clone());
    let server_name: ServerName<'_> = name
        .as_str()
        .try_into()
        .map_err(|_| TransportError::InvalidServerName(name.clone()))?;

    let mut conn = ClientConnection::new(tls.client_config(), server_name.to_owned())
        .map_err(|e| handshake_failed(config, addr, &e))?;

    while conn.is_handshaking() {
        if conn.wants_write() {
            retry_on_interrupt(|| conn.write_tls(&mut tcp))
                .map_err(|e| handshake_failed(config, addr, &e))?;
            continue;
        }
        if conn.wants_read() {
            let n = retry_on_interrupt(|| conn.read_tls(&mut tcp))
                .map_err(|e| handshake_failed(config, addr, &e))?;
            if n == 0 {
                return Err(handshake_failed(
                    config,
                    addr,
                    &"peer closed during handshake",
                ));
            }
            conn.process_new_packets()
                .map_err(|e| handshake_failed(config, addr, &e))?;
            continue;
        }
        break;
    }

    // Records buffered by the session still need flushing once the socket
    // reports writable.
    let hint = conn.wants_write().then_some(Direction::Write);

    Ok((rustls::StreamOwned::new(conn, tcp), hint))
}

fn connection_failed(
    config: &TransportConfig,
    addr: SocketAddr,
    error: &io::Error,
) -> TransportError {
    let reason = if error.kind() == io::ErrorKind::TimedOut {
        format!("{addr}: timeout")
    } else {
        format!("{addr}: {error}")
    };
    warn!(%addr, %error, "connection attempt failed");
    TransportError::ConnectionFailed {
        host: config.host.clone(),
        port: config.port,
        reason,
    }
}

fn handshake_failed(
    config: &TransportConfig,
    addr: SocketAddr,
    error: &dyn std::fmt::Display,
) -> TransportError {
    error!(%addr, %error, "TLS handshake failed");
    TransportError::TlsHandshake {
        host: config.host.clone(),
        port: config.port,
        reason: format!("{addr}: {error}"),
    }
}
