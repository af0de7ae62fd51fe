// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Configuration
//!
//! Connection parameters for the socket transport.

use std::sync::Arc;
use std::time::Duration;

/// TLS settings for the transport.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Server name for SNI and certificate validation. Defaults to the
    /// configured host when unset.
    pub server_name: Option<String>,
}

impl TlsConfig {
    /// TLS with the connection host as server name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the server name used for SNI and validation.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Build a rustls client config trusting the webpki root set.
    pub(crate) fn client_config(&self) -> Arc<rustls::ClientConfig> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        )
    }
}

/// Configuration for a transport connection.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Broker host to connect to.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Timeout governing connect and the blocking TLS handshake phase.
    pub connect_timeout: Duration,
    /// Upper bound for a single read attempt.
    pub read_buffer_size: usize,
    /// TLS settings. `None` connects in the clear.
    pub tls: Option<TlsConfig>,
    /// Whether closing this transport also stops the shared reactor.
    pub stop_reactor_on_close: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            host: String::new(),
            port: 5672,
            connect_timeout: Duration::from_secs(10),
            read_buffer_size: 8192,
            tls: None,
            stop_reactor_on_close: true,
        }
    }
}

impl TransportConfig {
    /// Create a configuration for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        TransportConfig {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the connect-phase timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read chunk size.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Enable TLS.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Keep the reactor running when this transport closes.
    pub fn keep_reactor_on_close(mut self) -> Self {
        self.stop_reactor_on_close = false;
        self
    }

    /// The address string (host:port).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
