// SPDX-FileCopyrightText: 2026 Rabbitwire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Connection Phase + Disconnect Resolution
//!
//! The protocol layer owns the connection lifecycle phase; this module
//! only reads it at disconnect time to decide what failure, if any, the
//! disconnection actually means. A hangup during authentication is almost
//! certainly a credential rejection, not a network blip.

use thiserror::Error;
use tracing::{error, warn};

/// Protocol-level connection lifecycle stage.
///
/// Advanced only by the protocol layer; the transport never mutates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    Resolving,
    Connecting,
    ProtocolHandshake,
    Authenticating,
    Tuning,
    Open,
    Closing,
    Closed,
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolving => write!(f, "Resolving"),
            Self::Connecting => write!(f, "Connecting"),
            Self::ProtocolHandshake => write!(f, "ProtocolHandshake"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Tuning => write!(f, "Tuning"),
            Self::Open => write!(f, "Open"),
            Self::Closing => write!(f, "Closing"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Phase-specific interpretation of a disconnection.
///
/// A tagged result rather than a raised exception: callers pattern-match.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    #[error("Incompatible protocol: peer rejected the protocol header")]
    IncompatibleProtocol,

    #[error("Socket closed while authenticating: probable authentication failure")]
    ProbableAuthenticationFailure,

    #[error("Socket closed while tuning: probable access denied to the virtual host")]
    ProbableAccessDenied,
}

/// Interpret a disconnection given the phase the protocol layer was in.
///
/// Disconnecting while `Open` is benign (logged only); `Closing`/`Closed`
/// are expected; any other phase is logged as an unknown state.
pub fn resolve_disconnect(phase: ConnectionPhase) -> Option<DisconnectReason> {
    match phase {
        ConnectionPhase::ProtocolHandshake => {
            error!("incompatible protocol versions");
            Some(DisconnectReason::IncompatibleProtocol)
        }
        ConnectionPhase::Authenticating => {
            error!("socket closed while authenticating, probable authentication error");
            Some(DisconnectReason::ProbableAuthenticationFailure)
        }
        ConnectionPhase::Tuning => {
            error!("socket closed while tuning, probable access error for the virtual host");
            Some(DisconnectReason::ProbableAccessDenied)
        }
        ConnectionPhase::Open => {
            warn!("socket closed while connection was open");
            None
        }
        ConnectionPhase::Closing | ConnectionPhase::Closed => None,
        other => {
            warn!(phase = %other, "unknown state on disconnect");
            None
        }
    }
}
