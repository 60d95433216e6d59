//! Gateway Errors
//!
//! Typed failures surfaced by the connector. Every variant carries a stable
//! machine code so callers (and the HTTP layer) can react without parsing
//! messages.

use std::time::Duration;

use crate::application::ports::TransportError;
use crate::domain::protocol::Action;

/// Failure of a connector operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// No live transport is held.
    #[error("not connected to trading terminal")]
    NotConnected,

    /// No reply arrived within the request window.
    ///
    /// The connector has torn the transport down; a reconnect is required.
    #[error("{action} timed out after {}ms", timeout.as_millis())]
    Timeout {
        /// The action that was in flight.
        action: Action,
        /// The window that elapsed.
        timeout: Duration,
    },

    /// Any other transport or codec failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl GatewayError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotConnected => "NOT_CONNECTED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Transport(_) => "TRANSPORT_ERROR",
        }
    }

    /// Whether a later retry on a fresh connection may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::NotConnected | Self::Timeout { .. } => true,
            Self::Transport(err) => err.breaks_lockstep(),
        }
    }
}
