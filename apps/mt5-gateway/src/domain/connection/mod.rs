//! Connection State
//!
//! Lifecycle of the single logical connection to the trading terminal.
//!
//! ```text
//! Disconnected ──connect──► Connecting ──ping ok──► Connected
//!      ▲                        │                       │
//!      └────────failure─────────┘                       │
//!      └──────disconnect / timeout / socket error───────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No transport held.
    #[default]
    Disconnected,
    /// Transport opened, liveness probe in progress.
    Connecting,
    /// Transport live and aligned.
    Connected,
}

impl ConnectionState {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }

    /// Numeric code used by the state gauge.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
        }
    }

    /// Whether the transition `self -> next` is part of the lifecycle.
    ///
    /// Self-transitions are allowed so idempotent operations can republish.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting | Self::Disconnected)
                | (Self::Connecting, Self::Connected | Self::Disconnected)
                | (Self::Connected, Self::Disconnected | Self::Connected)
        )
    }

    /// Whether the state is `Connected`.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn lifecycle_transitions() {
        use ConnectionState::{Connected, Connecting, Disconnected};

        assert!(Disconnected.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connecting.can_transition_to(Disconnected));
        assert!(Connected.can_transition_to(Disconnected));

        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Connecting));
    }

    #[test]
    fn codes_and_names() {
        assert_eq!(ConnectionState::Disconnected.code(), 0);
        assert_eq!(ConnectionState::Connecting.code(), 1);
        assert_eq!(ConnectionState::Connected.code(), 2);
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(
            serde_json::to_string(&ConnectionState::Connecting).unwrap(),
            "\"connecting\""
        );
    }
}
