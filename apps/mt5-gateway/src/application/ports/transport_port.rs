//! Terminal Transport Port (Driven Port)
//!
//! Interface for the message socket that carries request/reply frames to the
//! trading terminal. A transport is strictly lockstep: after `send` the only
//! legal next call is `recv`. Callers enforce that discipline; adapters may
//! reject violations with `TransportError::Send`.

use async_trait::async_trait;

/// Transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The endpoint could not be opened.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The request frame could not be transmitted.
    #[error("send failed: {0}")]
    Send(String),

    /// The reply frame could not be received.
    #[error("receive failed: {0}")]
    Receive(String),

    /// A frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl TransportError {
    /// Whether the socket's request/reply alignment may have been lost.
    ///
    /// Codec failures happen either before anything is sent or after a full
    /// reply arrived, so the socket stays usable.
    #[must_use]
    pub const fn breaks_lockstep(&self) -> bool {
        !matches!(self, Self::Codec(_))
    }

    /// Short label for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Send(_) => "send",
            Self::Receive(_) => "receive",
            Self::Codec(_) => "codec",
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

/// An open request/reply socket to the terminal.
///
/// Dropping the transport releases the socket immediately, discarding any
/// unsent data.
#[async_trait]
pub trait TerminalTransport: Send {
    /// Transmit one request frame.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Wait for the reply to the last request.
    ///
    /// Has no timeout of its own; callers bound it.
    async fn recv(&mut self) -> Result<String, TransportError>;
}

/// Opens fresh transports to an endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Open a new transport connected to `endpoint` (e.g. `tcp://localhost:8222`).
    async fn open(&self, endpoint: &str) -> Result<Box<dyn TerminalTransport>, TransportError>;

    /// Adapter name for logging.
    fn name(&self) -> &'static str;
}
