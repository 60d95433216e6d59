//! ZeroMQ Transport Adapter
//!
//! Implements the terminal transport ports on a ZeroMQ `REQ` socket. Each
//! request and each reply is a single UTF-8 frame.
//!
//! The socket has no linger: dropping the transport closes it immediately
//! and discards anything still queued.

use async_trait::async_trait;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::application::ports::{TerminalTransport, TransportError, TransportFactory};

/// Opens ZeroMQ `REQ` sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZmqTransportFactory;

impl ZmqTransportFactory {
    /// Create a new factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransportFactory for ZmqTransportFactory {
    async fn open(&self, endpoint: &str) -> Result<Box<dyn TerminalTransport>, TransportError> {
        let mut socket = ReqSocket::new();
        socket
            .connect(endpoint)
            .await
            .map_err(|e| TransportError::Connect(format!("{endpoint}: {e}")))?;

        tracing::debug!(endpoint, "ZeroMQ REQ socket connected");
        Ok(Box::new(ZmqReqTransport { socket }))
    }

    fn name(&self) -> &'static str {
        "zeromq"
    }
}

/// A connected `REQ` socket.
pub struct ZmqReqTransport {
    socket: ReqSocket,
}

impl std::fmt::Debug for ZmqReqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqReqTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl TerminalTransport for ZmqReqTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.socket
            .send(ZmqMessage::from(frame))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        let message = self
            .socket
            .recv()
            .await
            .map_err(|e| TransportError::Receive(e.to_string()))?;

        String::try_from(message).map_err(|e| TransportError::Codec(e.to_string()))
    }
}
