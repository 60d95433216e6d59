//! Port Interfaces
//!
//! Contracts that infrastructure adapters implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `TransportFactory`: opens sockets to the trading terminal
//! - `TerminalTransport`: one open lockstep request/reply socket

mod transport_port;

pub use transport_port::{TerminalTransport, TransportError, TransportFactory};

#[cfg(test)]
pub use transport_port::MockTransportFactory;
