//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the connector service and the port interfaces that
//! define how it reaches the trading terminal.

/// Port interfaces for the terminal transport.
pub mod ports;

/// Connector, backoff and reconnect supervision.
pub mod services;
