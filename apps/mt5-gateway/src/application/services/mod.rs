//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `GatewayConnector`: Serialized request/reply client for the terminal
//! - `ReconnectSupervisor`: Restores the connection after it drops
//! - `BackoffPolicy`: Delay schedule used by the supervisor

mod backoff;
mod gateway_connector;
mod reconnect_supervisor;

pub use backoff::{BackoffConfig, BackoffPolicy};
pub use gateway_connector::{ConnectorConfig, ConnectorStats, GatewayConnector};
pub use reconnect_supervisor::ReconnectSupervisor;
