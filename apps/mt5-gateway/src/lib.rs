#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! MT5 Gateway - Trading Terminal Connector
//!
//! Bridges the backend to a MetaTrader 5 terminal over a ZeroMQ request/reply
//! socket. One connector owns the socket, serializes every exchange behind a
//! FIFO async mutex, bounds each exchange with a timeout and maps transport
//! failures into typed errors.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Protocol envelopes and trading types
//!   - `connection`: Connection lifecycle state
//!   - `order`: Order direction, ticket and order request
//!   - `protocol`: Request and reply envelopes
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Terminal transport interfaces
//!   - `services`: Gateway connector, backoff and reconnect supervisor
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `zmq`: ZeroMQ `REQ` transport
//!   - `mock`: Scripted in-memory terminal
//!   - `config`: Environment configuration
//!   - `http`: Health, metrics and trading endpoints
//!   - `metrics`, `telemetry`: Observability
//!
//! # Data Flow
//!
//! ```text
//! HTTP handlers ──┐
//!                 │     ┌──────────────────┐     ┌───────────┐
//!                 ├────►│ GatewayConnector │────►│ REQ socket│────► MT5 terminal
//! Supervisor ─────┘     │  (FIFO mutex)    │◄────│           │◄────
//!                       └──────────────────┘     └───────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Protocol and trading types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Connector error type.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::connection::ConnectionState;
pub use domain::order::{DEFAULT_ORDER_COMMENT, OrderDirection, OrderRequest, Ticket};
pub use domain::protocol::{Action, Command, TerminalResponse};

// Application
pub use application::ports::{TerminalTransport, TransportError, TransportFactory};
pub use application::services::{
    BackoffConfig, BackoffPolicy, ConnectorConfig, ConnectorStats, GatewayConnector,
    ReconnectSupervisor,
};
pub use error::GatewayError;

// Infrastructure config
pub use infrastructure::config::{
    ConfigError, Environment, GatewayConfig, ReconnectSettings, ServerSettings, TerminalSettings,
};

// Transports
pub use infrastructure::mock::{MockReply, MockTerminal};
pub use infrastructure::zmq::ZmqTransportFactory;

// HTTP
pub use infrastructure::http::{AppState, HttpServer, HttpServerError, create_router};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
