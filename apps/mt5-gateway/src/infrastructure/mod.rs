//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the process-level ambient stack.

/// ZeroMQ transport adapter.
pub mod zmq;

/// In-memory scripted terminal for tests.
pub mod mock;

/// Environment-driven configuration.
pub mod config;

/// Health, metrics and trading HTTP endpoints.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging and OpenTelemetry tracing setup.
pub mod telemetry;
