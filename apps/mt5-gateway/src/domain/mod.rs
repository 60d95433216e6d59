//! Domain Layer - Terminal protocol and order types.
//!
//! Pure types with serialization support and no I/O.

/// Connection lifecycle state.
pub mod connection;

/// Order direction, wire order type, ticket and order request.
pub mod order;

/// Request/reply envelopes exchanged with the terminal.
pub mod protocol;
