//! HTTP Surface
//!
//! Health probes, metrics and the trading API.

mod response;
mod routes;
mod server;

pub use response::{
    ApiError, ConnectionStatusResponse, DataResponse, ErrorBody, HealthResponse, HealthStatus,
    PositionsResponse, TerminalStatus,
};
pub use routes::{AppState, create_router};
pub use server::{HttpServer, HttpServerError};
