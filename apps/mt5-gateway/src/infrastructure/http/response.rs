//! HTTP Response Types
//!
//! JSON bodies returned by the HTTP surface, and the mapping from connector
//! errors to status codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::services::ConnectorStats;
use crate::domain::connection::ConnectionState;
use crate::error::GatewayError;

// =============================================================================
// Health
// =============================================================================

/// Overall service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Terminal connected.
    Healthy,
    /// Serving, but the terminal is unavailable.
    Degraded,
}

impl HealthStatus {
    /// Status implied by a connection state.
    #[must_use]
    pub const fn from_connection(state: ConnectionState) -> Self {
        if state.is_connected() {
            Self::Healthy
        } else {
            Self::Degraded
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Terminal connection details.
    pub mt5: TerminalStatus,
}

/// Terminal connection details.
#[derive(Debug, Clone, Serialize)]
pub struct TerminalStatus {
    /// Connection state.
    pub state: ConnectionState,
    /// Whether the terminal is connected.
    pub connected: bool,
    /// Terminal endpoint.
    pub endpoint: String,
    /// Connector counters.
    #[serde(flatten)]
    pub stats: ConnectorStats,
}

// =============================================================================
// Trading
// =============================================================================

/// Connection summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatusResponse {
    /// Connection state.
    pub state: ConnectionState,
    /// Whether the terminal is connected.
    pub connected: bool,
    /// Terminal endpoint.
    pub endpoint: String,
}

/// Payload returned by the terminal, with a note when it is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataResponse {
    /// Terminal payload.
    pub data: Option<Value>,
    /// Why `data` is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DataResponse {
    /// A payload that may be unavailable.
    #[must_use]
    pub fn from_option(data: Option<Value>, unavailable: &str) -> Self {
        match data {
            Some(data) => Self {
                data: Some(data),
                message: None,
            },
            None => Self {
                data: None,
                message: Some(unavailable.to_string()),
            },
        }
    }

    /// A payload returned by a write operation.
    #[must_use]
    pub const fn present(data: Value) -> Self {
        Self {
            data: Some(data),
            message: None,
        }
    }
}

/// Open positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionsResponse {
    /// Positions as reported by the terminal.
    pub positions: Vec<Value>,
}

// =============================================================================
// Errors
// =============================================================================

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Connector error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.0 {
            GatewayError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::application::ports::TransportError;
    use crate::domain::protocol::Action;

    #[test]
    fn error_status_mapping() {
        assert_eq!(
            ApiError(GatewayError::NotConnected).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(GatewayError::Timeout {
                action: Action::PlaceOrder,
                timeout: Duration::from_secs(30),
            })
            .status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError(GatewayError::Transport(TransportError::Receive("reset".into()))).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn health_status_follows_connection() {
        assert_eq!(
            HealthStatus::from_connection(ConnectionState::Connected),
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthStatus::from_connection(ConnectionState::Connecting),
            HealthStatus::Degraded
        );
    }

    #[test]
    fn data_response_shapes() {
        assert_eq!(
            serde_json::to_value(DataResponse::from_option(None, "unavailable")).unwrap(),
            json!({"data": null, "message": "unavailable"})
        );
        assert_eq!(
            serde_json::to_value(DataResponse::present(json!({"ticket": 1}))).unwrap(),
            json!({"data": {"ticket": 1}})
        );
    }
}
