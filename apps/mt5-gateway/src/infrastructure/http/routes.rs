//! HTTP Routes (Driver Adapter)
//!
//! Axum router: health probes, Prometheus metrics and thin trading handlers
//! that delegate to the gateway connector.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON health status (always 200)
//! - `GET /healthz` - Liveness probe
//! - `GET /readyz` - Readiness probe (503 until the terminal is connected)
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /api/v1/trading/status` - Connection summary
//! - `GET /api/v1/trading/account` - Account information
//! - `GET /api/v1/trading/symbols/{symbol}` - Symbol specification
//! - `GET /api/v1/trading/positions` - Open positions
//! - `POST /api/v1/trading/orders` - Place a market order
//! - `POST /api/v1/trading/positions/{ticket}/close` - Close a position
//! - `POST /api/v1/trading/reconnect` - Force a reconnect

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use crate::application::services::GatewayConnector;
use crate::domain::order::{OrderRequest, Ticket};
use crate::infrastructure::metrics::get_metrics_handle;

use super::response::{
    ApiError, ConnectionStatusResponse, DataResponse, HealthResponse, HealthStatus,
    PositionsResponse, TerminalStatus,
};

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    connector: Arc<GatewayConnector>,
    version: String,
    started_at: Instant,
}

impl AppState {
    /// Create state around a shared connector.
    #[must_use]
    pub fn new(connector: Arc<GatewayConnector>, version: impl Into<String>) -> Self {
        Self {
            connector,
            version: version.into(),
            started_at: Instant::now(),
        }
    }

    /// The shared connector.
    #[must_use]
    pub const fn connector(&self) -> &Arc<GatewayConnector> {
        &self.connector
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/trading/status", get(status_handler))
        .route("/api/v1/trading/account", get(account_handler))
        .route("/api/v1/trading/symbols/{symbol}", get(symbol_handler))
        .route("/api/v1/trading/positions", get(positions_handler))
        .route("/api/v1/trading/orders", post(place_order_handler))
        .route(
            "/api/v1/trading/positions/{ticket}/close",
            post(close_position_handler),
        )
        .route("/api/v1/trading/reconnect", post(reconnect_handler))
        .with_state(state)
}

// =============================================================================
// Health Handlers
// =============================================================================

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let connection = state.connector.state();
    Json(HealthResponse {
        status: HealthStatus::from_connection(connection),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        mt5: TerminalStatus {
            state: connection,
            connected: connection.is_connected(),
            endpoint: state.connector.endpoint().to_string(),
            stats: state.connector.stats(),
        },
    })
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.connector.is_connected() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

// =============================================================================
// Trading Handlers
// =============================================================================

fn connection_status(connector: &GatewayConnector) -> ConnectionStatusResponse {
    let state = connector.state();
    ConnectionStatusResponse {
        state,
        connected: state.is_connected(),
        endpoint: connector.endpoint().to_string(),
    }
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(connection_status(&state.connector))
}

async fn account_handler(State(state): State<AppState>) -> impl IntoResponse {
    let data = state.connector.get_account_info().await;
    Json(DataResponse::from_option(data, "Account information unavailable"))
}

async fn symbol_handler(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    let data = state.connector.get_symbol_info(&symbol).await;
    Json(DataResponse::from_option(
        data,
        &format!("Symbol information unavailable for {symbol}"),
    ))
}

async fn positions_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(PositionsResponse {
        positions: state.connector.get_positions().await,
    })
}

async fn place_order_handler(
    State(state): State<AppState>,
    Json(order): Json<OrderRequest>,
) -> Result<Json<DataResponse>, ApiError> {
    let data = state.connector.place_order(&order).await?;
    Ok(Json(DataResponse::present(data)))
}

async fn close_position_handler(
    State(state): State<AppState>,
    Path(ticket): Path<Ticket>,
) -> Result<Json<DataResponse>, ApiError> {
    let data = state.connector.close_position(ticket).await?;
    Ok(Json(DataResponse::present(data)))
}

async fn reconnect_handler(
    State(state): State<AppState>,
) -> Result<Json<ConnectionStatusResponse>, ApiError> {
    state.connector.reconnect().await?;
    Ok(Json(connection_status(&state.connector)))
}
