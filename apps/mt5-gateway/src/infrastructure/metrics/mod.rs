//! Prometheus Metrics Module
//!
//! Exposes gateway metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Requests**: Exchanges with the terminal by action and outcome
//! - **Latency**: Round-trip time per action
//! - **Connection**: Current connection state and reconnect attempts
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP server port. Recording
//! functions are no-ops until [`init_metrics`] installs the recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::connection::ConnectionState;
use crate::domain::protocol::Action;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Subsequent calls return the handle installed by the first call.
///
/// # Panics
///
/// Panics if another global recorder was already installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "mt5_gateway_requests_total",
        "Total request/reply exchanges with the terminal by action and outcome"
    );
    describe_histogram!(
        "mt5_gateway_request_duration_seconds",
        "Round-trip time of terminal exchanges"
    );
    describe_counter!(
        "mt5_gateway_timeouts_total",
        "Exchanges abandoned because no reply arrived in time"
    );
    describe_gauge!(
        "mt5_gateway_connection_state",
        "Terminal connection state (0 = disconnected, 1 = connecting, 2 = connected)"
    );
    describe_counter!(
        "mt5_gateway_reconnects_total",
        "Background reconnection attempts"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome label for a terminal exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A reply was received and decoded.
    Ok,
    /// No connection was available.
    NotConnected,
    /// The reply window elapsed.
    Timeout,
    /// Transport or codec failure.
    Error,
    /// The caller went away before the reply arrived.
    Cancelled,
}

impl RequestOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotConnected => "not_connected",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Record a completed (or failed) exchange.
pub fn record_request(action: Action, outcome: RequestOutcome, elapsed: Duration) {
    counter!(
        "mt5_gateway_requests_total",
        "action" => action.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    if outcome != RequestOutcome::NotConnected {
        histogram!(
            "mt5_gateway_request_duration_seconds",
            "action" => action.as_str()
        )
        .record(elapsed.as_secs_f64());
    }

    if outcome == RequestOutcome::Timeout {
        counter!("mt5_gateway_timeouts_total", "action" => action.as_str()).increment(1);
    }
}

/// Publish the current connection state.
pub fn set_connection_state(state: ConnectionState) {
    gauge!("mt5_gateway_connection_state").set(f64::from(state.code()));
}

/// Record a background reconnection attempt.
pub fn record_reconnect_attempt() {
    counter!("mt5_gateway_reconnects_total").increment(1);
}
