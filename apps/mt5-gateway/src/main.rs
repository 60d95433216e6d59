//! MT5 Gateway Binary
//!
//! Starts the trading terminal gateway and its HTTP surface.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin mt5-gateway
//! ```
//!
//! # Environment Variables
//!
//! - `ENVIRONMENT`: development | production (default: development)
//! - `MT5_HOST`: Terminal host (default: localhost)
//! - `MT5_PORT`: Terminal port (default: 8222)
//! - `MT5_TIMEOUT`: Request timeout in seconds (default: 30)
//! - `MT5_RECONNECT_ENABLED`: Run the reconnect supervisor (default: true)
//! - `MT5_RECONNECT_DELAY_INITIAL_MS`, `MT5_RECONNECT_DELAY_MAX_SECS`,
//!   `MT5_RECONNECT_DELAY_MULTIPLIER`, `MT5_RECONNECT_MAX_ATTEMPTS`: Backoff
//! - `BACKEND_HOST`: HTTP bind address (default: 0.0.0.0)
//! - `BACKEND_PORT`: HTTP port (default: 8000)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log filter (default: `mt5_gateway=info`)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mt5_gateway::{
    AppState, GatewayConfig, GatewayConnector, HttpServer, ReconnectSupervisor,
    ZmqTransportFactory, init_metrics, init_telemetry,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Upper bound on waiting for background tasks after shutdown is requested.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let _telemetry_guard = init_telemetry().context("failed to initialize telemetry")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting MT5 gateway");

    let _metrics_handle = init_metrics();

    let config = GatewayConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let connector = Arc::new(GatewayConnector::new(
        config.terminal.connector_config(),
        Arc::new(ZmqTransportFactory::new()),
    ));

    // A terminal that is down at startup is not fatal; serve degraded.
    if let Err(e) = connector.connect().await {
        tracing::warn!(
            error = %e,
            code = e.code(),
            "Trading terminal unavailable at startup, continuing degraded"
        );
    }

    let supervisor_handle = config.reconnect.enabled.then(|| {
        let supervisor = ReconnectSupervisor::new(
            Arc::clone(&connector),
            config.reconnect.backoff_config(),
            shutdown_token.child_token(),
        );
        tokio::spawn(supervisor.run())
    });

    let http_server = HttpServer::new(
        config.server.bind_addr(),
        AppState::new(Arc::clone(&connector), env!("CARGO_PKG_VERSION")),
        shutdown_token.child_token(),
    );
    let http_handle = tokio::spawn(async move {
        if let Err(e) = http_server.run().await {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    tracing::info!("MT5 gateway ready");

    await_shutdown(&shutdown_token).await;

    let drain = async {
        let _ = http_handle.await;
        if let Some(handle) = supervisor_handle {
            let _ = handle.await;
        }
    };
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, drain).await.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Background tasks did not stop in time"
        );
    }

    connector.disconnect().await;

    tracing::info!("MT5 gateway stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &GatewayConfig) {
    tracing::info!(
        environment = config.environment.as_str(),
        endpoint = %config.terminal.endpoint(),
        timeout_secs = config.terminal.request_timeout.as_secs(),
        reconnect = config.reconnect.enabled,
        bind = %config.server.bind_addr(),
        "Configuration loaded"
    );
}

/// Load .env file from the current directory or the nearest ancestor that has one.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

/// Wait for Ctrl+C or SIGTERM, then cancel background tasks.
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: &CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
