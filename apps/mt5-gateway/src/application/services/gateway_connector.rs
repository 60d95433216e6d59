//! Gateway Connector
//!
//! Owns the single logical connection to the trading terminal and exposes
//! the command API on top of it.
//!
//! # Serialization
//!
//! The terminal socket is strictly lockstep: one request, then exactly one
//! reply. Every operation that touches the socket (connect, reconnect,
//! disconnect and each exchange) holds one FIFO-fair async mutex for its full
//! duration, so requests reach the terminal in lock-acquisition order and
//! never overlap.
//!
//! # Failure Handling
//!
//! - A reply timeout or a send/receive failure tears the transport down and
//!   publishes `Disconnected`; a fresh connect is required.
//! - A codec failure keeps the transport, which is still aligned.
//! - A caller dropped mid-exchange or mid-handshake releases the transport
//!   and publishes `Disconnected`. An abandoned request may still be
//!   answered, so the socket can never be handed to the next caller.
//! - Read operations degrade to empty results; write operations surface the
//!   error to the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use uuid::Uuid;

use crate::application::ports::{TerminalTransport, TransportError, TransportFactory};
use crate::domain::connection::ConnectionState;
use crate::domain::order::{OrderRequest, Ticket};
use crate::domain::protocol::{Action, Command, TerminalResponse};
use crate::error::GatewayError;
use crate::infrastructure::metrics::{self, RequestOutcome};

// =============================================================================
// Configuration
// =============================================================================

/// Immutable connector configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    endpoint: String,
    request_timeout: Duration,
}

impl ConnectorConfig {
    /// Create a configuration for `endpoint` with the given request timeout.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            request_timeout,
        }
    }

    /// Terminal endpoint, e.g. `tcp://localhost:8222`.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Bound on the transport open and on each exchange.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Point-in-time connector counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectorStats {
    /// Exchanges attempted on a live transport.
    pub requests: u64,
    /// Exchanges that failed for any reason, including abandoned ones.
    pub failures: u64,
    /// Exchanges abandoned on timeout.
    pub timeouts: u64,
    /// Successful connects.
    pub connects: u64,
    /// When the last successful connect completed.
    pub last_connected_at: Option<DateTime<Utc>>,
    /// Most recent failure message.
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct StatsRecorder {
    requests: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
    connects: AtomicU64,
    last_connected_at: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
}

impl StatsRecorder {
    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, err: &GatewayError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        if matches!(err, GatewayError::Timeout { .. }) {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
        self.record_error(err);
    }

    fn record_cancelled(&self, action: Action) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.write() = Some(format!("{action} cancelled before reply"));
    }

    fn record_error(&self, err: &GatewayError) {
        *self.last_error.write() = Some(err.to_string());
    }

    fn record_connected(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
        *self.last_connected_at.write() = Some(Utc::now());
    }

    fn snapshot(&self) -> ConnectorStats {
        ConnectorStats {
            requests: self.requests.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            last_connected_at: *self.last_connected_at.read(),
            last_error: self.last_error.read().clone(),
        }
    }
}

// =============================================================================
// Connector
// =============================================================================

type Session = Option<Box<dyn TerminalTransport>>;

/// Serialized request/reply client for the trading terminal.
///
/// Process-scoped: construct once, share via `Arc`, call
/// [`disconnect`](Self::disconnect) on shutdown.
pub struct GatewayConnector {
    config: ConnectorConfig,
    factory: Arc<dyn TransportFactory>,
    session: Mutex<Session>,
    state_tx: watch::Sender<ConnectionState>,
    stats: StatsRecorder,
}

impl std::fmt::Debug for GatewayConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConnector")
            .field("endpoint", &self.config.endpoint)
            .field("adapter", &self.factory.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl GatewayConnector {
    /// Create a disconnected connector.
    #[must_use]
    pub fn new(config: ConnectorConfig, factory: Arc<dyn TransportFactory>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            factory,
            session: Mutex::new(None),
            state_tx,
            stats: StatsRecorder::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Observation (lock-free)
    // -------------------------------------------------------------------------

    /// Terminal endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.config.endpoint()
    }

    /// Configured request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Whether the connector currently holds a live transport.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the connector counters.
    #[must_use]
    pub fn stats(&self) -> ConnectorStats {
        self.stats.snapshot()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Open the transport and verify it with a `ping`.
    ///
    /// Returns immediately without I/O when already connected.
    ///
    /// # Errors
    ///
    /// Returns the open, probe or timeout failure. The connector is left
    /// `Disconnected` with no transport held.
    pub async fn connect(&self) -> Result<(), GatewayError> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Ok(());
        }
        self.open_session(&mut session).await
    }

    /// Drop the current transport (if any) and connect afresh.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect).
    pub async fn reconnect(&self) -> Result<(), GatewayError> {
        let mut session = self.session.lock().await;
        if session.take().is_some() {
            self.set_state(ConnectionState::Disconnected);
            tracing::info!(
                endpoint = %self.config.endpoint,
                "Dropped terminal transport for reconnect"
            );
        }
        self.open_session(&mut session).await
    }

    /// Release the transport and mark the connector disconnected.
    ///
    /// Idempotent; safe before any connect.
    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        if session.take().is_some() {
            tracing::info!(endpoint = %self.config.endpoint, "Disconnected from trading terminal");
        }
        self.set_state(ConnectionState::Disconnected);
    }

    async fn open_session(&self, session: &mut Session) -> Result<(), GatewayError> {
        self.set_state(ConnectionState::Connecting);
        tracing::info!(
            endpoint = %self.config.endpoint,
            adapter = self.factory.name(),
            "Connecting to trading terminal"
        );

        let handshake = DisconnectOnDrop::arm(self, Action::Ping);
        let result = self.handshake().await;
        handshake.disarm();

        match result {
            Ok(transport) => {
                *session = Some(transport);
                self.stats.record_connected();
                self.set_state(ConnectionState::Connected);
                tracing::info!(endpoint = %self.config.endpoint, "Connected to trading terminal");
                Ok(())
            }
            Err(err) => {
                self.stats.record_error(&err);
                self.set_state(ConnectionState::Disconnected);
                tracing::warn!(
                    endpoint = %self.config.endpoint,
                    error = %err,
                    "Failed to connect to trading terminal"
                );
                Err(err)
            }
        }
    }

    async fn handshake(&self) -> Result<Box<dyn TerminalTransport>, GatewayError> {
        let timeout = self.config.request_timeout;
        let mut transport = tokio::time::timeout(timeout, self.factory.open(&self.config.endpoint))
            .await
            .map_err(|_| GatewayError::Timeout {
                action: Action::Ping,
                timeout,
            })??;

        exchange(transport.as_mut(), &Command::Ping, timeout).await?;
        Ok(transport)
    }

    fn set_state(&self, next: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug_assert!(
                current.can_transition_to(next),
                "illegal transition {current} -> {next}"
            );
            *current = next;
            true
        });
        metrics::set_connection_state(next);
    }

    // -------------------------------------------------------------------------
    // Exchange
    // -------------------------------------------------------------------------

    /// Perform one request/reply exchange.
    ///
    /// Dropping the returned future before the reply arrives releases the
    /// transport and leaves the connector `Disconnected`.
    ///
    /// # Errors
    ///
    /// - `NotConnected` if no transport is held.
    /// - `Timeout` if no reply arrives in time; the transport is torn down.
    /// - `Transport` for send, receive or codec failures. Send and receive
    ///   failures tear the transport down.
    pub async fn send(&self, command: &Command) -> Result<TerminalResponse, GatewayError> {
        let action = command.action();
        let mut session = self.session.lock().await;

        // The transport leaves the session for the duration of the exchange
        // and only goes back once the reply is in.
        let Some(mut transport) = session.take() else {
            metrics::record_request(action, RequestOutcome::NotConnected, Duration::ZERO);
            return Err(GatewayError::NotConnected);
        };

        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, %action, "Sending terminal request");
        self.stats.record_request();

        let in_flight = DisconnectOnDrop::arm(self, action);
        let started = Instant::now();
        let result = exchange(transport.as_mut(), command, self.config.request_timeout).await;
        let elapsed = started.elapsed();
        in_flight.disarm();

        match &result {
            Ok(_) => {
                *session = Some(transport);
                metrics::record_request(action, RequestOutcome::Ok, elapsed);
                tracing::debug!(
                    %request_id,
                    %action,
                    elapsed_ms = elapsed.as_millis(),
                    "Terminal reply received"
                );
            }
            Err(err) => {
                let outcome = if matches!(err, GatewayError::Timeout { .. }) {
                    RequestOutcome::Timeout
                } else {
                    RequestOutcome::Error
                };
                metrics::record_request(action, outcome, elapsed);
                self.stats.record_failure(err);

                if breaks_session(err) {
                    drop(transport);
                    self.set_state(ConnectionState::Disconnected);
                    tracing::warn!(
                        %request_id,
                        %action,
                        error = %err,
                        "Terminal exchange failed, transport torn down"
                    );
                } else {
                    *session = Some(transport);
                    tracing::warn!(%request_id, %action, error = %err, "Terminal exchange failed");
                }
            }
        }

        result
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Liveness probe on the current transport.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn ping(&self) -> Result<(), GatewayError> {
        self.send(&Command::Ping).await.map(|_| ())
    }

    /// Account balance, equity and margin; `None` when unavailable.
    pub async fn get_account_info(&self) -> Option<Value> {
        self.query(&Command::AccountInfo).await
    }

    /// Specification of one symbol; `None` when unavailable.
    pub async fn get_symbol_info(&self, symbol: &str) -> Option<Value> {
        self.query(&Command::symbol_info(symbol)).await
    }

    /// Open positions; empty when unavailable.
    pub async fn get_positions(&self) -> Vec<Value> {
        match self.query(&Command::GetPositions).await {
            Some(Value::Array(positions)) => positions,
            Some(other) => {
                tracing::warn!(payload = %other, "Positions payload is not an array");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Open a market position.
    ///
    /// Returns the reply's `data` unchanged (`Null` if absent).
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn place_order(&self, order: &OrderRequest) -> Result<Value, GatewayError> {
        tracing::info!(
            symbol = %order.symbol,
            direction = %order.direction,
            volume = %order.volume,
            "Placing order"
        );
        let response = self.send(&Command::place_order(order)).await?;
        Ok(response.into_data().unwrap_or(Value::Null))
    }

    /// Close an open position by ticket.
    ///
    /// Returns the reply's `data` unchanged (`Null` if absent).
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn close_position(&self, ticket: Ticket) -> Result<Value, GatewayError> {
        tracing::info!(%ticket, "Closing position");
        let response = self.send(&Command::close_position(ticket)).await?;
        Ok(response.into_data().unwrap_or(Value::Null))
    }

    async fn query(&self, command: &Command) -> Option<Value> {
        match self.send(command).await {
            Ok(response) => response.into_data().filter(|data| !data.is_null()),
            Err(GatewayError::NotConnected) => {
                tracing::debug!(
                    action = %command.action(),
                    "Query skipped, terminal not connected"
                );
                None
            }
            Err(_) => None,
        }
    }
}

/// Publishes `Disconnected` when dropped before [`disarm`](Self::disarm).
///
/// Held across every await that leaves the socket between a request and its
/// reply. If the owning future is cancelled there, the transport has already
/// been dropped with it and the state must follow.
struct DisconnectOnDrop<'a> {
    connector: &'a GatewayConnector,
    action: Action,
    started: Instant,
    armed: bool,
}

impl<'a> DisconnectOnDrop<'a> {
    fn arm(connector: &'a GatewayConnector, action: Action) -> Self {
        Self {
            connector,
            action,
            started: Instant::now(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for DisconnectOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.connector.stats.record_cancelled(self.action);
        metrics::record_request(self.action, RequestOutcome::Cancelled, self.started.elapsed());
        self.connector.set_state(ConnectionState::Disconnected);
        tracing::warn!(
            endpoint = %self.connector.config.endpoint,
            action = %self.action,
            "Terminal operation cancelled, transport released"
        );
    }
}

/// Encode, transmit and await one reply within `timeout`.
async fn exchange(
    transport: &mut dyn TerminalTransport,
    command: &Command,
    timeout: Duration,
) -> Result<TerminalResponse, GatewayError> {
    let frame = command.to_frame().map_err(TransportError::from)?;

    let reply = tokio::time::timeout(timeout, async {
        transport.send(frame).await?;
        transport.recv().await
    })
    .await
    .map_err(|_| GatewayError::Timeout {
        action: command.action(),
        timeout,
    })??;

    let response = TerminalResponse::from_frame(&reply).map_err(TransportError::from)?;
    Ok(response)
}

/// Whether the socket can no longer be trusted after `err`.
const fn breaks_session(err: &GatewayError) -> bool {
    match err {
        GatewayError::NotConnected => false,
        GatewayError::Timeout { .. } => true,
        GatewayError::Transport(inner) => inner.breaks_lockstep(),
    }
}
