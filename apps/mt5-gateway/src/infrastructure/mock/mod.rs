//! Mock trading terminal for testing.
//!
//! An in-memory, scripted stand-in for the terminal's reply socket. Each
//! request is decoded and handed to a handler that decides the reply. The
//! terminal records every request and counts opened and released transports
//! and concurrently outstanding exchanges.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::application::ports::{TerminalTransport, TransportError, TransportFactory};

/// Scripted reply to one request.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Reply with this JSON value.
    Respond(Value),
    /// Reply with this exact frame, which need not be valid JSON.
    Raw(String),
    /// Never reply.
    Silence,
    /// Fail the receive with this cause.
    Fail(String),
}

impl MockReply {
    /// Reply with a JSON value.
    #[must_use]
    pub const fn respond(value: Value) -> Self {
        Self::Respond(value)
    }
}

type Handler = dyn Fn(&Value) -> MockReply + Send + Sync;

struct TerminalState {
    handler: Box<Handler>,
    requests: Mutex<Vec<Value>>,
    latency: Mutex<Duration>,
    refuse_connections: AtomicBool,
    opens: AtomicUsize,
    closes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Mock terminal for testing.
///
/// Cloning shares the underlying state, so a test can keep one handle for
/// assertions and give another to the connector.
#[derive(Clone)]
pub struct MockTerminal {
    state: Arc<TerminalState>,
}

impl std::fmt::Debug for MockTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTerminal")
            .field("requests", &self.state.requests.lock().len())
            .field("opens", &self.opens())
            .field("closes", &self.closes())
            .finish_non_exhaustive()
    }
}

impl Default for MockTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTerminal {
    /// A terminal that answers `ping` with `pong` and everything else with
    /// `{"data": null}`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_handler(|request| {
            if request["action"] == "ping" {
                MockReply::respond(json!({"data": "pong"}))
            } else {
                MockReply::respond(json!({"data": null}))
            }
        })
    }

    /// A terminal whose replies are decided by `handler`.
    #[must_use]
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> MockReply + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(TerminalState {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
                latency: Mutex::new(Duration::ZERO),
                refuse_connections: AtomicBool::new(false),
                opens: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Delay every reply by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.state.latency.lock() = latency;
    }

    /// Refuse (or accept again) new connections.
    pub fn set_refuse_connections(&self, refuse: bool) {
        self.state.refuse_connections.store(refuse, Ordering::SeqCst);
    }

    /// Every request received, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().clone()
    }

    /// The `action` tag of every request received, in arrival order.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.state
            .requests
            .lock()
            .iter()
            .map(|request| request["action"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Transports opened so far.
    #[must_use]
    pub fn opens(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    /// Transports released so far.
    #[must_use]
    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Highest number of exchanges ever outstanding at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportFactory for MockTerminal {
    async fn open(&self, _endpoint: &str) -> Result<Box<dyn TerminalTransport>, TransportError> {
        if self.state.refuse_connections.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("connection refused".to_string()));
        }
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransport {
            state: Arc::clone(&self.state),
            pending: None,
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Marks one outstanding exchange until dropped.
struct InFlight(Arc<TerminalState>);

impl InFlight {
    fn enter(state: &Arc<TerminalState>) -> Self {
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(state))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MockTransport {
    state: Arc<TerminalState>,
    pending: Option<(MockReply, InFlight)>,
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TerminalTransport for MockTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        if self.pending.is_some() {
            return Err(TransportError::Send(
                "previous request has not been answered".to_string(),
            ));
        }

        let request: Value = serde_json::from_str(&frame).unwrap_or_else(|_| Value::String(frame));
        let reply = (self.state.handler)(&request);
        self.state.requests.lock().push(request);
        self.pending = Some((reply, InFlight::enter(&self.state)));
        Ok(())
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        // The exchange stays outstanding until a reply is actually handed
        // back, so an abandoned receive still blocks the next send.
        let Some((reply, _)) = self.pending.as_ref() else {
            return Err(TransportError::Receive("no request outstanding".to_string()));
        };
        let reply = reply.clone();

        let latency = *self.state.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let result = match reply {
            MockReply::Respond(value) => Ok(value.to_string()),
            MockReply::Raw(frame) => Ok(frame),
            MockReply::Fail(cause) => Err(TransportError::Receive(cause)),
            MockReply::Silence => return std::future::pending().await,
        };
        self.pending = None;
        result
    }
}
