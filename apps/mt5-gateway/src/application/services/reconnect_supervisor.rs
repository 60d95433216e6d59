//! Reconnect Supervisor
//!
//! Background task that restores the terminal connection after it drops.
//! It watches the connector's state channel; while the state is
//! `Disconnected` it waits out a backoff delay and calls `connect`. The
//! backoff resets whenever the connection comes back. Once the attempt
//! limit is reached it idles until the state changes again (for example a
//! manual reconnect) or it is cancelled.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::application::services::backoff::{BackoffConfig, BackoffPolicy};
use crate::application::services::gateway_connector::GatewayConnector;
use crate::domain::connection::ConnectionState;
use crate::infrastructure::metrics;

/// Keeps the connector connected.
#[derive(Debug)]
pub struct ReconnectSupervisor {
    connector: Arc<GatewayConnector>,
    policy: BackoffPolicy,
    cancel: CancellationToken,
}

impl ReconnectSupervisor {
    /// Create a supervisor for `connector`.
    #[must_use]
    pub const fn new(
        connector: Arc<GatewayConnector>,
        backoff: BackoffConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connector,
            policy: BackoffPolicy::new(backoff),
            cancel,
        }
    }

    /// Run until cancelled.
    pub async fn run(mut self) {
        let mut states = self.connector.subscribe_state();
        tracing::info!(endpoint = self.connector.endpoint(), "Reconnect supervisor started");

        loop {
            let state = *states.borrow_and_update();
            match state {
                ConnectionState::Connected => {
                    self.policy.reset();
                    if !self.wait_for_change(&mut states).await {
                        break;
                    }
                }
                ConnectionState::Connecting => {
                    if !self.wait_for_change(&mut states).await {
                        break;
                    }
                }
                ConnectionState::Disconnected => {
                    if !self.attempt(&mut states).await {
                        break;
                    }
                }
            }
        }

        tracing::info!("Reconnect supervisor stopped");
    }

    /// One backoff-then-connect round. Returns `false` when cancelled.
    async fn attempt(&mut self, states: &mut watch::Receiver<ConnectionState>) -> bool {
        let Some(delay) = self.policy.next_delay() else {
            tracing::warn!(
                attempts = self.policy.attempts(),
                "Reconnect attempts exhausted, waiting for state change"
            );
            let keep_running = self.wait_for_change(states).await;
            self.policy.reset();
            return keep_running;
        };

        tracing::debug!(
            attempt = self.policy.attempts(),
            delay_ms = delay.as_millis(),
            "Scheduling terminal reconnect"
        );

        tokio::select! {
            () = self.cancel.cancelled() => return false,
            () = tokio::time::sleep(delay) => {}
        }

        metrics::record_reconnect_attempt();
        if let Err(err) = self.connector.connect().await {
            tracing::warn!(
                attempt = self.policy.attempts(),
                error = %err,
                "Terminal reconnect failed"
            );
        }
        true
    }

    /// Wait for the next state change. Returns `false` when cancelled or when
    /// the connector is gone.
    async fn wait_for_change(&self, states: &mut watch::Receiver<ConnectionState>) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            changed = states.changed() => changed.is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::services::gateway_connector::ConnectorConfig;
    use crate::infrastructure::mock::MockTerminal;

    fn fast_backoff(max_attempts: u32) -> BackoffConfig {
        BackoffConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
            jitter_factor: 0.0,
            max_attempts,
        }
    }

    async fn wait_until_connected(connector: &GatewayConnector) {
        let mut states = connector.subscribe_state();
        tokio::time::timeout(
            Duration::from_secs(30),
            states.wait_for(|state| state.is_connected()),
        )
        .await
        .expect("supervisor never reconnected")
        .expect("state channel closed");
    }

    #[tokio::test(start_paused = true)]
    async fn connects_from_cold_start() {
        let terminal = MockTerminal::new();
        let connector = Arc::new(GatewayConnector::new(
            ConnectorConfig::new("tcp://terminal:8222", Duration::from_secs(1)),
            Arc::new(terminal.clone()),
        ));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            ReconnectSupervisor::new(Arc::clone(&connector), fast_backoff(0), cancel.clone())
                .run(),
        );

        wait_until_connected(&connector).await;
        assert_eq!(terminal.opens(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_terminal_accepts() {
        let terminal = MockTerminal::new();
        terminal.set_refuse_connections(true);
        let connector = Arc::new(GatewayConnector::new(
            ConnectorConfig::new("tcp://terminal:8222", Duration::from_secs(1)),
            Arc::new(terminal.clone()),
        ));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            ReconnectSupervisor::new(Arc::clone(&connector), fast_backoff(0), cancel.clone())
                .run(),
        );

        tokio::time::sleep(Duration::from_millis(750)).await;
        assert!(!connector.is_connected());

        terminal.set_refuse_connections(false);
        wait_until_connected(&connector).await;

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn restores_dropped_connection() {
        let terminal = MockTerminal::new();
        let connector = Arc::new(GatewayConnector::new(
            ConnectorConfig::new("tcp://terminal:8222", Duration::from_secs(1)),
            Arc::new(terminal.clone()),
        ));
        connector.connect().await.unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            ReconnectSupervisor::new(Arc::clone(&connector), fast_backoff(0), cancel.clone())
                .run(),
        );

        connector.disconnect().await;
        wait_until_connected(&connector).await;
        assert_eq!(terminal.opens(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_idle_supervisor() {
        let terminal = MockTerminal::new();
        terminal.set_refuse_connections(true);
        let connector = Arc::new(GatewayConnector::new(
            ConnectorConfig::new("tcp://terminal:8222", Duration::from_secs(1)),
            Arc::new(terminal),
        ));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            ReconnectSupervisor::new(Arc::clone(&connector), fast_backoff(1), cancel.clone())
                .run(),
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("supervisor did not stop")
            .unwrap();
    }
}
