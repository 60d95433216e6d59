//! Gateway Configuration Settings
//!
//! Configuration types for the gateway, loaded from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::application::services::{BackoffConfig, ConnectorConfig};

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Production deployment.
    Production,
}

impl Environment {
    /// Parse environment from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Check if this is the production environment.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Get the environment name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Trading terminal connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSettings {
    /// Terminal host name or address.
    pub host: String,
    /// Terminal port.
    pub port: u16,
    /// Upper bound on connect and on every request/reply exchange.
    pub request_timeout: Duration,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8222,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl TerminalSettings {
    /// Socket endpoint, e.g. `tcp://localhost:8222`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("tcp://{}:{}", self.host, self.port)
    }

    /// Connector configuration derived from these settings.
    #[must_use]
    pub fn connector_config(&self) -> ConnectorConfig {
        ConnectorConfig::new(self.endpoint(), self.request_timeout)
    }
}

/// Background reconnect settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectSettings {
    /// Whether the reconnect supervisor runs.
    pub enabled: bool,
    /// Initial reconnection delay.
    pub delay_initial: Duration,
    /// Maximum reconnection delay.
    pub delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub delay_multiplier: f64,
    /// Maximum consecutive attempts before pausing (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_initial: Duration::from_millis(1000),
            delay_max: Duration::from_secs(60),
            delay_multiplier: 2.0,
            max_attempts: 0,
        }
    }
}

impl ReconnectSettings {
    /// Backoff configuration derived from these settings.
    #[must_use]
    pub const fn backoff_config(&self) -> BackoffConfig {
        BackoffConfig {
            initial_delay: self.delay_initial,
            max_delay: self.delay_max,
            multiplier: self.delay_multiplier,
            jitter_factor: 0.1,
            max_attempts: self.max_attempts,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Bind address.
    pub host: IpAddr,
    /// HTTP port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
        }
    }
}

impl ServerSettings {
    /// Socket address to bind.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Deployment environment.
    pub environment: Environment,
    /// Terminal connection settings.
    pub terminal: TerminalSettings,
    /// Reconnect supervisor settings.
    pub reconnect: ReconnectSettings,
    /// HTTP server settings.
    pub server: ServerSettings,
}

impl GatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal host is empty, the request timeout is
    /// zero, or the bind address is not an IP address.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| Environment::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let terminal_defaults = TerminalSettings::default();
        let host = lookup("MT5_HOST").unwrap_or(terminal_defaults.host);
        if host.trim().is_empty() {
            return Err(ConfigError::EmptyValue("MT5_HOST".to_string()));
        }

        let request_timeout = parse_duration_secs(
            &lookup,
            "MT5_TIMEOUT",
            terminal_defaults.request_timeout,
        );
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "MT5_TIMEOUT".to_string(),
                reason: "must be at least one second".to_string(),
            });
        }

        let terminal = TerminalSettings {
            host: host.trim().to_string(),
            port: parse_value(&lookup, "MT5_PORT", terminal_defaults.port),
            request_timeout,
        };

        let reconnect_defaults = ReconnectSettings::default();
        let reconnect = ReconnectSettings {
            enabled: parse_bool(&lookup, "MT5_RECONNECT_ENABLED", reconnect_defaults.enabled),
            delay_initial: parse_duration_millis(
                &lookup,
                "MT5_RECONNECT_DELAY_INITIAL_MS",
                reconnect_defaults.delay_initial,
            ),
            delay_max: parse_duration_secs(
                &lookup,
                "MT5_RECONNECT_DELAY_MAX_SECS",
                reconnect_defaults.delay_max,
            ),
            delay_multiplier: parse_value(
                &lookup,
                "MT5_RECONNECT_DELAY_MULTIPLIER",
                reconnect_defaults.delay_multiplier,
            ),
            max_attempts: parse_value(
                &lookup,
                "MT5_RECONNECT_MAX_ATTEMPTS",
                reconnect_defaults.max_attempts,
            ),
        };

        let server_defaults = ServerSettings::default();
        let server_host = match lookup("BACKEND_HOST") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "BACKEND_HOST".to_string(),
                reason: format!("'{raw}' is not an IP address"),
            })?,
            None => server_defaults.host,
        };
        let server = ServerSettings {
            host: server_host,
            port: parse_value(&lookup, "BACKEND_PORT", server_defaults.port),
        };

        Ok(Self {
            environment,
            terminal,
            reconnect,
            server,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has an unusable value.
    #[error("environment variable {key} is invalid: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

fn parse_value<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(default, |v| {
        matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes")
    })
}

fn parse_duration_secs<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_duration_millis<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.terminal, TerminalSettings::default());
        assert_eq!(config.terminal.endpoint(), "tcp://localhost:8222");
        assert_eq!(config.terminal.request_timeout, Duration::from_secs(30));
        assert_eq!(config.reconnect, ReconnectSettings::default());
        assert_eq!(config.server.bind_addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn terminal_overrides() {
        let config = config_from(&[
            ("MT5_HOST", "10.0.0.5"),
            ("MT5_PORT", "9000"),
            ("MT5_TIMEOUT", "5"),
        ])
        .unwrap();

        assert_eq!(config.terminal.endpoint(), "tcp://10.0.0.5:9000");
        assert_eq!(config.terminal.request_timeout, Duration::from_secs(5));

        let connector = config.terminal.connector_config();
        assert_eq!(connector.endpoint(), "tcp://10.0.0.5:9000");
        assert_eq!(connector.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let config = config_from(&[("MT5_PORT", "not-a-port"), ("BACKEND_PORT", "-1")]).unwrap();
        assert_eq!(config.terminal.port, 8222);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn empty_host_is_rejected() {
        let err = config_from(&[("MT5_HOST", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(ref key) if key == "MT5_HOST"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = config_from(&[("MT5_TIMEOUT", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MT5_TIMEOUT"));
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let err = config_from(&[("BACKEND_HOST", "example.com")]).unwrap_err();
        assert!(err.to_string().contains("BACKEND_HOST"));
    }

    #[test]
    fn reconnect_settings() {
        let config = config_from(&[
            ("MT5_RECONNECT_ENABLED", "false"),
            ("MT5_RECONNECT_DELAY_INITIAL_MS", "250"),
            ("MT5_RECONNECT_DELAY_MAX_SECS", "10"),
            ("MT5_RECONNECT_DELAY_MULTIPLIER", "1.5"),
            ("MT5_RECONNECT_MAX_ATTEMPTS", "7"),
        ])
        .unwrap();

        assert!(!config.reconnect.enabled);
        let backoff = config.reconnect.backoff_config();
        assert_eq!(backoff.initial_delay, Duration::from_millis(250));
        assert_eq!(backoff.max_delay, Duration::from_secs(10));
        assert!((backoff.multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(backoff.max_attempts, 7);
    }

    #[test]
    fn environment_parsing() {
        assert_eq!(
            Environment::from_str_case_insensitive("PRODUCTION"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_case_insensitive("staging"),
            Environment::Development
        );
        assert!(Environment::Production.is_production());
        assert_eq!(Environment::Development.as_str(), "development");
    }
}
