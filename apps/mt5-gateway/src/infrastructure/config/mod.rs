//! Configuration Module
//!
//! Environment-driven configuration for the gateway service.

mod settings;

pub use settings::{
    ConfigError, Environment, GatewayConfig, ReconnectSettings, ServerSettings, TerminalSettings,
};
