//! Configuration management for the lobby relay
//!
//! Values come from built-in defaults, an optional `config.toml`, environment
//! variables prefixed with `LOBBY_RELAY_`, and finally the bare `PORT`
//! variable set by most hosting platforms.

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

const CONFIG_FILE: &str = "config";
const ENV_PREFIX: &str = "LOBBY_RELAY";

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_MESSAGE_BYTES: usize = 100 * 1024 * 1024;
const DEFAULT_SEND_QUEUE_CAPACITY: usize = 256;

/// Complete relay configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the listener to
    pub bind_address: String,

    /// Port serving both WebSocket upgrades and the liveness response.
    /// Port 0 asks the OS for an ephemeral port.
    pub port: u16,

    /// Largest WebSocket message accepted; exceeding it ends the connection
    pub max_message_bytes: usize,

    /// Outbound frames buffered per connection before sends to it are skipped
    pub send_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            send_queue_capacity: DEFAULT_SEND_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX));

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("port", port)?;
        }

        Self::from_builder(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("max_message_bytes", DEFAULT_MAX_MESSAGE_BYTES as i64)?
            .set_default("send_queue_capacity", DEFAULT_SEND_QUEUE_CAPACITY as i64)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if self.max_message_bytes == 0 {
            return Err(ConfigError::Message(
                "max_message_bytes must be greater than 0".into(),
            ));
        }

        if self.send_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "send_queue_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
