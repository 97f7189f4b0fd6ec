//! Server configuration.
//!
//! Loaded from environment variables with defaults for every field.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Default per-send write deadline in seconds.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;

const BIND_ADDRESS_VAR: &str = "SKIRMISH_BIND_ADDRESS";
const WRITE_TIMEOUT_VAR: &str = "SKIRMISH_WRITE_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
}

/// Relay server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Deadline for a single outbound frame (default: 10s). A send that
    /// misses it ends the connection.
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get(BIND_ADDRESS_VAR)
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let write_timeout = match vars.get(WRITE_TIMEOUT_VAR) {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| ConfigError::InvalidValue(WRITE_TIMEOUT_VAR.into(), raw.clone()))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
        };

        Ok(Self {
            bind_address,
            write_timeout,
        })
    }
}
