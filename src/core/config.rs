//! Server Configuration
//!
//! All settings come from environment variables with defaults. Parsing goes
//! through a lookup closure so it can be exercised without mutating the
//! process environment.
//!
//! Environment Variables:
//! - SERVER_NAME: Name of the server (default: "DEMO Server")
//! - SERVER_VERSION: Version string (default: crate version)
//! - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "stdio")
//! - HOST: Bind address for HTTP mode (default: "0.0.0.0")
//! - PORT: Port number for HTTP mode (default: 3000)
//! - WORKER_THREADS: HTTP worker count (default: CPU count, max 16)
//! - DICE_SEED: Optional seed for the dice random source

use std::str::FromStr;

use crate::core::error::ConfigError;

pub const DEFAULT_SERVER_NAME: &str = "DEMO Server";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
const MAX_DEFAULT_WORKERS: usize = 16;

/// Which transport(s) the server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Newline-delimited JSON-RPC over stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP POST
    Http,
    /// STDIO in a background task, HTTP in the foreground
    Both,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "both" => Ok(Self::Both),
            other => Err(ConfigError::InvalidTransport(other.to_string())),
        }
    }
}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server name as reported in MCP initialize responses
    pub name: String,
    /// Server version string as reported in MCP initialize responses
    pub version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Fixed seed for reproducible dice rolls; OS entropy when absent
    pub dice_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            transport: TransportMode::Stdio,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            workers: default_workers(),
            dice_seed: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset keys fall back to defaults. Set but malformed keys are errors
    /// rather than silently replaced.
    ///
    /// # Arguments
    /// * `lookup` - Returns the value for a variable name, or None if unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let transport = match lookup("MCP_TRANSPORT_MODE") {
            Some(mode) => mode.trim().parse()?,
            None => defaults.transport,
        };

        Ok(Self {
            name: lookup("SERVER_NAME").unwrap_or(defaults.name),
            version: lookup("SERVER_VERSION").unwrap_or(defaults.version),
            transport,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_number(&lookup, "PORT")?.unwrap_or(defaults.port),
            workers: parse_number::<usize, _>(&lookup, "WORKER_THREADS")?
                .map(|n| n.max(1))
                .unwrap_or(defaults.workers),
            dice_seed: parse_number(&lookup, "DICE_SEED")?,
        })
    }

    /// HTTP bind address in `host:port` form.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Defaults to CPU count but capped to avoid excessive context switching.
fn default_workers() -> usize {
    num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS)
}

fn parse_number<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.name, "DEMO Server");
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert!(config.workers >= 1 && config.workers <= 16);
        assert_eq!(config.dice_seed, None);
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("SERVER_NAME", "dice"),
            ("SERVER_VERSION", "9.9.9"),
            ("MCP_TRANSPORT_MODE", "both"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("WORKER_THREADS", "4"),
            ("DICE_SEED", "42"),
        ])
        .unwrap();

        assert_eq!(config.name, "dice");
        assert_eq!(config.version, "9.9.9");
        assert_eq!(config.transport, TransportMode::Both);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.workers, 4);
        assert_eq!(config.dice_seed, Some(42));
    }

    #[test]
    fn zero_workers_is_raised_to_one() {
        let config = config_from(&[("WORKER_THREADS", "0")]).unwrap();
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn rejects_unknown_transport() {
        assert_eq!(
            config_from(&[("MCP_TRANSPORT_MODE", "websocket")]),
            Err(ConfigError::InvalidTransport("websocket".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_port() {
        assert_eq!(
            config_from(&[("PORT", "99999")]),
            Err(ConfigError::InvalidNumber {
                key: "PORT",
                value: "99999".to_string()
            })
        );
    }

    #[test]
    fn rejects_malformed_seed() {
        assert!(matches!(
            config_from(&[("DICE_SEED", "abc")]),
            Err(ConfigError::InvalidNumber { key: "DICE_SEED", .. })
        ));
    }
}
