//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Base URL of the PokeAPI, without the resource path
    pub pokeapi_base_url: String,
    /// Timeout for a single outbound lookup
    pub fetch_timeout_secs: u64,
    /// Outbound lookups allowed per second across the process
    pub fetch_rate_limit: u32,

    /// Timeout applied to every inbound HTTP request
    pub request_timeout_secs: u64,
    /// Allowed client origins for CORS, comma-separated, `*` for any
    pub client_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            pokeapi_base_url: "https://pokeapi.co/api/v2".to_string(),
            fetch_timeout_secs: 10,
            fetch_rate_limit: 5,
            request_timeout_secs: 30,
            client_origin: "*".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match (lookup("PORT"), lookup("SERVER_ADDR")) {
            (Some(port), _) => format!("0.0.0.0:{}", port)
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::InvalidAddress)?,
            (None, Some(addr)) => addr
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::InvalidAddress)?,
            (None, None) => defaults.server_addr,
        };

        Ok(Self {
            server_addr,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            pokeapi_base_url: lookup("POKEAPI_BASE_URL").unwrap_or(defaults.pokeapi_base_url),
            fetch_timeout_secs: parse_or(&lookup, "FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs)?,
            fetch_rate_limit: parse_or(&lookup, "FETCH_RATE_LIMIT", defaults.fetch_rate_limit)?,
            request_timeout_secs: parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or(defaults.client_origin),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
