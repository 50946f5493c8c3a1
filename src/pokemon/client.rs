//! PokeAPI REST client

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::util::rate_limit::{create_limiter, Limiter};

/// The subset of a Pokemon resource we care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonData {
    pub name: String,
    pub height: i64,
    pub weight: i64,
}

/// Isolated client for the demo lookup. Nothing else depends on it.
#[derive(Clone)]
pub struct PokemonClient {
    client: Client,
    base_url: String,
    limiter: Arc<Limiter>,
}

impl PokemonClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.pokeapi_base_url.trim_end_matches('/').to_string(),
            limiter: create_limiter(config.fetch_rate_limit),
        })
    }

    /// Get the resource URL for a normalized name
    fn pokemon_url(&self, name: &str) -> String {
        format!("{}/pokemon/{}", self.base_url, name)
    }

    /// Fetch a Pokemon by name. The name is trimmed and lowercased first.
    pub async fn fetch(&self, name: &str) -> Result<PokemonData, FetchError> {
        let name = normalize_name(name)?;

        if self.limiter.check().is_err() {
            warn!(name = %name, "Pokemon fetch rate limited");
            return Err(FetchError::RateLimited);
        }

        let url = self.pokemon_url(&name);
        debug!(url = %url, "Fetching pokemon");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { name });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        serde_json::from_slice(&body).map_err(FetchError::Decode)
    }
}

/// Lowercase and check a name so it is safe to put in a URL path
fn normalize_name(name: &str) -> Result<String, FetchError> {
    let name = name.trim().to_lowercase();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if valid {
        Ok(name)
    } else {
        Err(FetchError::InvalidName(name))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid pokemon name: {0:?}")]
    InvalidName(String),

    #[error("Too many lookups, try again shortly")]
    RateLimited,

    #[error("HTTP request failed: {0}")]
    Network(reqwest::Error),

    #[error("No pokemon named {name}")]
    NotFound { name: String },

    #[error("Unexpected status {status} from PokeAPI")]
    Status { status: u16 },

    #[error("Failed to decode response: {0}")]
    Decode(serde_json::Error),
}
