//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::pokemon::PokemonClient;
use crate::records::{ProductRecord, RecordStore, UserRecord};

/// Shared application state, built once at startup and handed to every route
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<RecordStore<UserRecord>>,
    pub products: Arc<RecordStore<ProductRecord>>,
    pub pokemon: PokemonClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);

        // Initialize stores (empty; nothing survives a restart)
        let users = Arc::new(RecordStore::new());
        let products = Arc::new(RecordStore::new());

        // Initialize the demo lookup client
        let pokemon = PokemonClient::new(&config)?;

        Ok(Self {
            config,
            users,
            products,
            pokemon,
        })
    }
}
