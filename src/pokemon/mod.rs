//! Pokemon lookup against the public PokeAPI (demo client)

pub mod client;

pub use client::{FetchError, PokemonClient, PokemonData};
