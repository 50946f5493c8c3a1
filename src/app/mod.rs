//! Application composition root

pub mod state;

pub use state::AppState;
