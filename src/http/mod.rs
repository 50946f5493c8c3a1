//! HTTP surface: health, record stores, and the demo lookup

pub mod extract;
pub mod records;
pub mod routes;

pub use routes::build_router;
