//! WebSocket change feeds

pub mod handler;
pub mod protocol;

pub use handler::feed_handler;
