//! Change-feed message definitions
//! These are the wire types for the per-store WebSocket feed

use serde::{Deserialize, Serialize};

use crate::records::{RecordId, StoreEvent};

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg<R> {
    /// Full contents in insertion order; sent on connect, after lag, and on request
    Snapshot { records: Vec<R> },

    Added { record: R },

    Edited { record: R },

    Deleted { id: RecordId },

    /// Reply to a client ping
    Pong {
        /// Echoed client timestamp
        t: u64,
        server_time: u64,
    },
}

impl<R> From<StoreEvent<R>> for ServerMsg<R> {
    fn from(event: StoreEvent<R>) -> Self {
        match event {
            StoreEvent::Added { record } => Self::Added { record },
            StoreEvent::Edited { record } => Self::Edited { record },
            StoreEvent::Deleted { id } => Self::Deleted { id },
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Ask for a fresh snapshot
    Resync,
}
