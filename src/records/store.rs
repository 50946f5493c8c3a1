//! Generic observable record store

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{Record, RecordId};

/// Capacity of the change feed before slow subscribers start lagging
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change published after every successful mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent<R> {
    Added { record: R },
    Edited { record: R },
    Deleted { id: RecordId },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: RecordId },
}

/// Sole owner of an ordered collection of one record kind.
///
/// Every mutation runs under one lock, and its event is published before
/// the lock is released, so subscribers observe changes in mutation order.
pub struct RecordStore<R: Record> {
    records: Mutex<Vec<R>>,
    events: broadcast::Sender<StoreEvent<R>>,
}

impl<R: Record> RecordStore<R> {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            records: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Append a new record and return its freshly generated id
    pub fn add(&self, fields: R::Fields) -> RecordId {
        let id = RecordId::generate();
        let record = R::new(id, fields);

        let mut records = self.records.lock();
        records.push(record.clone());
        self.publish(StoreEvent::Added { record });

        info!(kind = R::KIND, id = %id, total = records.len(), "Record added");
        id
    }

    /// Replace every mutable field of the record with `id`. Returns the updated record.
    pub fn edit(&self, id: RecordId, fields: R::Fields) -> Result<R, StoreError> {
        self.edit_with(id, move |current| *current = fields)
    }

    /// Read-modify-write the fields of one record without releasing the lock
    /// in between. Returns the updated record.
    pub fn edit_with<F>(&self, id: RecordId, update: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut R::Fields),
    {
        let mut records = self.records.lock();
        let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
            debug!(kind = R::KIND, id = %id, "Edit of unknown record");
            return Err(StoreError::NotFound { kind: R::KIND, id });
        };

        let mut fields = record.fields();
        update(&mut fields);
        record.apply(fields);

        let updated = record.clone();
        self.publish(StoreEvent::Edited {
            record: updated.clone(),
        });

        info!(kind = R::KIND, id = %id, "Record edited");
        Ok(updated)
    }

    /// Remove every record with `id`. Returns how many were removed; zero is not an error.
    pub fn delete(&self, id: RecordId) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| r.id() != id);
        let removed = before - records.len();

        if removed > 0 {
            self.publish(StoreEvent::Deleted { id });
            info!(kind = R::KIND, id = %id, total = records.len(), "Record deleted");
        } else {
            debug!(kind = R::KIND, id = %id, "Delete of unknown record");
        }

        removed
    }

    /// Snapshot of all records in insertion order
    pub fn list(&self) -> Vec<R> {
        self.records.lock().clone()
    }

    pub fn get(&self, id: RecordId) -> Option<R> {
        self.records.lock().iter().find(|r| r.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Receive every change made after this call
    #[cfg(test)]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<R>> {
        self.events.subscribe()
    }

    /// Number of live change-feed subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Current contents plus a subscription that starts exactly after them
    pub fn snapshot_and_subscribe(&self) -> (Vec<R>, broadcast::Receiver<StoreEvent<R>>) {
        let records = self.records.lock();
        (records.clone(), self.events.subscribe())
    }

    fn publish(&self, event: StoreEvent<R>) {
        // No receivers is the normal state when nobody is watching
        let _ = self.events.send(event);
    }
}

impl<R: Record> Default for RecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}
