//! In-memory record stores for users and products

pub mod product;
pub mod store;
pub mod user;

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::images::ImageHandle;

pub use product::ProductRecord;
pub use store::{RecordStore, StoreError, StoreEvent};
pub use user::UserRecord;

/// Identifier assigned by a store when a record is added
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A record kind that can live in a [`RecordStore`]
pub trait Record: Clone + Serialize + Send + Sync + 'static {
    /// The mutable part of the record, supplied on add and replaced on edit
    type Fields: RecordFields;

    /// Short label used in logs and routes
    const KIND: &'static str;

    fn new(id: RecordId, fields: Self::Fields) -> Self;

    fn id(&self) -> RecordId;

    fn fields(&self) -> Self::Fields;

    /// Overwrite every mutable field. The id stays put.
    fn apply(&mut self, fields: Self::Fields);
}

/// Caller-side checks on incoming fields. Stores never call these.
pub trait RecordFields: Clone + DeserializeOwned + Send + 'static {
    /// Trim surrounding whitespace from text fields
    fn normalize(self) -> Self;

    /// Presence checks on required fields
    fn validate(&self) -> Result<(), ValidationError>;

    fn image_mut(&mut self) -> &mut Option<ImageHandle>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Incomplete fields: {0} is required")]
    Missing(&'static str),
}

/// Fail with the first required field that is blank
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Missing(field))
    } else {
        Ok(())
    }
}
