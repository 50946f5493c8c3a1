//! Product records

use serde::{Deserialize, Serialize};

use super::{require, Record, RecordFields, RecordId, ValidationError};
use crate::images::ImageHandle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub id: RecordId,
    pub name: String,
    /// Whole units, no currency attached. Negative values are not rejected.
    pub price: i64,
    pub image: Option<ImageHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub image: Option<ImageHandle>,
}

#[cfg(test)]
impl ProductFields {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            name: name.into(),
            price,
            image: None,
        }
    }
}

impl RecordFields for ProductFields {
    fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }

    fn image_mut(&mut self) -> &mut Option<ImageHandle> {
        &mut self.image
    }
}

impl Record for ProductRecord {
    type Fields = ProductFields;

    const KIND: &'static str = "product";

    fn new(id: RecordId, fields: ProductFields) -> Self {
        Self {
            id,
            name: fields.name,
            price: fields.price,
            image: fields.image,
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            price: self.price,
            image: self.image.clone(),
        }
    }

    fn apply(&mut self, fields: ProductFields) {
        self.name = fields.name;
        self.price = fields.price;
        self.image = fields.image;
    }
}
