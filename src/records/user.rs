//! User records

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{require, Record, RecordFields, RecordId, ValidationError};
use crate::images::ImageHandle;

/// A user entry. The pincode is shown to operators but kept out of logs.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: RecordId,
    pub username: String,
    pub pincode: String,
    pub profile_image: Option<ImageHandle>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("pincode", &"<redacted>")
            .field("profile_image", &self.profile_image)
            .finish()
    }
}

/// Absent text fields decode as empty so validation reports them
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct UserFields {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub profile_image: Option<ImageHandle>,
}

#[cfg(test)]
impl UserFields {
    pub fn new(username: impl Into<String>, pincode: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            pincode: pincode.into(),
            profile_image: None,
        }
    }

    pub fn with_image(mut self, image: ImageHandle) -> Self {
        self.profile_image = Some(image);
        self
    }
}

impl fmt::Debug for UserFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFields")
            .field("username", &self.username)
            .field("pincode", &"<redacted>")
            .field("profile_image", &self.profile_image)
            .finish()
    }
}

impl RecordFields for UserFields {
    fn normalize(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.pincode = self.pincode.trim().to_string();
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("pincode", &self.pincode)
    }

    fn image_mut(&mut self) -> &mut Option<ImageHandle> {
        &mut self.profile_image
    }
}

impl Record for UserRecord {
    type Fields = UserFields;

    const KIND: &'static str = "user";

    fn new(id: RecordId, fields: UserFields) -> Self {
        Self {
            id,
            username: fields.username,
            pincode: fields.pincode,
            profile_image: fields.profile_image,
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn fields(&self) -> UserFields {
        UserFields {
            username: self.username.clone(),
            pincode: self.pincode.clone(),
            profile_image: self.profile_image.clone(),
        }
    }

    fn apply(&mut self, fields: UserFields) {
        self.username = fields.username;
        self.pincode = fields.pincode;
        self.profile_image = fields.profile_image;
    }
}
