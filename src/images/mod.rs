//! Opaque image handles and the async "request an image" seam
//!
//! Whatever picks the image (an upload today) sits behind [`ImageSource`];
//! `None` always means the pick was cancelled and nothing should change.

use std::fmt;
use std::future::Future;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Reference to image data. The stores carry it around but never look inside.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageHandle(Bytes);

impl ImageHandle {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHandle({} bytes)", self.0.len())
    }
}

impl Serialize for ImageHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for ImageHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Self::new)
            .map_err(de::Error::custom)
    }
}

/// Anything that can asynchronously hand back an image, or `None` on cancellation.
pub trait ImageSource {
    fn request_image(self) -> impl Future<Output = Option<ImageHandle>> + Send;
}

/// Image supplied directly as an upload body. An empty body counts as cancelled.
#[derive(Debug, Clone)]
pub struct UploadedImage(pub Bytes);

impl ImageSource for UploadedImage {
    async fn request_image(self) -> Option<ImageHandle> {
        if self.0.is_empty() {
            None
        } else {
            Some(ImageHandle::new(self.0))
        }
    }
}
