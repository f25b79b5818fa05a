//! Upload seam for menu images.
//!
//! Failures here are never fatal to the catalog operation that triggered the
//! upload: callers substitute the placeholder (create) or keep the current
//! image (update).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImageError {
    #[error("Image upload failed: {0}")]
    Upstream(String),
}

/// A file received from an admin form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores the image and returns the reference to save on the menu item.
    async fn upload(&self, image: ImageUpload) -> Result<String, ImageError>;
}

/// Embeds the image into the item as a `data:` URL. Rejects images that are
/// not `image/*` or exceed `max_bytes`.
pub struct DataUrlImageStore {
    max_bytes: usize,
}

impl DataUrlImageStore {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl ImageStore for DataUrlImageStore {
    async fn upload(&self, image: ImageUpload) -> Result<String, ImageError> {
        if image.bytes.is_empty() {
            return Err(ImageError::Upstream("empty file".to_string()));
        }
        if image.bytes.len() > self.max_bytes {
            return Err(ImageError::Upstream(format!(
                "{} bytes exceeds the {} byte limit",
                image.bytes.len(),
                self.max_bytes
            )));
        }
        let content_type = image.content_type.as_deref().unwrap_or("application/octet-stream");
        if !content_type.starts_with("image/") {
            return Err(ImageError::Upstream(format!("unsupported content type {content_type}")));
        }
        Ok(format!("data:{content_type};base64,{}", STANDARD.encode(&image.bytes)))
    }
}
