//! Image upload service: decode, name, upload, publish, resolve link.

use std::sync::{Arc, LazyLock};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use chrono::Utc;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use super::model::ImageAttachment;
use crate::error::StorageError;
use crate::storage::FileStore;

/// MIME type assumed when the client sends none.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";
/// File name assumed when the client sends none.
pub const DEFAULT_FILE_NAME: &str = "photo.jpg";
/// Longest storage name produced by `sanitize_name`.
pub const MAX_NAME_LEN: usize = 120;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_.\-]+").expect("static regex is valid")
});

/// Replace every run of characters outside `[A-Za-z0-9_.-]` with `_` and cap the length.
pub fn sanitize_name(raw: &str) -> String {
    UNSAFE_CHARS
        .replace_all(raw, "_")
        .chars()
        .take(MAX_NAME_LEN)
        .collect()
}

/// Collision-resistant storage name: millis, a random fragment, then the original name.
pub fn storage_name(original: &str) -> String {
    let original = match original.trim() {
        "" => DEFAULT_FILE_NAME,
        name => name,
    };
    let unique = Uuid::new_v4().simple().to_string();
    sanitize_name(&format!(
        "{}_{}_{}",
        Utc::now().timestamp_millis(),
        &unique[..8],
        original
    ))
}

/// An attachment ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub name: String,
}

/// Split an optional `data:<mime>;base64,` header from the payload.
fn split_data_url(data: &str) -> (Option<&str>, &str) {
    let data = data.trim();
    if let Some(rest) = data.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            return (mime, payload);
        }
    }
    (None, data)
}

/// Decode base64, tolerating whitespace and missing padding.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, StorageError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(compact.trim_end_matches('=')))
        .map_err(|e| StorageError::Decode(e.to_string()))
}

/// Decode and name an attachment. The payload must be non-empty.
pub fn prepare(attachment: &ImageAttachment) -> Result<PreparedImage, StorageError> {
    let (url_mime, payload) = split_data_url(&attachment.data);
    let bytes = decode_payload(payload)?;
    if bytes.is_empty() {
        return Err(StorageError::Decode("payload decoded to zero bytes".to_string()));
    }

    let mime_type = match attachment.mime_type.trim() {
        "" => url_mime.unwrap_or(DEFAULT_MIME_TYPE).to_string(),
        mime => mime.to_string(),
    };

    Ok(PreparedImage {
        bytes,
        mime_type,
        name: storage_name(&attachment.file_name),
    })
}

/// Uploads single images to a file store and returns their viewable links.
pub struct ImageUploadService {
    files: Arc<dyn FileStore>,
    container: String,
}

impl ImageUploadService {
    pub fn new(files: Arc<dyn FileStore>, container: impl Into<String>) -> Self {
        Self {
            files,
            container: container.into(),
        }
    }

    /// Create the object, grant public read, resolve the link. Any failing step fails the upload.
    pub async fn upload(&self, image: PreparedImage) -> Result<String, StorageError> {
        let PreparedImage {
            bytes,
            mime_type,
            name,
        } = image;
        let size = bytes.len();

        let object_id = self
            .files
            .create_object(&self.container, &name, &mime_type, bytes)
            .await?;
        self.files.grant_public_read(&object_id).await?;
        let url = self.files.viewable_link(&object_id).await?;

        debug!(name = %name, mime = %mime_type, size, object_id = %object_id, "Image uploaded");
        Ok(url)
    }
}
