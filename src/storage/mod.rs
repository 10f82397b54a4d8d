//! External file storage and structured record store seams.
//!
//! A `StorageConnector` opens one `StorageSession` per submission (for Google
//! that means one OAuth token exchange). Sessions are dropped with the request.

pub mod google;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;

/// Object storage for uploaded photos.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Create an object inside `container` and return its identifier.
    async fn create_object(
        &self,
        container: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError>;

    /// Make the object readable by anyone holding the link.
    async fn grant_public_read(&self, object_id: &str) -> Result<(), StorageError>;

    /// Resolve a stable, browser-viewable URL for the object.
    async fn viewable_link(&self, object_id: &str) -> Result<String, StorageError>;
}

/// Append-only row store for lead records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append exactly one row. Atomic from the caller's point of view.
    async fn append_row(&self, row: Vec<String>) -> Result<(), StorageError>;
}

/// Stores bound to one submission.
#[derive(Clone)]
pub struct StorageSession {
    pub files: Arc<dyn FileStore>,
    pub records: Arc<dyn RecordStore>,
    /// Folder or bucket uploads are created in.
    pub container: String,
}

/// Opens authenticated storage sessions.
#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn connect(&self) -> Result<StorageSession, StorageError>;
}
