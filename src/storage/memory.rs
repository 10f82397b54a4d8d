//! In-memory stores, used by tests and local dry runs.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{FileStore, RecordStore, StorageConnector, StorageSession};
use crate::error::StorageError;

/// An object held by `MemoryFileStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub container: String,
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub public: bool,
}

/// File store keeping objects in a vector.
///
/// Object ids are the storage names, so links are predictable regardless of
/// upload order.
#[derive(Default)]
pub struct MemoryFileStore {
    objects: Mutex<Vec<StoredObject>>,
    fail_names_containing: Vec<String>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject creation of any object whose name contains `marker`.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_names_containing.push(marker.into());
        self
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn link_for(name: &str) -> String {
        format!("memory://objects/{name}")
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn create_object(
        &self,
        container: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        if self.fail_names_containing.iter().any(|m| name.contains(m.as_str())) {
            return Err(StorageError::Rejected {
                operation: "create object".to_string(),
                status: 500,
                detail: format!("refusing {name}"),
            });
        }
        let mut objects = self.objects.lock().map_err(|e| StorageError::RequestFailed {
            operation: "create object".to_string(),
            reason: e.to_string(),
        })?;
        objects.push(StoredObject {
            container: container.to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
            public: false,
        });
        Ok(name.to_string())
    }

    async fn grant_public_read(&self, object_id: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.lock().map_err(|e| StorageError::RequestFailed {
            operation: "grant permission".to_string(),
            reason: e.to_string(),
        })?;
        match objects.iter_mut().find(|o| o.name == object_id) {
            Some(object) => {
                object.public = true;
                Ok(())
            }
            None => Err(StorageError::Rejected {
                operation: "grant permission".to_string(),
                status: 404,
                detail: format!("no object {object_id}"),
            }),
        }
    }

    async fn viewable_link(&self, object_id: &str) -> Result<String, StorageError> {
        Ok(Self::link_for(object_id))
    }
}

/// Record store keeping rows in a vector.
#[derive(Default)]
pub struct MemoryRecordStore {
    rows: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every append fails.
    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn append_row(&self, row: Vec<String>) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Rejected {
                operation: "append row".to_string(),
                status: 503,
                detail: "record store unavailable".to_string(),
            });
        }
        self.rows
            .lock()
            .map_err(|e| StorageError::RequestFailed {
                operation: "append row".to_string(),
                reason: e.to_string(),
            })?
            .push(row);
        Ok(())
    }
}

/// Connector handing out the same in-memory stores to every submission.
pub struct MemoryConnector {
    pub files: Arc<MemoryFileStore>,
    pub records: Arc<MemoryRecordStore>,
    pub container: String,
}

impl MemoryConnector {
    pub fn new(files: Arc<MemoryFileStore>, records: Arc<MemoryRecordStore>) -> Self {
        Self {
            files,
            records,
            container: "memory-folder".to_string(),
        }
    }
}

#[async_trait]
impl StorageConnector for MemoryConnector {
    async fn connect(&self) -> Result<StorageSession, StorageError> {
        Ok(StorageSession {
            files: self.files.clone(),
            records: self.records.clone(),
            container: self.container.clone(),
        })
    }
}
