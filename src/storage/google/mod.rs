//! Google Drive + Sheets storage via a service account.

mod auth;
mod drive;
mod sheets;

pub use auth::{AccessToken, ServiceAccount};
pub use drive::DriveFileStore;
pub use sheets::SheetsRecordStore;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{StorageConnector, StorageSession};
use crate::config::GoogleConfig;
use crate::error::StorageError;

/// Opens a Drive/Sheets session per submission.
pub struct GoogleConnector {
    client: reqwest::Client,
    account: ServiceAccount,
    drive_folder_id: String,
    sheet_id: String,
    sheet_tab: String,
}

impl GoogleConnector {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            account: ServiceAccount::new(
                config.service_account_email.clone(),
                config.private_key.clone(),
            ),
            drive_folder_id: config.drive_folder_id.clone(),
            sheet_id: config.sheet_id.clone(),
            sheet_tab: config.sheet_tab.clone(),
        }
    }
}

#[async_trait]
impl StorageConnector for GoogleConnector {
    async fn connect(&self) -> Result<StorageSession, StorageError> {
        let token = self.account.access_token(&self.client).await?;
        debug!(account = %self.account.email(), "Google access token obtained");

        Ok(StorageSession {
            files: Arc::new(DriveFileStore::new(self.client.clone(), token.clone())),
            records: Arc::new(SheetsRecordStore::new(
                self.client.clone(),
                token,
                self.sheet_id.clone(),
                self.sheet_tab.clone(),
            )),
            container: self.drive_folder_id.clone(),
        })
    }
}

/// Send a request and return the body, mapping transport failures and
/// non-success statuses to `StorageError`.
async fn send_checked(
    request: reqwest::RequestBuilder,
    operation: &str,
) -> Result<String, StorageError> {
    let response = request.send().await.map_err(|e| StorageError::RequestFailed {
        operation: operation.to_string(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| StorageError::RequestFailed {
        operation: operation.to_string(),
        reason: format!("Failed to read response body: {e}"),
    })?;

    if !status.is_success() {
        return Err(StorageError::Rejected {
            operation: operation.to_string(),
            status: status.as_u16(),
            detail: body,
        });
    }
    Ok(body)
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str, operation: &str) -> Result<T, StorageError> {
    serde_json::from_str(body).map_err(|e| StorageError::InvalidResponse {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}
