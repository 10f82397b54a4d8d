//! Delegating variant: hand the whole submission to an automation endpoint.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::StorageError;

/// Forwards raw submission bodies to a single webhook URL.
pub struct WebhookForwarder {
    client: reqwest::Client,
    url: String,
}

impl WebhookForwarder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the body unchanged (unknown fields included) and return the
    /// automation's reply. Non-JSON replies are wrapped as `{ ok, raw }`.
    pub async fn forward(&self, body: &Value) -> Result<Value, StorageError> {
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed {
                operation: "lead webhook".to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| StorageError::RequestFailed {
            operation: "lead webhook".to_string(),
            reason: format!("Failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Lead webhook rejected submission");
            return Err(StorageError::Rejected {
                operation: "lead webhook".to_string(),
                status: status.as_u16(),
                detail: text,
            });
        }

        info!(status = status.as_u16(), "Lead forwarded to webhook");
        Ok(serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::json!({ "ok": true, "raw": text })))
    }
}
