//! Lead sink — the configured destination for finished submissions.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use super::forward::WebhookForwarder;
use super::model::{LeadSubmissionBody, SubmissionReceipt};
use super::pipeline::LeadSubmissionPipeline;
use crate::config::LeadSinkConfig;
use crate::error::{ConfigError, Error, ValidationError};
use crate::storage::StorageConnector;
use crate::storage::google::GoogleConnector;

/// What a submission produced.
#[derive(Debug)]
pub enum SinkResponse {
    /// Stored directly; photo links in order.
    Stored(SubmissionReceipt),
    /// Relayed reply from the automation endpoint.
    Forwarded(Value),
}

pub enum LeadSink {
    Direct(Arc<dyn StorageConnector>),
    Forward(WebhookForwarder),
    /// Every submission fails with a configuration error naming what is missing.
    Unconfigured { missing: String },
}

impl LeadSink {
    pub fn from_config(config: &LeadSinkConfig) -> Self {
        match config {
            LeadSinkConfig::Google(google) => LeadSink::Direct(Arc::new(GoogleConnector::new(google))),
            LeadSinkConfig::Webhook { url } => LeadSink::Forward(WebhookForwarder::new(url.clone())),
            LeadSinkConfig::Unconfigured { missing } => LeadSink::Unconfigured {
                missing: missing.clone(),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LeadSink::Direct(_) => "direct storage".to_string(),
            LeadSink::Forward(forwarder) => format!("webhook ({})", forwarder.url()),
            LeadSink::Unconfigured { missing } => format!("unconfigured (missing {missing})"),
        }
    }

    /// Accept a raw JSON submission body.
    ///
    /// Configuration is checked before anything is parsed or sent.
    pub async fn submit(&self, body: Value) -> Result<SinkResponse, Error> {
        match self {
            LeadSink::Unconfigured { missing } => Err(ConfigError::MissingRequired {
                key: missing.clone(),
                hint: "Set the Google service account variables or LEAD_WEBHOOK_URL.".to_string(),
            }
            .into()),
            LeadSink::Forward(forwarder) => {
                if !body.is_object() {
                    return Err(ValidationError::MalformedBody("expected a JSON object".to_string()).into());
                }
                Ok(SinkResponse::Forwarded(forwarder.forward(&body).await?))
            }
            LeadSink::Direct(connector) => {
                let submission: LeadSubmissionBody = serde_json::from_value(body)
                    .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
                let record = submission.into_record(Utc::now());

                let session = connector.connect().await?;
                let receipt = LeadSubmissionPipeline::new(session).submit(&record).await?;
                Ok(SinkResponse::Stored(receipt))
            }
        }
    }
}
