//! Lead records, attachments and submission results.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An inline photo attached to a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    /// Empty when the client did not say.
    pub mime_type: String,
    /// Base64 payload, optionally prefixed with a `data:` URL header.
    pub data: String,
}

/// A finished enquiry, ready to persist. Immutable once built.
#[derive(Debug, Clone)]
pub struct LeadRecord {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub contact: String,
    pub postcode: String,
    pub enquiry: String,
    pub summary: String,
    pub attachments: Vec<ImageAttachment>,
}

impl LeadRecord {
    /// ISO-8601 timestamp with millisecond precision, e.g. `2024-05-01T09:30:00.000Z`.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Link to one successfully uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedReference {
    /// 1-based label among successful uploads ("Photo N").
    pub display_index: usize,
    pub url: String,
}

/// What happened to one attachment. `position` is its 1-based place in the submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AttachmentOutcome {
    Uploaded { position: usize, url: String },
    Skipped { position: usize, reason: String },
    Failed { position: usize, reason: String },
}

/// Result of an accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub accepted: bool,
    pub references: Vec<UploadedReference>,
    /// Per-attachment outcomes, in submission order.
    pub outcomes: Vec<AttachmentOutcome>,
}

impl SubmissionReceipt {
    pub fn urls(&self) -> Vec<String> {
        self.references.iter().map(|r| r.url.clone()).collect()
    }
}

/// Photo entry in the submission body.
#[derive(Debug, Default, Deserialize)]
pub struct ImagePayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

/// JSON body of the lead-submission endpoint. Missing or `null` fields are empty.
#[derive(Debug, Default, Deserialize)]
pub struct LeadSubmissionBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub enquiry: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ImagePayload>>,
}

fn trimmed(field: Option<String>) -> String {
    field.map(|v| v.trim().to_string()).unwrap_or_default()
}

impl LeadSubmissionBody {
    pub fn into_record(self, timestamp: DateTime<Utc>) -> LeadRecord {
        LeadRecord {
            timestamp,
            name: trimmed(self.name),
            contact: trimmed(self.contact),
            postcode: trimmed(self.postcode),
            enquiry: trimmed(self.enquiry),
            summary: trimmed(self.summary),
            attachments: self
                .images
                .unwrap_or_default()
                .into_iter()
                .map(|img| ImageAttachment {
                    file_name: img.name.unwrap_or_default(),
                    mime_type: img.mime.unwrap_or_default(),
                    data: img.data.unwrap_or_default(),
                })
                .collect(),
        }
    }
}
