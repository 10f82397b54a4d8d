//! Lead submission pipeline — uploads photos best-effort, then appends one row.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::model::{AttachmentOutcome, ImageAttachment, LeadRecord, SubmissionReceipt, UploadedReference};
use super::upload::{self, ImageUploadService};
use crate::error::StorageError;
use crate::storage::StorageSession;

/// Attachments beyond this many are dropped without error.
pub const MAX_ATTACHMENTS: usize = 3;
/// Uploads in flight at once within one submission.
pub const MAX_CONCURRENT_UPLOADS: usize = 3;

/// Build the single spreadsheet cell linking every uploaded photo.
///
/// `=HYPERLINK("u1","Photo 1") & CHAR(10) & HYPERLINK("u2","Photo 2")`, or an
/// empty string when nothing was uploaded.
pub fn hyperlink_cell(references: &[UploadedReference]) -> String {
    if references.is_empty() {
        return String::new();
    }
    let terms: Vec<String> = references
        .iter()
        .map(|r| {
            format!(
                "HYPERLINK(\"{}\",\"Photo {}\")",
                r.url.replace('"', "\"\""),
                r.display_index
            )
        })
        .collect();
    format!("={}", terms.join(" & CHAR(10) & "))
}

/// Row layout: timestamp, name, contact, postcode, enquiry, summary, photo links.
pub fn record_row(record: &LeadRecord, photo_cell: String) -> Vec<String> {
    vec![
        record.timestamp_iso(),
        record.name.clone(),
        record.contact.clone(),
        record.postcode.clone(),
        record.enquiry.clone(),
        record.summary.clone(),
        photo_cell,
    ]
}

/// Number the successful uploads in submission order.
fn collect_references(outcomes: &[AttachmentOutcome]) -> Vec<UploadedReference> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            AttachmentOutcome::Uploaded { url, .. } => Some(url.clone()),
            _ => None,
        })
        .enumerate()
        .map(|(i, url)| UploadedReference {
            display_index: i + 1,
            url,
        })
        .collect()
}

/// Drives one submission against an open storage session.
pub struct LeadSubmissionPipeline {
    uploads: ImageUploadService,
    session: StorageSession,
}

impl LeadSubmissionPipeline {
    pub fn new(session: StorageSession) -> Self {
        Self {
            uploads: ImageUploadService::new(session.files.clone(), session.container.clone()),
            session,
        }
    }

    async fn process(&self, position: usize, attachment: &ImageAttachment) -> AttachmentOutcome {
        if attachment.data.trim().is_empty() {
            return AttachmentOutcome::Skipped {
                position,
                reason: "empty payload".to_string(),
            };
        }

        let result = match upload::prepare(attachment) {
            Ok(prepared) => self.uploads.upload(prepared).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(url) => AttachmentOutcome::Uploaded { position, url },
            Err(e) => {
                warn!(position, file = %attachment.file_name, error = %e, "Photo upload failed, skipping");
                AttachmentOutcome::Failed {
                    position,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Upload up to `MAX_ATTACHMENTS` photos, then append the lead row.
    ///
    /// Photo failures are recorded in the receipt and never abort the
    /// submission. A failed append fails the whole submission; photos already
    /// uploaded stay where they are.
    pub async fn submit(&self, record: &LeadRecord) -> Result<SubmissionReceipt, StorageError> {
        let dropped = record.attachments.len().saturating_sub(MAX_ATTACHMENTS);
        if dropped > 0 {
            info!(dropped, "Ignoring attachments beyond the limit");
        }

        let batch: Vec<(usize, ImageAttachment)> = record
            .attachments
            .iter()
            .take(MAX_ATTACHMENTS)
            .cloned()
            .enumerate()
            .collect();

        // `buffered` keeps results in input order whatever finishes first.
        let outcomes: Vec<AttachmentOutcome> = stream::iter(batch)
            .map(|(i, attachment)| async move { self.process(i + 1, &attachment).await })
            .buffered(MAX_CONCURRENT_UPLOADS)
            .collect()
            .await;

        let references = collect_references(&outcomes);
        let row = record_row(record, hyperlink_cell(&references));
        self.session.records.append_row(row).await?;

        info!(
            photos = references.len(),
            attempted = outcomes.len(),
            postcode = %record.postcode,
            "Lead recorded"
        );

        Ok(SubmissionReceipt {
            accepted: true,
            references,
            outcomes,
        })
    }
}
