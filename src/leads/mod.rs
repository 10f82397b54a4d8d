//! Lead submission — photo uploads and the structured record append.

pub mod forward;
pub mod model;
pub mod pipeline;
pub mod routes;
pub mod sink;
pub mod upload;

pub use forward::WebhookForwarder;
pub use model::{
    AttachmentOutcome, ImageAttachment, LeadRecord, LeadSubmissionBody, SubmissionReceipt,
    UploadedReference,
};
pub use pipeline::{LeadSubmissionPipeline, MAX_ATTACHMENTS};
pub use routes::{LeadRouteState, lead_routes};
pub use sink::{LeadSink, SinkResponse};
pub use upload::ImageUploadService;
