//! Drive v3 file store.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AccessToken;
use super::{parse_json, send_checked};
use crate::error::StorageError;
use crate::storage::FileStore;

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

#[derive(Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileLinks {
    web_view_link: Option<String>,
    web_content_link: Option<String>,
}

/// Uploads photos into a Drive folder.
pub struct DriveFileStore {
    client: reqwest::Client,
    token: AccessToken,
}

impl DriveFileStore {
    pub fn new(client: reqwest::Client, token: AccessToken) -> Self {
        Self { client, token }
    }
}

/// Build a `multipart/related` body: JSON metadata part then the media part.
fn multipart_related(boundary: &str, metadata: &serde_json::Value, mime_type: &str, bytes: &[u8]) -> Vec<u8> {
    let head = format!(
        "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
         --{boundary}\r\nContent-Type: {mime_type}\r\n\r\n"
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    let mut body = Vec::with_capacity(head.len() + bytes.len() + tail.len());
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(tail.as_bytes());
    body
}

#[async_trait]
impl FileStore for DriveFileStore {
    async fn create_object(
        &self,
        container: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let boundary = format!("intake-{}", Uuid::new_v4().simple());
        let metadata = serde_json::json!({
            "name": name,
            "parents": [container],
            "mimeType": mime_type,
        });
        let body = multipart_related(&boundary, &metadata, mime_type, &bytes);

        let request = self
            .client
            .post(UPLOAD_URL)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id"),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(self.token.secret())
            .header(CONTENT_TYPE, format!("multipart/related; boundary={boundary}"))
            .body(body);

        let response = send_checked(request, "drive upload").await?;
        let created: CreatedFile = parse_json(&response, "drive upload")?;
        Ok(created.id)
    }

    async fn grant_public_read(&self, object_id: &str) -> Result<(), StorageError> {
        let request = self
            .client
            .post(format!("{FILES_URL}/{object_id}/permissions"))
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(self.token.secret())
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }));

        send_checked(request, "drive permission").await?;
        Ok(())
    }

    async fn viewable_link(&self, object_id: &str) -> Result<String, StorageError> {
        let request = self
            .client
            .get(format!("{FILES_URL}/{object_id}"))
            .query(&[
                ("fields", "webViewLink,webContentLink"),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(self.token.secret());

        let response = send_checked(request, "drive metadata").await?;
        let links: FileLinks = parse_json(&response, "drive metadata")?;
        links
            .web_view_link
            .or(links.web_content_link)
            .ok_or_else(|| StorageError::InvalidResponse {
                operation: "drive metadata".to_string(),
                reason: format!("file {object_id} has no viewable link"),
            })
    }
}
