//! Sheets v4 record store.

use async_trait::async_trait;

use super::auth::AccessToken;
use super::send_checked;
use crate::error::StorageError;
use crate::storage::RecordStore;

const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Appends lead rows to one tab of a spreadsheet.
pub struct SheetsRecordStore {
    client: reqwest::Client,
    token: AccessToken,
    sheet_id: String,
    tab: String,
}

impl SheetsRecordStore {
    pub fn new(client: reqwest::Client, token: AccessToken, sheet_id: String, tab: String) -> Self {
        Self {
            client,
            token,
            sheet_id,
            tab,
        }
    }

    fn append_url(&self) -> String {
        let range = format!("{}!A:Z", self.tab);
        format!(
            "{SHEETS_URL}/{}/values/{}:append",
            self.sheet_id,
            urlencoding::encode(&range)
        )
    }
}

#[async_trait]
impl RecordStore for SheetsRecordStore {
    async fn append_row(&self, row: Vec<String>) -> Result<(), StorageError> {
        // USER_ENTERED so the photo HYPERLINK formula is evaluated.
        let request = self
            .client
            .post(self.append_url())
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(self.token.secret())
            .json(&serde_json::json!({ "values": [row] }));

        send_checked(request, "sheets append").await?;
        Ok(())
    }
}
