use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

use crate::core::sheets::{DriveApi, DriveFile, DriveQuery, FilePage, SheetsError};
use crate::infra::google_api::transport::endpoint;
use crate::infra::google_api::ApiTransport;

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3/files";

/// Drive v3 client for listing and copying spreadsheets.
pub struct GoogleDriveClient {
    transport: Arc<ApiTransport>,
    base_url: String,
}

impl GoogleDriveClient {
    pub fn new(transport: Arc<ApiTransport>) -> Self {
        Self {
            transport,
            base_url: DRIVE_API_BASE.to_string(),
        }
    }

    /// Query parameters of one `files.list` page.
    fn list_params(query: &DriveQuery, page_token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.q.clone()),
            ("corpora", query.corpora.as_str().to_string()),
            ("pageSize", query.page_size.to_string()),
            ("orderBy", query.order_by.clone()),
            ("fields", query.fields.clone()),
        ];

        if query.corpora.spans_shared_drives() {
            params.push(("includeItemsFromAllDrives", "true".to_string()));
            params.push(("supportsAllDrives", "true".to_string()));
        }
        if let Some(drive_id) = &query.drive_id {
            params.push(("driveId", drive_id.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        params
    }
}

#[async_trait]
impl DriveApi for GoogleDriveClient {
    async fn list_files(
        &self,
        query: &DriveQuery,
        page_token: Option<&str>,
    ) -> Result<FilePage, SheetsError> {
        let url = endpoint(&self.base_url, &[])?;
        let request = self
            .transport
            .request(Method::GET, url)
            .query(&Self::list_params(query, page_token));

        self.transport.execute(request).await
    }

    async fn copy_file(&self, file_id: &str) -> Result<DriveFile, SheetsError> {
        let url = endpoint(&self.base_url, &[file_id, "copy"])?;
        let request = self
            .transport
            .request(Method::POST, url)
            .query(&[("supportsAllDrives", "true"), ("fields", "id, name")])
            .json(&json!({}));

        self.transport.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sheets::Corpora;

    fn value<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_all_drives_listing_params() {
        let query = DriveQuery::spreadsheets_named("Budget", Corpora::AllDrives, None);
        let params = GoogleDriveClient::list_params(&query, None);

        assert_eq!(value(&params, "corpora"), Some("allDrives"));
        assert_eq!(value(&params, "pageSize"), Some("1000"));
        assert_eq!(value(&params, "orderBy"), Some("name"));
        assert_eq!(value(&params, "includeItemsFromAllDrives"), Some("true"));
        assert_eq!(value(&params, "supportsAllDrives"), Some("true"));
        assert!(value(&params, "pageToken").is_none());
        assert!(value(&params, "q").unwrap().contains("name contains 'Budget'"));
    }

    #[test]
    fn test_user_listing_skips_shared_drive_flags() {
        let query = DriveQuery::spreadsheets_named("", Corpora::User, None);
        let params = GoogleDriveClient::list_params(&query, Some("next-page"));

        assert!(value(&params, "includeItemsFromAllDrives").is_none());
        assert!(value(&params, "supportsAllDrives").is_none());
        assert_eq!(value(&params, "pageToken"), Some("next-page"));
    }

    #[test]
    fn test_drive_id_forwarded() {
        let query =
            DriveQuery::spreadsheets_named("x", Corpora::Drive, Some("0AbCdEf".to_string()));
        let params = GoogleDriveClient::list_params(&query, None);

        assert_eq!(value(&params, "driveId"), Some("0AbCdEf"));
        assert_eq!(value(&params, "corpora"), Some("drive"));
    }

    #[test]
    fn test_file_page_decoding() {
        let body = r#"{"nextPageToken": "tok", "files": [{"id": "1", "name": "A"}]}"#;
        let page: FilePage = serde_json::from_str(body).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
        assert_eq!(page.files[0].name, "A");
    }
}
