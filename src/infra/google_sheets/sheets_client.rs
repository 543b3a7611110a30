use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::core::sheets::sheets_models::{
    AppendValuesResponse, BatchGetValuesResponse, BatchRequest, BatchUpdateResponse,
    ClearValuesResponse, UpdateValuesResponse, DATE_TIME_RENDER_OPTION,
};
use crate::core::sheets::{
    CreatedSpreadsheet, Grid, SheetProperties, SheetsError, SpreadsheetsApi, ValueInputMode,
    ValueRange, ValueRenderOption,
};
use crate::infra::google_api::transport::endpoint;
use crate::infra::google_api::ApiTransport;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Sheets v4 REST client. Only the calls the core layer needs are exposed.
pub struct GoogleSheetsClient {
    transport: Arc<ApiTransport>,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(transport: Arc<ApiTransport>) -> Self {
        Self {
            transport,
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    fn spreadsheet_url(
        &self,
        spreadsheet_id: &str,
        action: Option<&str>,
    ) -> Result<Url, SheetsError> {
        match action {
            Some(action) => {
                let target = format!("{}:{}", spreadsheet_id, action);
                endpoint(&self.base_url, &[target.as_str()])
            }
            None => endpoint(&self.base_url, &[spreadsheet_id]),
        }
    }

    fn values_url(
        &self,
        spreadsheet_id: &str,
        range: &str,
        action: Option<&str>,
    ) -> Result<Url, SheetsError> {
        let last = match action {
            Some(action) => format!("{}:{}", range, action),
            None => range.to_string(),
        };
        endpoint(&self.base_url, &[spreadsheet_id, "values", last.as_str()])
    }

    /// Read options; dates always come back as formatted strings.
    fn render_query(render: ValueRenderOption) -> [(&'static str, &'static str); 2] {
        [
            ("valueRenderOption", render.as_str()),
            ("dateTimeRenderOption", DATE_TIME_RENDER_OPTION),
        ]
    }

    fn write_query(
        input: ValueInputMode,
        include_values: bool,
    ) -> [(&'static str, &'static str); 2] {
        [
            ("valueInputOption", input.as_str()),
            (
                "includeValuesInResponse",
                if include_values { "true" } else { "false" },
            ),
        ]
    }

    fn read_request(
        &self,
        spreadsheet_id: &str,
        range: &str,
        render: ValueRenderOption,
    ) -> Result<RequestBuilder, SheetsError> {
        let url = self.values_url(spreadsheet_id, range, None)?;
        Ok(self
            .transport
            .request(Method::GET, url)
            .query(&Self::render_query(render)))
    }

    fn write_body(range: &str, values: Grid) -> ValueRange {
        ValueRange {
            range: Some(range.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values,
        }
    }
}

#[async_trait]
impl SpreadsheetsApi for GoogleSheetsClient {
    async fn get_sheets(&self, spreadsheet_id: &str) -> Result<Vec<SheetProperties>, SheetsError> {
        let url = self.spreadsheet_url(spreadsheet_id, None)?;
        let request = self
            .transport
            .request(Method::GET, url)
            .query(&[("fields", "sheets.properties(sheetId,title)")]);

        let spreadsheet: ApiSpreadsheet = self.transport.execute(request).await?;
        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties)
            .collect())
    }

    async fn create_spreadsheet(&self, title: &str) -> Result<CreatedSpreadsheet, SheetsError> {
        let url =
            Url::parse(&self.base_url).map_err(|e| SheetsError::InvalidInput(e.to_string()))?;
        let request = self
            .transport
            .request(Method::POST, url)
            .json(&json!({ "properties": { "title": title } }));

        let created: ApiCreatedSpreadsheet = self.transport.execute(request).await?;
        Ok(CreatedSpreadsheet {
            spreadsheet_id: created.spreadsheet_id,
            spreadsheet_url: created.spreadsheet_url,
        })
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<BatchRequest>,
    ) -> Result<BatchUpdateResponse, SheetsError> {
        let url = self.spreadsheet_url(spreadsheet_id, Some("batchUpdate"))?;
        let request = self
            .transport
            .request(Method::POST, url)
            .json(&json!({ "requests": requests }));

        self.transport.execute(request).await
    }

    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        render: ValueRenderOption,
    ) -> Result<ValueRange, SheetsError> {
        let request = self.read_request(spreadsheet_id, range, render)?;
        self.transport.execute(request).await
    }

    async fn batch_get_values(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        render: ValueRenderOption,
    ) -> Result<BatchGetValuesResponse, SheetsError> {
        let url = endpoint(&self.base_url, &[spreadsheet_id, "values:batchGet"])?;
        let range_params: Vec<(&str, &str)> =
            ranges.iter().map(|range| ("ranges", range.as_str())).collect();
        let request = self
            .transport
            .request(Method::GET, url)
            .query(&range_params)
            .query(&Self::render_query(render));

        self.transport.execute(request).await
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Grid,
        input: ValueInputMode,
        include_values: bool,
    ) -> Result<UpdateValuesResponse, SheetsError> {
        let url = self.values_url(spreadsheet_id, range, None)?;
        let request = self
            .transport
            .request(Method::PUT, url)
            .query(&Self::write_query(input, include_values))
            .json(&Self::write_body(range, values));

        self.transport.execute(request).await
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Grid,
        input: ValueInputMode,
        include_values: bool,
    ) -> Result<AppendValuesResponse, SheetsError> {
        let url = self.values_url(spreadsheet_id, range, Some("append"))?;
        let request = self
            .transport
            .request(Method::POST, url)
            .query(&Self::write_query(input, include_values))
            .json(&Self::write_body(range, values));

        self.transport.execute(request).await
    }

    async fn clear_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<ClearValuesResponse, SheetsError> {
        let url = self.values_url(spreadsheet_id, range, Some("clear"))?;
        let request = self.transport.request(Method::POST, url).json(&json!({}));

        self.transport.execute(request).await
    }
}

// ============================================================================
// API response shapes that only exist at the HTTP boundary
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiSpreadsheet {
    #[serde(default)]
    sheets: Vec<ApiSheet>,
}

#[derive(Debug, Deserialize)]
struct ApiSheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCreatedSpreadsheet {
    spreadsheet_id: String,
    #[serde(default)]
    spreadsheet_url: String,
}
