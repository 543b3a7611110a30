// Models shared by the sheets service and the API clients.
//
// Request/response types use the Sheets v4 and Drive v3 JSON field names so
// the infra clients can serialize them as-is. Nothing in here knows about
// HTTP.

use super::cell_value::CellValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Rows of cells exactly as the values endpoints exchange them.
pub type Grid = Vec<Vec<Value>>;

pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

// ============================================================================
// SPREADSHEETS / SHEETS
// ============================================================================

/// A tab inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct CreatedSpreadsheet {
    pub spreadsheet_id: String,
    pub spreadsheet_url: String,
}

// ============================================================================
// VALUES
// ============================================================================

/// How written text is interpreted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInputMode {
    Raw,
    UserEntered,
}

impl ValueInputMode {
    pub fn from_raw_flag(raw: bool) -> Self {
        if raw {
            ValueInputMode::Raw
        } else {
            ValueInputMode::UserEntered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputMode::Raw => "RAW",
            ValueInputMode::UserEntered => "USER_ENTERED",
        }
    }
}

/// How read values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRenderOption {
    FormattedValue,
    UnformattedValue,
}

impl ValueRenderOption {
    pub fn from_unformatted_flag(unformatted: bool) -> Self {
        if unformatted {
            ValueRenderOption::UnformattedValue
        } else {
            ValueRenderOption::FormattedValue
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueRenderOption::FormattedValue => "FORMATTED_VALUE",
            ValueRenderOption::UnformattedValue => "UNFORMATTED_VALUE",
        }
    }
}

/// Dates are always read back as formatted strings.
pub const DATE_TIME_RENDER_OPTION: &str = "FORMATTED_STRING";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Grid,
}

impl ValueRange {
    pub fn from_values(values: Grid) -> Self {
        Self {
            range: None,
            major_dimension: None,
            values,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_data: Option<ValueRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub cleared_range: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub value_ranges: Vec<ValueRange>,
}

// ============================================================================
// BATCH UPDATE
// ============================================================================

/// One entry of a `spreadsheets.batchUpdate` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchRequest {
    AddSheet(AddSheetRequest),
    DeleteSheet(DeleteSheetRequest),
    AppendCells(AppendCellsRequest),
    DeleteRange(DeleteRangeRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddSheetRequest {
    pub properties: NewSheetProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSheetProperties {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSheetRequest {
    pub sheet_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendCellsRequest {
    pub sheet_id: i64,
    pub rows: Vec<RowData>,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowData {
    pub values: Vec<CellData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub user_entered_value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRangeRequest {
    pub range: GridRange,
    pub shift_dimension: Dimension,
}

/// Half-open row span `[start_row_index, end_row_index)` on one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: usize,
    pub end_row_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    Rows,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub replies: Vec<Value>,
}

impl BatchUpdateResponse {
    /// Sheet id reported by the first `addSheet` reply, if any.
    pub fn added_sheet_id(&self) -> Option<i64> {
        self.replies
            .iter()
            .find_map(|reply| reply.pointer("/addSheet/properties/sheetId"))
            .and_then(Value::as_i64)
    }
}

// ============================================================================
// DRIVE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Scope of a Drive file search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Corpora {
    User,
    Drive,
    Domain,
    #[default]
    AllDrives,
}

impl Corpora {
    pub fn as_str(&self) -> &'static str {
        match self {
            Corpora::User => "user",
            Corpora::Drive => "drive",
            Corpora::Domain => "domain",
            Corpora::AllDrives => "allDrives",
        }
    }

    /// Whether shared drive items have to be requested explicitly.
    pub fn spans_shared_drives(&self) -> bool {
        matches!(self, Corpora::Drive | Corpora::AllDrives)
    }
}

impl fmt::Display for Corpora {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Corpora {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Corpora::User),
            "drive" => Ok(Corpora::Drive),
            "domain" => Ok(Corpora::Domain),
            "allDrives" | "" => Ok(Corpora::AllDrives),
            other => Err(format!(
                "Unknown corpora '{}'. Expected one of: user, drive, domain, allDrives",
                other
            )),
        }
    }
}

/// Parameters of a `files.list` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveQuery {
    pub q: String,
    pub corpora: Corpora,
    pub drive_id: Option<String>,
    pub page_size: u32,
    pub order_by: String,
    pub fields: String,
}

impl DriveQuery {
    /// Query for spreadsheets whose name contains `filter`.
    pub fn spreadsheets_named(filter: &str, corpora: Corpora, drive_id: Option<String>) -> Self {
        Self {
            q: format!(
                "mimeType='{}' and name contains '{}'",
                SPREADSHEET_MIME_TYPE,
                escape_query_literal(filter)
            ),
            corpora,
            drive_id,
            page_size: 1000,
            order_by: "name".to_string(),
            fields: "nextPageToken, files(id, name)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Escapes a string literal for the Drive query language.
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_request_wire_shape() {
        let request = BatchRequest::DeleteRange(DeleteRangeRequest {
            range: GridRange {
                sheet_id: 9,
                start_row_index: 4,
                end_row_index: 5,
            },
            shift_dimension: Dimension::Rows,
        });

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "deleteRange": {
                    "range": { "sheetId": 9, "startRowIndex": 4, "endRowIndex": 5 },
                    "shiftDimension": "ROWS"
                }
            })
        );
    }

    #[test]
    fn test_append_cells_wire_shape() {
        let request = BatchRequest::AppendCells(AppendCellsRequest {
            sheet_id: 3,
            rows: vec![RowData {
                values: vec![CellData {
                    user_entered_value: CellValue::Boolean(true),
                }],
            }],
            fields: "*".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "appendCells": {
                    "sheetId": 3,
                    "rows": [{ "values": [{ "userEnteredValue": { "boolValue": true } }] }],
                    "fields": "*"
                }
            })
        );
    }

    #[test]
    fn test_added_sheet_id_from_reply() {
        let response: BatchUpdateResponse = serde_json::from_value(json!({
            "spreadsheetId": "abc",
            "replies": [{ "addSheet": { "properties": { "sheetId": 1234, "title": "New" } } }]
        }))
        .unwrap();

        assert_eq!(response.added_sheet_id(), Some(1234));
    }

    #[test]
    fn test_drive_query_escapes_filter() {
        let query = DriveQuery::spreadsheets_named("O'Brien", Corpora::User, None);
        assert_eq!(
            query.q,
            "mimeType='application/vnd.google-apps.spreadsheet' and name contains 'O\\'Brien'"
        );
        assert_eq!(query.page_size, 1000);
    }

    #[test]
    fn test_corpora_parsing() {
        assert_eq!("allDrives".parse::<Corpora>(), Ok(Corpora::AllDrives));
        assert_eq!("user".parse::<Corpora>(), Ok(Corpora::User));
        assert!("everything".parse::<Corpora>().is_err());
        assert!(Corpora::Drive.spans_shared_drives());
        assert!(!Corpora::Domain.spans_shared_drives());
    }
}
