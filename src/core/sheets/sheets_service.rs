// Sheets service - every spreadsheet/drive operation the nodes expose.
//
// Each operation is one remote call or a short fixed chain of them
// (lookup sheet id -> build -> execute). The service owns the request
// building and response reshaping; the HTTP details live behind the
// `SpreadsheetsApi` and `DriveApi` ports so everything here is testable
// with in-memory mocks.

use super::cell_value::{cell_text, CellValue};
use super::range::{format_range, range_start_row};
use super::row_deletion::{find_matching_rows, row_deletion_requests};
use super::sheets_models::{
    AddSheetRequest, AppendCellsRequest, AppendValuesResponse, BatchGetValuesResponse,
    BatchRequest, BatchUpdateResponse, CellData, ClearValuesResponse, Corpora, CreatedSpreadsheet,
    DeleteSheetRequest, DriveFile, DriveQuery, FilePage, Grid, NewSheetProperties, RowData,
    SheetProperties, UpdateValuesResponse, ValueInputMode, ValueRange, ValueRenderOption,
};
use crate::core::auth::{AuthContext, AuthError};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Everything a spreadsheet operation can fail with.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

// ============================================================================
// PORTS
// ============================================================================

/// The Sheets v4 calls the service needs.
#[async_trait]
pub trait SpreadsheetsApi: Send + Sync {
    /// Properties of every sheet, in tab order.
    async fn get_sheets(&self, spreadsheet_id: &str) -> Result<Vec<SheetProperties>, SheetsError>;

    /// Creates an empty spreadsheet and returns its id and edit URL.
    async fn create_spreadsheet(&self, title: &str) -> Result<CreatedSpreadsheet, SheetsError>;

    /// Sends structural requests in one `batchUpdate`, replies in request order.
    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<BatchRequest>,
    ) -> Result<BatchUpdateResponse, SheetsError>;

    /// Values of one A1 range. Dates are always rendered as formatted strings.
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        render: ValueRenderOption,
    ) -> Result<ValueRange, SheetsError>;

    /// Values of several ranges in one call, in the order requested.
    async fn batch_get_values(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        render: ValueRenderOption,
    ) -> Result<BatchGetValuesResponse, SheetsError>;

    /// Overwrites a range; `include_values` echoes the written cells back.
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Grid,
        input: ValueInputMode,
        include_values: bool,
    ) -> Result<UpdateValuesResponse, SheetsError>;

    /// Appends rows after the table detected in `range`.
    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Grid,
        input: ValueInputMode,
        include_values: bool,
    ) -> Result<AppendValuesResponse, SheetsError>;

    /// Clears values but keeps formatting.
    async fn clear_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<ClearValuesResponse, SheetsError>;
}

/// The Drive v3 calls the service needs.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// One page of spreadsheets matching `query`.
    async fn list_files(
        &self,
        query: &DriveQuery,
        page_token: Option<&str>,
    ) -> Result<FilePage, SheetsError>;

    /// Copies a file next to the original; Drive names it "Copy of ...".
    async fn copy_file(&self, file_id: &str) -> Result<DriveFile, SheetsError>;
}

// ============================================================================
// RESULTS
// ============================================================================

/// Outcome of appending rows to a table.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendResult {
    pub spreadsheet_id: String,
    /// Only present when the caller asked for the values back.
    pub updated: Option<ValueRange>,
}

/// Outcome of a typed append across several sheets.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchAppendResult {
    pub spreadsheet_id: String,
    /// Raw `batchUpdate` replies, only kept when values were requested.
    pub replies: Option<Vec<Value>>,
}

/// Outcome of writing a range.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteResult {
    pub spreadsheet_id: String,
    pub updated_range: Option<String>,
    pub updated_values: Option<Grid>,
    /// Whether the target sheet had to be created first.
    pub created_sheet: bool,
}

/// Ranges as resolved by the API, paired by index with their values.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRangeRead {
    pub ranges: Vec<String>,
    pub values: Vec<Grid>,
}

/// What `clear_range` did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClearOutcome {
    /// Every value in the range was cleared.
    Cleared { cleared_range: String },
    /// Rows matching the search term were deleted (sheet-absolute indices).
    RowsDeleted { rows: Vec<usize>, replies: Vec<Value> },
    NothingMatched,
}

/// A sheet added to an existing spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedSheet {
    pub spreadsheet_id: String,
    pub title: String,
    /// Id from the `addSheet` reply, when the reply carried one.
    pub sheet_id: Option<i64>,
}

/// Result of deleting a sheet by title.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteSheetOutcome {
    Deleted { spreadsheet_id: String },
    NotFound,
}

// ============================================================================
// LOOKUP
// ============================================================================

/// Id of the sheet titled `title`.
///
/// When several sheets share a title the last one wins.
pub fn find_sheet_id(sheets: &[SheetProperties], title: &str) -> Option<i64> {
    sheets
        .iter()
        .rev()
        .find(|sheet| sheet.title == title)
        .map(|sheet| sheet.sheet_id)
}

// ============================================================================
// SERVICE
// ============================================================================

/// Runs every spreadsheet and Drive operation on top of the two API ports.
///
/// The `AuthContext` is only used directly for logout; the ports carry their
/// own authorized transport.
pub struct SheetsService<S: SpreadsheetsApi, D: DriveApi> {
    sheets: S,
    drive: D,
    auth: AuthContext,
}

impl<S, D> SheetsService<S, D>
where
    S: SpreadsheetsApi,
    D: DriveApi,
{
    pub fn new(sheets: S, drive: D, auth: AuthContext) -> Self {
        Self {
            sheets,
            drive,
            auth,
        }
    }

    /// Spreadsheets on the user's Drive whose name contains `filter`, by name.
    pub async fn list_spreadsheets(
        &self,
        filter: &str,
        corpora: Corpora,
        drive_id: Option<String>,
    ) -> Result<Vec<DriveFile>, SheetsError> {
        let query = DriveQuery::spreadsheets_named(filter, corpora, drive_id);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .drive
                .list_files(&query, page_token.as_deref())
                .await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(count = files.len(), filter, "Listed spreadsheets");
        Ok(files)
    }

    pub async fn copy_spreadsheet(&self, file_id: &str) -> Result<DriveFile, SheetsError> {
        let copy = self.drive.copy_file(file_id).await?;
        tracing::info!(source = file_id, copy = %copy.id, "Copied spreadsheet");
        Ok(copy)
    }

    /// Appends rows to the first table found in `sheet!range`.
    pub async fn append_to_table(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        range: &str,
        data: Grid,
        raw: bool,
        include_values: bool,
    ) -> Result<AppendResult, SheetsError> {
        let range = format_range(sheet, range);
        let response = self
            .sheets
            .append_values(
                spreadsheet_id,
                &range,
                data,
                ValueInputMode::from_raw_flag(raw),
                include_values,
            )
            .await?;

        let updated = if include_values {
            response.updates.and_then(|updates| updates.updated_data)
        } else {
            None
        };

        Ok(AppendResult {
            spreadsheet_id: response.spreadsheet_id,
            updated,
        })
    }

    /// Appends typed cells to several sheets in a single batch update.
    ///
    /// `sheets[i]` receives `data[i]`. Cells are classified as formula,
    /// number, boolean or string unless `raw` is set, in which case every
    /// cell is sent as a string.
    pub async fn batch_append(
        &self,
        spreadsheet_id: &str,
        sheets: &[String],
        data: Vec<Grid>,
        raw: bool,
        include_values: bool,
    ) -> Result<BatchAppendResult, SheetsError> {
        if sheets.len() != data.len() {
            return Err(SheetsError::InvalidInput(
                "input length of the sheets and data list must match".to_string(),
            ));
        }

        let sheet_ids = self.lookup_sheet_ids(spreadsheet_id, sheets).await?;

        let requests = sheet_ids
            .into_iter()
            .zip(data)
            .map(|(sheet_id, grid)| {
                BatchRequest::AppendCells(AppendCellsRequest {
                    sheet_id,
                    rows: grid.iter().map(|row| typed_row(row, raw)).collect(),
                    fields: "*".to_string(),
                })
            })
            .collect();

        let response = self.sheets.batch_update(spreadsheet_id, requests).await?;
        tracing::info!(spreadsheet_id, sheets = sheets.len(), "Batch appended rows");

        Ok(BatchAppendResult {
            spreadsheet_id: response.spreadsheet_id,
            replies: include_values.then_some(response.replies),
        })
    }

    /// Writes values to `sheet!range`, creating the sheet when it is missing.
    pub async fn write(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        range: &str,
        data: Grid,
        raw: bool,
        include_values: bool,
    ) -> Result<WriteResult, SheetsError> {
        let range = format_range(sheet, range);

        let existing = self.sheets.get_sheets(spreadsheet_id).await?;
        let created_sheet = !existing.iter().any(|s| s.title == sheet);
        if created_sheet {
            self.create_sheet(spreadsheet_id, sheet).await?;
        }

        let response = self
            .sheets
            .update_values(
                spreadsheet_id,
                &range,
                data,
                ValueInputMode::from_raw_flag(raw),
                include_values,
            )
            .await?;

        let updated_values = if include_values {
            response.updated_data.map(|data| data.values)
        } else {
            None
        };

        Ok(WriteResult {
            spreadsheet_id: response.spreadsheet_id,
            updated_range: response.updated_range,
            updated_values,
            created_sheet,
        })
    }

    /// Values of `sheet!range`, formatted unless `unformatted` is set.
    pub async fn read(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        range: &str,
        unformatted: bool,
    ) -> Result<Grid, SheetsError> {
        let range = format_range(sheet, range);
        let values = self
            .sheets
            .get_values(
                spreadsheet_id,
                &range,
                ValueRenderOption::from_unformatted_flag(unformatted),
            )
            .await?;
        Ok(values.values)
    }

    /// Reads several ranges at once; no ranges means every sheet.
    pub async fn read_multiple_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        unformatted: bool,
    ) -> Result<MultiRangeRead, SheetsError> {
        let ranges = if ranges.is_empty() {
            self.sheets
                .get_sheets(spreadsheet_id)
                .await?
                .into_iter()
                .map(|sheet| sheet.title)
                .collect()
        } else {
            ranges.to_vec()
        };

        let response = self
            .sheets
            .batch_get_values(
                spreadsheet_id,
                &ranges,
                ValueRenderOption::from_unformatted_flag(unformatted),
            )
            .await?;

        let (ranges, values) = response
            .value_ranges
            .into_iter()
            .map(|vr| (vr.range.unwrap_or_default(), vr.values))
            .unzip();

        Ok(MultiRangeRead { ranges, values })
    }

    /// Clears the values of a range, or deletes the rows containing `search`.
    pub async fn clear_range(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        range: &str,
        search: &str,
    ) -> Result<ClearOutcome, SheetsError> {
        let range = format_range(sheet, range);

        if search.is_empty() {
            let response = self.sheets.clear_values(spreadsheet_id, &range).await?;
            tracing::info!(spreadsheet_id, range = %response.cleared_range, "Cleared range");
            return Ok(ClearOutcome::Cleared {
                cleared_range: response.cleared_range,
            });
        }

        let sheet_id = self
            .lookup_sheet_id(spreadsheet_id, sheet)
            .await?
            .ok_or_else(|| SheetsError::SheetNotFound(sheet.to_string()))?;

        let fetched = self
            .sheets
            .get_values(spreadsheet_id, &range, ValueRenderOption::UnformattedValue)
            .await?;

        // Matches are relative to the fetched block; shift them to sheet rows.
        let first_row = fetched
            .range
            .as_deref()
            .and_then(range_start_row)
            .unwrap_or(0);
        let rows: Vec<usize> = find_matching_rows(&fetched.values, search)
            .into_iter()
            .map(|row| row + first_row)
            .collect();

        if rows.is_empty() {
            tracing::debug!(spreadsheet_id, search, "No rows matched search");
            return Ok(ClearOutcome::NothingMatched);
        }

        let requests = row_deletion_requests(sheet_id, &rows);
        let response = self.sheets.batch_update(spreadsheet_id, requests).await?;
        tracing::info!(spreadsheet_id, deleted = rows.len(), "Deleted matching rows");

        Ok(ClearOutcome::RowsDeleted {
            rows,
            replies: response.replies,
        })
    }

    pub async fn list_sheets(
        &self,
        spreadsheet_id: &str,
    ) -> Result<Vec<SheetProperties>, SheetsError> {
        self.sheets.get_sheets(spreadsheet_id).await
    }

    /// Adds a sheet. Never checks for an existing sheet with the same title.
    pub async fn create_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<CreatedSheet, SheetsError> {
        let request = BatchRequest::AddSheet(AddSheetRequest {
            properties: NewSheetProperties {
                title: title.to_string(),
            },
        });
        let response = self
            .sheets
            .batch_update(spreadsheet_id, vec![request])
            .await?;
        tracing::info!(spreadsheet_id, title, "Created sheet");

        Ok(CreatedSheet {
            sheet_id: response.added_sheet_id(),
            spreadsheet_id: response.spreadsheet_id,
            title: title.to_string(),
        })
    }

    pub async fn create_spreadsheet(
        &self,
        title: &str,
    ) -> Result<CreatedSpreadsheet, SheetsError> {
        let created = self.sheets.create_spreadsheet(title).await?;
        tracing::info!(id = %created.spreadsheet_id, title, "Created spreadsheet");
        Ok(created)
    }

    /// Deletes a sheet by id and returns the spreadsheet id.
    pub async fn delete_sheet_by_id(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
    ) -> Result<String, SheetsError> {
        let request = BatchRequest::DeleteSheet(DeleteSheetRequest { sheet_id });
        let response = self
            .sheets
            .batch_update(spreadsheet_id, vec![request])
            .await?;
        tracing::info!(spreadsheet_id, sheet_id, "Deleted sheet");
        Ok(response.spreadsheet_id)
    }

    /// Deletes a sheet by title; an unknown title issues no delete.
    pub async fn delete_sheet_by_title(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<DeleteSheetOutcome, SheetsError> {
        match self.lookup_sheet_id(spreadsheet_id, title).await? {
            Some(sheet_id) => {
                let spreadsheet_id = self.delete_sheet_by_id(spreadsheet_id, sheet_id).await?;
                Ok(DeleteSheetOutcome::Deleted { spreadsheet_id })
            }
            None => {
                tracing::debug!(spreadsheet_id, title, "Sheet to delete not found");
                Ok(DeleteSheetOutcome::NotFound)
            }
        }
    }

    /// Revokes the stored grant so the next run asks for consent again.
    pub async fn logout(&self) -> Result<bool, SheetsError> {
        Ok(self.auth.revoke().await?)
    }

    /// Id of the sheet titled `title`, if any.
    pub async fn lookup_sheet_id(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<Option<i64>, SheetsError> {
        let sheets = self.sheets.get_sheets(spreadsheet_id).await?;
        Ok(find_sheet_id(&sheets, title))
    }

    /// One id per title, in order. Any unknown title fails the whole lookup.
    pub async fn lookup_sheet_ids(
        &self,
        spreadsheet_id: &str,
        titles: &[String],
    ) -> Result<Vec<i64>, SheetsError> {
        let sheets = self.sheets.get_sheets(spreadsheet_id).await?;
        titles
            .iter()
            .map(|title| {
                find_sheet_id(&sheets, title)
                    .ok_or_else(|| SheetsError::SheetNotFound(title.clone()))
            })
            .collect()
    }
}

fn typed_row(row: &[Value], raw: bool) -> RowData {
    RowData {
        values: row
            .iter()
            .map(|cell| CellData {
                user_entered_value: if raw {
                    CellValue::String(cell_text(cell))
                } else {
                    CellValue::from_json(cell)
                },
            })
            .collect(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
