// One method per host node.
//
// Nodes take the host's scalar and list arguments, run the matching service
// operation, and flatten the result into the node's output struct.

use super::outputs::{
    BatchAppended, CopiedSpreadsheet, RangeCleared, RangesRead, ReadData, SheetCreated,
    SheetDeleted, SheetList, SpreadsheetCreated, SpreadsheetList, ValuesWritten,
};
use crate::core::sheets::{Corpora, DriveApi, Grid, SheetsError, SheetsService, SpreadsheetsApi};

pub struct SheetsNodes<S: SpreadsheetsApi, D: DriveApi> {
    service: SheetsService<S, D>,
}

impl<S, D> SheetsNodes<S, D>
where
    S: SpreadsheetsApi,
    D: DriveApi,
{
    pub fn new(service: SheetsService<S, D>) -> Self {
        Self { service }
    }

    pub async fn get_google_sheet_files(
        &self,
        filter: &str,
        corpora: Corpora,
        drive_id: Option<String>,
    ) -> Result<SpreadsheetList, SheetsError> {
        let files = self.service.list_spreadsheets(filter, corpora, drive_id).await?;
        Ok(files.into())
    }

    pub async fn copy_google_sheet(&self, file_id: &str) -> Result<CopiedSpreadsheet, SheetsError> {
        Ok(self.service.copy_spreadsheet(file_id).await?.into())
    }

    pub async fn append_data_to_table(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        range: &str,
        data: Grid,
        raw: bool,
        include_values: bool,
    ) -> Result<ValuesWritten, SheetsError> {
        let result = self
            .service
            .append_to_table(spreadsheet_id, sheet, range, data, raw, include_values)
            .await?;
        Ok(result.into())
    }

    pub async fn batch_append_data(
        &self,
        spreadsheet_id: &str,
        sheets: &[String],
        data: Vec<Grid>,
        raw: bool,
        include_values: bool,
    ) -> Result<BatchAppended, SheetsError> {
        let result = self
            .service
            .batch_append(spreadsheet_id, sheets, data, raw, include_values)
            .await?;
        Ok(result.into())
    }

    pub async fn write_data(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        range: &str,
        data: Grid,
        raw: bool,
        include_values: bool,
    ) -> Result<ValuesWritten, SheetsError> {
        let result = self
            .service
            .write(spreadsheet_id, sheet, range, data, raw, include_values)
            .await?;
        Ok(result.into())
    }

    pub async fn read_data(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        range: &str,
        unformatted: bool,
    ) -> Result<ReadData, SheetsError> {
        let data = self
            .service
            .read(spreadsheet_id, sheet, range, unformatted)
            .await?;
        Ok(ReadData { data })
    }

    pub async fn read_multiple_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        unformatted: bool,
    ) -> Result<RangesRead, SheetsError> {
        let read = self
            .service
            .read_multiple_ranges(spreadsheet_id, ranges, unformatted)
            .await?;
        Ok(read.into())
    }

    pub async fn clear_range(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        range: &str,
        search: &str,
    ) -> Result<RangeCleared, SheetsError> {
        let outcome = self
            .service
            .clear_range(spreadsheet_id, sheet, range, search)
            .await?;
        Ok(outcome.into())
    }

    pub async fn get_sheets(&self, spreadsheet_id: &str) -> Result<SheetList, SheetsError> {
        Ok(self.service.list_sheets(spreadsheet_id).await?.into())
    }

    pub async fn create_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<SheetCreated, SheetsError> {
        Ok(self.service.create_sheet(spreadsheet_id, title).await?.into())
    }

    /// Creates a spreadsheet and optionally shows it in the default browser.
    pub async fn create_spreadsheet(
        &self,
        title: &str,
        open_in_browser: bool,
    ) -> Result<SpreadsheetCreated, SheetsError> {
        let created = self.service.create_spreadsheet(title).await?;

        if open_in_browser {
            if let Err(e) = open::that(&created.spreadsheet_url) {
                tracing::warn!("Could not open {}: {}", created.spreadsheet_url, e);
            }
        }

        Ok(created.into())
    }

    pub async fn delete_sheet_by_id(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
    ) -> Result<SheetDeleted, SheetsError> {
        let spreadsheet_id = self
            .service
            .delete_sheet_by_id(spreadsheet_id, sheet_id)
            .await?;
        Ok(SheetDeleted::Deleted { spreadsheet_id })
    }

    pub async fn delete_sheet_by_title(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<SheetDeleted, SheetsError> {
        Ok(self
            .service
            .delete_sheet_by_title(spreadsheet_id, title)
            .await?
            .into())
    }

    pub async fn logout(&self) -> Result<bool, SheetsError> {
        self.service.logout().await
    }
}

/// Parses a JSON grid argument (`[["a", 1], ["b", 2]]`).
pub fn parse_grid(json: &str) -> Result<Grid, SheetsError> {
    serde_json::from_str(json)
        .map_err(|e| SheetsError::InvalidInput(format!("expected a list of rows: {}", e)))
}

/// Parses a JSON list of grids, one per target sheet.
pub fn parse_grids(json: &str) -> Result<Vec<Grid>, SheetsError> {
    serde_json::from_str(json)
        .map_err(|e| SheetsError::InvalidInput(format!("expected a list of row lists: {}", e)))
}
