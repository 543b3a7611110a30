// Node outputs.
//
// Each node returns one typed struct whose serialized field names are the
// host's output port names. Sentinel strings stand in for empty results
// where the host expects a value.

use serde::Serialize;
use serde_json::Value;

use crate::core::sheets::{
    AppendResult, BatchAppendResult, ClearOutcome, CreatedSheet, CreatedSpreadsheet,
    DeleteSheetOutcome, DriveFile, Grid, MultiRangeRead, SheetProperties, WriteResult,
};

pub const NO_SHEETS_FOUND: &str = "No sheets found";
pub const NOTHING_MATCHED: &str = "Nothing matching search parameter was found.";
pub const SHEET_NOT_FOUND: &str = "Sheet not found.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetList {
    pub file_names: Vec<String>,
    pub file_ids: Vec<String>,
}

impl From<Vec<DriveFile>> for SpreadsheetList {
    fn from(files: Vec<DriveFile>) -> Self {
        if files.is_empty() {
            return Self {
                file_names: vec![NO_SHEETS_FOUND.to_string()],
                file_ids: vec![NO_SHEETS_FOUND.to_string()],
            };
        }

        let (file_names, file_ids) = files.into_iter().map(|file| (file.name, file.id)).unzip();
        Self {
            file_names,
            file_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopiedSpreadsheet {
    pub file_name: String,
    pub file_id: String,
}

impl From<DriveFile> for CopiedSpreadsheet {
    fn from(file: DriveFile) -> Self {
        Self {
            file_name: file.name,
            file_id: file.id,
        }
    }
}

/// Output of the append and write nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesWritten {
    #[serde(rename = "spreadsheetID")]
    pub spreadsheet_id: String,
    pub updated_values: Option<Grid>,
    pub range: Option<String>,
}

impl From<AppendResult> for ValuesWritten {
    fn from(result: AppendResult) -> Self {
        let (updated_values, range) = match result.updated {
            Some(updated) => (Some(updated.values), updated.range),
            None => (None, None),
        };
        Self {
            spreadsheet_id: result.spreadsheet_id,
            updated_values,
            range,
        }
    }
}

impl From<WriteResult> for ValuesWritten {
    fn from(result: WriteResult) -> Self {
        Self {
            spreadsheet_id: result.spreadsheet_id,
            updated_values: result.updated_values,
            range: result.updated_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchAppended {
    #[serde(rename = "spreadsheetID")]
    pub spreadsheet_id: String,
    pub replies: Option<Vec<Value>>,
}

impl From<BatchAppendResult> for BatchAppended {
    fn from(result: BatchAppendResult) -> Self {
        Self {
            spreadsheet_id: result.spreadsheet_id,
            replies: result.replies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadData {
    pub data: Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangesRead {
    pub ranges: Vec<String>,
    pub values: Vec<Grid>,
}

impl From<MultiRangeRead> for RangesRead {
    fn from(read: MultiRangeRead) -> Self {
        Self {
            ranges: read.ranges,
            values: read.values,
        }
    }
}

/// The single `clearedRange` port carries one of three shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClearedRange {
    Range(String),
    Replies(Vec<Value>),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeCleared {
    pub cleared_range: ClearedRange,
}

impl From<ClearOutcome> for RangeCleared {
    fn from(outcome: ClearOutcome) -> Self {
        let cleared_range = match outcome {
            ClearOutcome::Cleared { cleared_range } => ClearedRange::Range(cleared_range),
            ClearOutcome::RowsDeleted { replies, .. } => ClearedRange::Replies(replies),
            ClearOutcome::NothingMatched => ClearedRange::Message(NOTHING_MATCHED.to_string()),
        };
        Self { cleared_range }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetList {
    pub sheet_titles: Vec<String>,
    pub sheet_ids: Vec<i64>,
}

impl From<Vec<SheetProperties>> for SheetList {
    fn from(sheets: Vec<SheetProperties>) -> Self {
        let (sheet_titles, sheet_ids) = sheets
            .into_iter()
            .map(|sheet| (sheet.title, sheet.sheet_id))
            .unzip();
        Self {
            sheet_titles,
            sheet_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetCreated {
    pub sheet_title: String,
    pub spreadsheet_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<i64>,
}

impl From<CreatedSheet> for SheetCreated {
    fn from(created: CreatedSheet) -> Self {
        Self {
            sheet_title: created.title,
            spreadsheet_id: created.spreadsheet_id,
            sheet_id: created.sheet_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetCreated {
    pub spreadsheet_id: String,
    pub sheet_url: String,
}

impl From<CreatedSpreadsheet> for SpreadsheetCreated {
    fn from(created: CreatedSpreadsheet) -> Self {
        Self {
            spreadsheet_id: created.spreadsheet_id,
            sheet_url: created.spreadsheet_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SheetDeleted {
    #[serde(rename_all = "camelCase")]
    Deleted { spreadsheet_id: String },
    NotFound { response: String },
}

impl From<DeleteSheetOutcome> for SheetDeleted {
    fn from(outcome: DeleteSheetOutcome) -> Self {
        match outcome {
            DeleteSheetOutcome::Deleted { spreadsheet_id } => {
                SheetDeleted::Deleted { spreadsheet_id }
            }
            DeleteSheetOutcome::NotFound => SheetDeleted::NotFound {
                response: SHEET_NOT_FOUND.to_string(),
            },
        }
    }
}
