pub mod cell_value;
pub mod range;
pub mod row_deletion;
pub mod sheets_models;
pub mod sheets_service;

pub use cell_value::CellValue;
pub use sheets_models::{
    Corpora, CreatedSpreadsheet, DriveFile, DriveQuery, FilePage, Grid, SheetProperties,
    ValueInputMode, ValueRange, ValueRenderOption,
};
pub use sheets_service::{
    AppendResult, BatchAppendResult, ClearOutcome, CreatedSheet, DeleteSheetOutcome, DriveApi,
    MultiRangeRead, SheetsError, SheetsService, SpreadsheetsApi, WriteResult,
};
