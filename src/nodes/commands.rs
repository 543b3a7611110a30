use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use super::sheets_nodes::{parse_grid, parse_grids, SheetsNodes};
use crate::core::sheets::{Corpora, DriveApi, SheetsError, SpreadsheetsApi};

/// Command-line host for the Google Sheets nodes. Every subcommand prints the
/// node's outputs as JSON.
#[derive(Parser, Debug)]
#[command(about = "Read, write and manage Google Sheets from BIM automation scripts.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: NodeCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum NodeCommand {
    /// List spreadsheets whose name contains a filter, sorted by name.
    GetGoogleSheetFiles {
        /// Substring of the file name; empty matches every spreadsheet.
        #[arg(long, default_value = "")]
        filter: String,

        /// Search scope: user, drive, domain or allDrives.
        #[arg(long, default_value = "allDrives")]
        corpora: Corpora,

        /// Shared drive to search when `--corpora drive`.
        #[arg(long)]
        drive_id: Option<String>,
    },

    /// Copy a spreadsheet.
    CopyGoogleSheet {
        #[arg(long)]
        file_id: String,
    },

    /// Append rows to the table found in a range.
    AppendDataToTable {
        #[arg(long)]
        spreadsheet_id: String,
        #[arg(long)]
        sheet: String,
        /// A1 range where to look for a table; empty means A:ZZ.
        #[arg(long, default_value = "")]
        range: String,
        /// Rows as JSON, e.g. `[["a", 1], ["b", 2]]`.
        #[arg(long)]
        data: String,
        /// Store input literally instead of parsing it like typed input.
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        include_values: bool,
    },

    /// Append typed rows to several sheets in one batch.
    BatchAppendData {
        #[arg(long)]
        spreadsheet_id: String,
        /// Target sheet title (repeatable, one per data block).
        #[arg(long = "sheet", required = true)]
        sheets: Vec<String>,
        /// One row list per sheet as JSON, e.g. `[[["a"]], [["b"]]]`.
        #[arg(long)]
        data: String,
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        include_values: bool,
    },

    /// Write rows to a range, creating the sheet when missing.
    WriteData {
        #[arg(long)]
        spreadsheet_id: String,
        #[arg(long)]
        sheet: String,
        #[arg(long, default_value = "")]
        range: String,
        #[arg(long)]
        data: String,
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        include_values: bool,
    },

    /// Read a range.
    ReadData {
        #[arg(long)]
        spreadsheet_id: String,
        #[arg(long)]
        sheet: String,
        #[arg(long, default_value = "")]
        range: String,
        /// Return raw values instead of formatted text.
        #[arg(long)]
        unformatted: bool,
    },

    /// Read several A1 ranges at once; none reads every sheet.
    ReadMultipleRanges {
        #[arg(long)]
        spreadsheet_id: String,
        #[arg(long = "range")]
        ranges: Vec<String>,
        #[arg(long)]
        unformatted: bool,
    },

    /// Clear a range, or delete the rows containing a search term.
    ClearRange {
        #[arg(long)]
        spreadsheet_id: String,
        #[arg(long)]
        sheet: String,
        #[arg(long, default_value = "")]
        range: String,
        #[arg(long, default_value = "")]
        search: String,
    },

    /// List sheet titles and ids.
    GetSheets {
        #[arg(long)]
        spreadsheet_id: String,
    },

    /// Add a sheet.
    CreateSheet {
        #[arg(long)]
        spreadsheet_id: String,
        #[arg(long)]
        title: String,
    },

    /// Create a spreadsheet.
    CreateSpreadsheet {
        #[arg(long)]
        title: String,
        /// Open the new spreadsheet in the default browser.
        #[arg(long)]
        open: bool,
    },

    /// Delete a sheet by id.
    DeleteSheetById {
        #[arg(long)]
        spreadsheet_id: String,
        #[arg(long)]
        sheet_id: i64,
    },

    /// Delete a sheet by title.
    DeleteSheetByTitle {
        #[arg(long)]
        spreadsheet_id: String,
        #[arg(long)]
        title: String,
    },

    /// Revoke the stored Google authorization.
    Logout,
}

fn to_json<T: Serialize>(output: &T) -> Result<Value, SheetsError> {
    serde_json::to_value(output).map_err(|e| SheetsError::Decode(e.to_string()))
}

/// Runs one node and returns its outputs.
pub async fn run<S, D>(
    nodes: &SheetsNodes<S, D>,
    command: NodeCommand,
) -> Result<Value, SheetsError>
where
    S: SpreadsheetsApi,
    D: DriveApi,
{
    match command {
        NodeCommand::GetGoogleSheetFiles {
            filter,
            corpora,
            drive_id,
        } => to_json(&nodes.get_google_sheet_files(&filter, corpora, drive_id).await?),
        NodeCommand::CopyGoogleSheet { file_id } => {
            to_json(&nodes.copy_google_sheet(&file_id).await?)
        }
        NodeCommand::AppendDataToTable {
            spreadsheet_id,
            sheet,
            range,
            data,
            raw,
            include_values,
        } => {
            let data = parse_grid(&data)?;
            to_json(
                &nodes
                    .append_data_to_table(
                        &spreadsheet_id,
                        &sheet,
                        &range,
                        data,
                        raw,
                        include_values,
                    )
                    .await?,
            )
        }
        NodeCommand::BatchAppendData {
            spreadsheet_id,
            sheets,
            data,
            raw,
            include_values,
        } => {
            let data = parse_grids(&data)?;
            to_json(
                &nodes
                    .batch_append_data(&spreadsheet_id, &sheets, data, raw, include_values)
                    .await?,
            )
        }
        NodeCommand::WriteData {
            spreadsheet_id,
            sheet,
            range,
            data,
            raw,
            include_values,
        } => {
            let data = parse_grid(&data)?;
            to_json(
                &nodes
                    .write_data(&spreadsheet_id, &sheet, &range, data, raw, include_values)
                    .await?,
            )
        }
        NodeCommand::ReadData {
            spreadsheet_id,
            sheet,
            range,
            unformatted,
        } => to_json(
            &nodes
                .read_data(&spreadsheet_id, &sheet, &range, unformatted)
                .await?,
        ),
        NodeCommand::ReadMultipleRanges {
            spreadsheet_id,
            ranges,
            unformatted,
        } => to_json(
            &nodes
                .read_multiple_ranges(&spreadsheet_id, &ranges, unformatted)
                .await?,
        ),
        NodeCommand::ClearRange {
            spreadsheet_id,
            sheet,
            range,
            search,
        } => to_json(
            &nodes
                .clear_range(&spreadsheet_id, &sheet, &range, &search)
                .await?,
        ),
        NodeCommand::GetSheets { spreadsheet_id } => {
            to_json(&nodes.get_sheets(&spreadsheet_id).await?)
        }
        NodeCommand::CreateSheet {
            spreadsheet_id,
            title,
        } => to_json(&nodes.create_sheet(&spreadsheet_id, &title).await?),
        NodeCommand::CreateSpreadsheet { title, open } => {
            to_json(&nodes.create_spreadsheet(&title, open).await?)
        }
        NodeCommand::DeleteSheetById {
            spreadsheet_id,
            sheet_id,
        } => to_json(&nodes.delete_sheet_by_id(&spreadsheet_id, sheet_id).await?),
        NodeCommand::DeleteSheetByTitle {
            spreadsheet_id,
            title,
        } => to_json(&nodes.delete_sheet_by_title(&spreadsheet_id, &title).await?),
        NodeCommand::Logout => to_json(&nodes.logout().await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> NodeCommand {
        let mut argv = vec!["sheets"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_listing_defaults() {
        assert_eq!(
            parse(&["get-google-sheet-files"]),
            NodeCommand::GetGoogleSheetFiles {
                filter: String::new(),
                corpora: Corpora::AllDrives,
                drive_id: None,
            }
        );
    }

    #[test]
    fn test_corpora_parsed() {
        let command = parse(&[
            "get-google-sheet-files",
            "--filter",
            "Budget",
            "--corpora",
            "drive",
            "--drive-id",
            "0AbC",
        ]);
        assert_eq!(
            command,
            NodeCommand::GetGoogleSheetFiles {
                filter: "Budget".to_string(),
                corpora: Corpora::Drive,
                drive_id: Some("0AbC".to_string()),
            }
        );

        let bad = Cli::try_parse_from(["sheets", "get-google-sheet-files", "--corpora", "team"]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_batch_append_repeats_sheets() {
        let command = parse(&[
            "batch-append-data",
            "--spreadsheet-id",
            "abc",
            "--sheet",
            "A",
            "--sheet",
            "B",
            "--data",
            r#"[[["1"]], [["2"]]]"#,
            "--raw",
        ]);
        match command {
            NodeCommand::BatchAppendData {
                sheets,
                raw,
                include_values,
                ..
            } => {
                assert_eq!(sheets, vec!["A", "B"]);
                assert!(raw);
                assert!(!include_values);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_read_multiple_ranges_may_be_empty() {
        assert_eq!(
            parse(&["read-multiple-ranges", "--spreadsheet-id", "abc"]),
            NodeCommand::ReadMultipleRanges {
                spreadsheet_id: "abc".to_string(),
                ranges: Vec::new(),
                unformatted: false,
            }
        );
    }

    #[test]
    fn test_delete_by_id_requires_number() {
        assert!(Cli::try_parse_from([
            "sheets",
            "delete-sheet-by-id",
            "--spreadsheet-id",
            "abc",
            "--sheet-id",
            "tab"
        ])
        .is_err());
    }

    #[test]
    fn test_logout_takes_no_arguments() {
        assert_eq!(parse(&["logout"]), NodeCommand::Logout);
    }
}
