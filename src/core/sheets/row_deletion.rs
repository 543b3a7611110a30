// Search-and-delete rows.
//
// The service applies the requests of a batch update one after another, and
// every deleted row shifts the rows below it up by one. Each delete therefore
// targets `row - already_deleted`.

use super::cell_value::cell_text;
use super::sheets_models::{BatchRequest, DeleteRangeRequest, Dimension, Grid, GridRange};

/// Indices of the rows holding at least one cell whose text contains `search`.
///
/// Indices are relative to the first fetched row.
pub fn find_matching_rows(rows: &Grid, search: &str) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| cell_text(cell).contains(search)))
        .map(|(index, _)| index)
        .collect()
}

/// Builds one offset delete-range request per target row.
///
/// Input is sorted and de-duplicated first; the offset arithmetic is only
/// valid for strictly ascending rows.
pub fn row_deletion_requests(sheet_id: i64, rows: &[usize]) -> Vec<BatchRequest> {
    let mut targets = rows.to_vec();
    targets.sort_unstable();
    targets.dedup();

    targets
        .into_iter()
        .enumerate()
        .map(|(offset, row)| {
            BatchRequest::DeleteRange(DeleteRangeRequest {
                range: GridRange {
                    sheet_id,
                    start_row_index: row - offset,
                    end_row_index: row - offset + 1,
                },
                shift_dimension: Dimension::Rows,
            })
        })
        .collect()
}
