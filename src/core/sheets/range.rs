// A1-notation helpers.

/// Columns used when the caller leaves the range empty.
pub const DEFAULT_COLUMNS: &str = "A:ZZ";

/// Builds `Sheet!Range`, defaulting to every column from A to ZZ.
pub fn format_range(sheet: &str, range: &str) -> String {
    if range.is_empty() {
        format!("{}!{}", sheet, DEFAULT_COLUMNS)
    } else {
        format!("{}!{}", sheet, range)
    }
}

/// Zero-based row index of the first row addressed by an A1 range.
///
/// `Sheet1!B5:D9` gives 4, `Sheet1!A:Z` (whole columns) gives 0. Returns
/// `None` when the range cannot be read.
pub fn range_start_row(range: &str) -> Option<usize> {
    let cells = match range.rfind('!') {
        Some(idx) => &range[idx + 1..],
        None => range,
    };
    let first = cells.split(':').next()?.trim();
    if first.is_empty() {
        return None;
    }

    let digits = first.trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$');

    if digits.is_empty() {
        return Some(0);
    }

    let row: usize = digits.parse().ok()?;
    row.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_range_defaults_to_all_columns() {
        assert_eq!(format_range("Sheet1", ""), "Sheet1!A:ZZ");
        assert_eq!(format_range("Data", "B2:C9"), "Data!B2:C9");
    }

    #[test]
    fn test_range_start_row() {
        assert_eq!(range_start_row("Sheet1!B5:D9"), Some(4));
        assert_eq!(range_start_row("Sheet1!A1:Z1000"), Some(0));
        assert_eq!(range_start_row("Sheet1!A:Z"), Some(0));
        assert_eq!(range_start_row("'My!Sheet'!$C$12:$D$20"), Some(11));
        assert_eq!(range_start_row("Sheet1!"), None);
    }
}
