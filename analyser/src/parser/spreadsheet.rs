//! Spreadsheet reader (xlsx, xlsm, xlsb, xls, ods).
//!
//! Every sheet with a non-blank header row contributes its rows; sheets are
//! concatenated with [`RawTable::append`], so columns are unioned by header.

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use tracing::debug;

use crate::error::IngestResult;
use crate::models::{Cell, RawTable};

/// Read all sheets of a workbook into one table.
///
/// Returns the combined table and the names of the sheets that contributed.
pub fn read_workbook(path: &Path) -> IngestResult<(RawTable, Vec<String>)> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    let mut combined: Option<RawTable> = None;
    let mut used = Vec::new();

    for name in &sheet_names {
        let range = workbook.worksheet_range(name)?;
        let Some(table) = range_to_table(&range) else {
            debug!(sheet = %name, "skipping sheet without header row");
            continue;
        };
        debug!(sheet = %name, rows = table.len(), "read sheet");

        match combined.as_mut() {
            Some(acc) => acc.append(table),
            None => combined = Some(table),
        }
        used.push(name.clone());
    }

    Ok((combined.unwrap_or_default(), used))
}

/// Convert one sheet range into a table. `None` when the header row is blank.
pub fn range_to_table(range: &Range<Data>) -> Option<RawTable> {
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()?
        .iter()
        .map(|cell| convert_cell(cell).as_text().trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return None;
    }

    let mut table = RawTable::new(headers);
    for row in rows {
        let cells: Vec<Cell> = row.iter().map(convert_cell).collect();
        if cells.iter().all(|c| matches!(c, Cell::Empty)) {
            continue;
        }
        table.push_row(cells);
    }

    Some(table)
}

/// Map a spreadsheet cell onto an untyped [`Cell`].
///
/// Dates become `YYYY-MM-DD` text so they meet the year contract; cell errors
/// count as empty.
pub fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(_) => cell
            .as_date()
            .map(|date| Cell::Text(date.format("%Y-%m-%d").to_string()))
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => Cell::text(s.split('T').next().unwrap_or_default()),
        Data::DurationIso(s) => Cell::text(s.clone()),
    }
}
