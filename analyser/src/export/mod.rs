//! Writers for the clean table and the analysis snapshot.
//!
//! The clean table goes out as delimited text or as an Excel workbook. A failed
//! workbook write is not fatal: the table is written as CSV next to the
//! requested path instead, and [`ExportOutcome`] says which format was used.

use rust_xlsxwriter::Workbook;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analysis::AnalysisResult;
use crate::config::ExportKind;
use crate::error::{ExportError, ExportResult};
use crate::models::{CanonicalField, CanonicalTable, SpendRecord};

/// Output format of [`export_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv { delimiter: char },
    Xlsx,
}

impl ExportFormat {
    pub fn kind(&self) -> ExportKind {
        match self {
            ExportFormat::Csv { .. } => ExportKind::Csv,
            ExportFormat::Xlsx => ExportKind::Xlsx,
        }
    }
}

impl From<ExportKind> for ExportFormat {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::Csv => ExportFormat::Csv { delimiter: ',' },
            ExportKind::Xlsx => ExportFormat::Xlsx,
        }
    }
}

/// What was actually written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    pub format: ExportKind,
    pub path: PathBuf,
    /// Set when the requested format failed and CSV was written instead
    pub fell_back: bool,
}

/// Text of one field of a record; absent values are empty.
fn field_text(record: &SpendRecord, field: CanonicalField) -> String {
    match field {
        CanonicalField::Supplier => record.supplier.clone(),
        CanonicalField::Spend => record.spend.to_string(),
        CanonicalField::Category => record.category.clone().unwrap_or_default(),
        CanonicalField::Year => record.year.map(|y| y.to_string()).unwrap_or_default(),
    }
}

/// Write the table as delimited text.
pub fn write_csv(table: &CanonicalTable, path: &Path, delimiter: char) -> ExportResult<()> {
    if !delimiter.is_ascii() {
        return Err(ExportError::InvalidDelimiter(delimiter));
    }

    let columns = table.columns();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .from_path(path)?;

    writer.write_record(columns.iter().map(|c| c.as_str()))?;
    for record in &table.records {
        writer.write_record(columns.iter().map(|c| field_text(record, *c)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the table as a single-sheet workbook with a header row and autofilter.
pub fn write_xlsx(table: &CanonicalTable, path: &Path) -> ExportResult<()> {
    let columns = table.columns();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Spend")?;

    for (col_idx, column) in columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, column.as_str())?;
    }

    for (row_idx, record) in table.records.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col_idx, column) in columns.iter().enumerate() {
            let col = col_idx as u16;
            match column {
                CanonicalField::Supplier => {
                    worksheet.write_string(row, col, &record.supplier)?;
                }
                CanonicalField::Spend => {
                    worksheet.write_number(row, col, record.spend)?;
                }
                CanonicalField::Category => {
                    if let Some(category) = &record.category {
                        worksheet.write_string(row, col, category)?;
                    }
                }
                CanonicalField::Year => {
                    if let Some(year) = record.year {
                        worksheet.write_number(row, col, f64::from(year))?;
                    }
                }
            }
        }
    }

    let col_end = (columns.len() as u16).saturating_sub(1);
    worksheet.autofilter(0, 0, table.records.len() as u32, col_end)?;

    workbook.save(path)?;
    Ok(())
}

/// Export the clean table.
///
/// A workbook failure falls back to CSV at `path` with a `.csv` extension.
pub fn export_table(
    table: &CanonicalTable,
    path: &Path,
    format: ExportFormat,
) -> ExportResult<ExportOutcome> {
    let outcome = match format {
        ExportFormat::Csv { delimiter } => {
            write_csv(table, path, delimiter)?;
            ExportOutcome {
                format: ExportKind::Csv,
                path: path.to_path_buf(),
                fell_back: false,
            }
        }
        ExportFormat::Xlsx => match write_xlsx(table, path) {
            Ok(()) => ExportOutcome {
                format: ExportKind::Xlsx,
                path: path.to_path_buf(),
                fell_back: false,
            },
            Err(e) => {
                let fallback = path.with_extension(ExportKind::Csv.extension());
                warn!(error = %e, fallback = %fallback.display(), "Excel export failed, writing CSV instead");
                write_csv(table, &fallback, ',')?;
                ExportOutcome {
                    format: ExportKind::Csv,
                    path: fallback,
                    fell_back: true,
                }
            }
        },
    };

    info!(
        path = %outcome.path.display(),
        format = outcome.format.extension(),
        rows = table.len(),
        "exported clean table"
    );
    Ok(outcome)
}

/// Write the analysis snapshot as pretty JSON.
pub fn write_analysis_json(result: &AnalysisResult, path: &Path) -> ExportResult<()> {
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json)?;
    info!(path = %path.display(), "analysis written");
    Ok(())
}
