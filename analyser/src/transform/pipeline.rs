//! High-level pipeline API for spend ingestion and normalization.
//!
//! Combines every stage in a fixed order:
//!
//! 1. read the input file ([`crate::parser::read_table`])
//! 2. resolve columns against the synonym registry ([`super::schema::resolve`])
//! 3. normalize spend and year ([`super::numeric`], [`super::temporal`])
//! 4. validate and deduplicate ([`crate::validation::clean`])
//!
//! Any stage failure is fatal; row-level problems are only counted.
//!
//! # Example
//!
//! ```rust,no_run
//! use spend_analyser::transform::pipeline::run_pipeline;
//! use spend_analyser::config::PipelineOptions;
//! use std::path::Path;
//!
//! let result = run_pipeline(Path::new("spend.csv"), &PipelineOptions::default())?;
//! println!("{} clean rows", result.table.len());
//! # Ok::<(), spend_analyser::error::PipelineError>(())
//! ```

use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use super::numeric::normalize_spend;
use super::schema::{resolve, ResolvedTable, DEFAULT_REGISTRY};
use super::temporal::normalize_years;
use crate::config::PipelineOptions;
use crate::error::{PipelineError, YearError};
use crate::models::{CanonicalTable, Cell, ParseOutcome, RawTable, TypedRow, TypedTable};
use crate::parser::{read_table, SourceInfo};
use crate::validation::{clean, CleaningStats, DroppedRow};

/// Result of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Where the rows came from; `None` for in-memory tables
    pub source: Option<SourceInfo>,

    /// Input headers not bound to a canonical field
    pub unmatched_columns: Vec<String>,

    /// Row-level counters
    pub stats: CleaningStats,

    /// Rows excluded by cleaning
    pub dropped: Vec<DroppedRow>,

    /// The clean dataset
    pub table: CanonicalTable,
}

fn cell_text(cell: &Cell) -> Option<String> {
    if cell.is_absent() {
        None
    } else {
        Some(cell.as_text())
    }
}

/// Normalize a resolved table into typed rows.
///
/// Supplier and category stay raw text here (cleaned by the validator); spend
/// is normalized cell by cell, year column-wise. Without a year column every
/// year is [`ParseOutcome::Absent`]. Unmatched cells ride along as trimmed
/// text so that deduplication sees whole rows.
pub fn normalize(resolved: &ResolvedTable) -> Result<TypedTable, YearError> {
    let table = &resolved.table;
    let bindings = resolved.bindings;
    let extra_indices = resolved.unmatched_indices();

    let years = match bindings.year {
        Some(idx) => normalize_years(&table.column(idx))?,
        None => vec![ParseOutcome::Absent; table.len()],
    };

    let rows = table
        .rows
        .iter()
        .zip(years)
        .map(|(row, year)| TypedRow {
            supplier: row.get(bindings.supplier).and_then(cell_text),
            spend: row
                .get(bindings.spend)
                .map(normalize_spend)
                .unwrap_or(ParseOutcome::Absent),
            category: bindings
                .category
                .and_then(|idx| row.get(idx))
                .and_then(cell_text),
            year,
            extra: extra_indices
                .iter()
                .map(|&idx| row.get(idx).and_then(cell_text).unwrap_or_default().trim().to_string())
                .collect(),
        })
        .collect();

    Ok(TypedTable {
        rows,
        has_category: bindings.category.is_some(),
        has_year: bindings.year.is_some(),
        extra_columns: extra_indices
            .iter()
            .map(|&idx| table.headers[idx].clone())
            .collect(),
    })
}

/// Run stages 2 to 4 on an in-memory table.
pub fn run_on_table(table: RawTable) -> Result<PipelineResult, PipelineError> {
    let input_rows = table.len();
    let resolved = resolve(table, &DEFAULT_REGISTRY)?;
    let unmatched_columns: Vec<String> = resolved
        .unmatched_columns()
        .into_iter()
        .map(str::to_string)
        .collect();

    let typed = normalize(&resolved)?;
    let failed_spend = typed.rows.iter().filter(|r| r.spend.is_failed()).count();
    debug!(rows = input_rows, failed_spend, "normalized rows");

    let cleaned = clean(typed)?;
    info!(
        rows = cleaned.table.len(),
        dropped = cleaned.stats.dropped_rows(),
        "pipeline complete"
    );

    Ok(PipelineResult {
        source: None,
        unmatched_columns,
        stats: cleaned.stats,
        dropped: cleaned.dropped,
        table: cleaned.table,
    })
}

/// Run the whole pipeline on a file.
pub fn run_pipeline(path: &Path, options: &PipelineOptions) -> Result<PipelineResult, PipelineError> {
    info!(path = %path.display(), "starting pipeline");
    let parsed = read_table(path, options.delimiter)?;

    let mut result = run_on_table(parsed.table)?;
    result.source = Some(parsed.info);
    Ok(result)
}
