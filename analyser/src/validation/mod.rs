//! Row validation and deduplication, the last stage before analysis.
//!
//! Turns a [`TypedTable`] into a [`CanonicalTable`]:
//!
//! - text fields are trimmed and title-cased so grouping is consistent
//! - rows without a supplier, with an unparseable or missing spend, with a
//!   negative spend, or with a non-whole year are dropped
//! - exact duplicates over all columns are removed (first kept); unmatched
//!   cells count, so rows told apart only by an invoice number both survive
//!
//! Dropped rows are counted in [`CleaningStats`], never reported as errors.
//! The only fatal outcome is an empty result.
//!
//! Cleaning is idempotent: a [`CanonicalTable`] converted back with
//! `TypedTable::from` cleans to itself.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::models::{CanonicalTable, ParseOutcome, SpendRecord, TypedRow, TypedTable, EMPTY_TOKENS};

/// Why a row was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingSupplier,
    MissingSpend,
    UnparseableSpend,
    NegativeSpend,
    InvalidYear,
    Duplicate,
}

/// A row excluded by cleaning.
#[derive(Debug, Clone, Serialize)]
pub struct DroppedRow {
    /// Zero-based position in the typed table
    pub row: usize,
    pub reason: DropReason,
    /// Offending raw value, when there is one
    pub value: Option<String>,
}

/// Counters of row-level conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub input_rows: usize,
    pub kept_rows: usize,
    pub missing_supplier: usize,
    pub missing_spend: usize,
    pub unparseable_spend: usize,
    pub negative_spend: usize,
    pub invalid_year: usize,
    pub duplicates: usize,
}

impl CleaningStats {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingSupplier => self.missing_supplier += 1,
            DropReason::MissingSpend => self.missing_spend += 1,
            DropReason::UnparseableSpend => self.unparseable_spend += 1,
            DropReason::NegativeSpend => self.negative_spend += 1,
            DropReason::InvalidYear => self.invalid_year += 1,
            DropReason::Duplicate => self.duplicates += 1,
        }
    }

    pub fn dropped_rows(&self) -> usize {
        self.input_rows - self.kept_rows
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "Kept {} of {} rows ({} unparseable spend, {} missing spend, {} negative spend, \
             {} missing supplier, {} invalid year, {} duplicates)",
            self.kept_rows,
            self.input_rows,
            self.unparseable_spend,
            self.missing_spend,
            self.negative_spend,
            self.missing_supplier,
            self.invalid_year,
            self.duplicates
        )
    }
}

/// Output of the validator.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub table: CanonicalTable,
    pub stats: CleaningStats,
    pub dropped: Vec<DroppedRow>,
}

/// Title-case text: the first letter of each alphabetic run is upper-cased and
/// the rest lower-cased, so `"o'neil ltd"` becomes `"O'Neil Ltd"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// Trim and title-case a text field; absent stays absent.
pub fn clean_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if EMPTY_TOKENS.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }
    Some(title_case(trimmed))
}

/// Check one row; `Err` carries the reason and offending value.
fn validate_row(row: TypedRow) -> Result<SpendRecord, (DropReason, Option<String>)> {
    let Some(supplier) = clean_text(row.supplier.as_deref()) else {
        return Err((DropReason::MissingSupplier, row.supplier));
    };

    let spend = match row.spend {
        ParseOutcome::Parsed(value) if value < 0.0 => {
            return Err((DropReason::NegativeSpend, Some(value.to_string())))
        }
        // Fold -0.0 so it deduplicates with 0.0.
        ParseOutcome::Parsed(value) => value + 0.0,
        ParseOutcome::Absent => return Err((DropReason::MissingSpend, None)),
        ParseOutcome::Failed(raw) => return Err((DropReason::UnparseableSpend, Some(raw))),
    };

    let year = match row.year {
        ParseOutcome::Parsed(year) => Some(year),
        ParseOutcome::Absent => None,
        ParseOutcome::Failed(raw) => return Err((DropReason::InvalidYear, Some(raw))),
    };

    Ok(SpendRecord {
        supplier,
        spend,
        category: clean_text(row.category.as_deref()),
        year,
        extra: row.extra,
    })
}

type RecordKey = (String, u64, Option<String>, Option<i32>, Vec<String>);

fn record_key(record: &SpendRecord) -> RecordKey {
    (
        record.supplier.clone(),
        record.spend.to_bits(),
        record.category.clone(),
        record.year,
        record.extra.clone(),
    )
}

/// Validate and deduplicate a typed table.
///
/// Fails with [`PipelineError::NoValidRows`] when nothing survives.
pub fn clean(typed: TypedTable) -> Result<Cleaned, PipelineError> {
    let mut stats = CleaningStats {
        input_rows: typed.rows.len(),
        ..CleaningStats::default()
    };
    let mut dropped = Vec::new();
    let mut seen: HashSet<RecordKey> = HashSet::new();
    let mut records = Vec::with_capacity(typed.rows.len());

    for (idx, row) in typed.rows.into_iter().enumerate() {
        let outcome = validate_row(row).and_then(|record| {
            if seen.insert(record_key(&record)) {
                Ok(record)
            } else {
                Err((DropReason::Duplicate, None))
            }
        });

        match outcome {
            Ok(record) => records.push(record),
            Err((reason, value)) => {
                stats.record(reason);
                dropped.push(DroppedRow {
                    row: idx,
                    reason,
                    value,
                });
            }
        }
    }
    stats.kept_rows = records.len();

    if records.is_empty() {
        return Err(PipelineError::NoValidRows {
            input_rows: stats.input_rows,
        });
    }

    if stats.dropped_rows() > 0 {
        warn!(dropped = stats.dropped_rows(), "excluded rows during cleaning");
        for row in dropped.iter().take(5) {
            warn!(
                row = row.row,
                reason = ?row.reason,
                value = row.value.as_deref().unwrap_or(""),
                "excluded row"
            );
        }
    }
    info!("{}", stats.summary());

    Ok(Cleaned {
        table: CanonicalTable {
            records,
            has_category: typed.has_category,
            has_year: typed.has_year,
            extra_columns: typed.extra_columns,
        },
        stats,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(supplier: &str, spend: ParseOutcome<f64>, category: Option<&str>, year: ParseOutcome<i32>) -> TypedRow {
        TypedRow {
            supplier: Some(supplier.to_string()),
            spend,
            category: category.map(str::to_string),
            year,
            extra: Vec::new(),
        }
    }

    fn table(rows: Vec<TypedRow>) -> TypedTable {
        TypedTable {
            rows,
            has_category: true,
            has_year: true,
            extra_columns: Vec::new(),
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("acme inc"), "Acme Inc");
        assert_eq!(title_case("GLOBEX corp"), "Globex Corp");
        assert_eq!(title_case("o'neil ltd"), "O'Neil Ltd");
        assert_eq!(title_case("3m company"), "3M Company");
        assert_eq!(title_case(&title_case("ACME-widgets")), "Acme-Widgets");
    }

    #[test]
    fn test_clean_text_keeps_absence() {
        assert_eq!(clean_text(Some("  services ")), Some("Services".to_string()));
        assert_eq!(clean_text(Some("nan")), None);
        assert_eq!(clean_text(Some("  ")), None);
        assert_eq!(clean_text(None), None);
    }

    #[test]
    fn test_duplicates_removed() {
        let cleaned = clean(table(vec![
            row("Acme Inc", ParseOutcome::Parsed(1000.0), Some("Services"), ParseOutcome::Parsed(2023)),
            row(" acme inc ", ParseOutcome::Parsed(1000.0), Some("services"), ParseOutcome::Parsed(2023)),
            row("Globex", ParseOutcome::Parsed(500.0), Some("Goods"), ParseOutcome::Parsed(2024)),
        ]))
        .unwrap();

        assert_eq!(cleaned.table.len(), 2);
        assert_eq!(cleaned.stats.duplicates, 1);
        assert_eq!(cleaned.table.records[0].supplier, "Acme Inc");
        assert_eq!(cleaned.table.records[1].supplier, "Globex");
    }

    #[test]
    fn test_unmatched_cells_take_part_in_dedup() {
        let invoiced = |number: &str| TypedRow {
            extra: vec![number.to_string()],
            ..row("Acme", ParseOutcome::Parsed(100.0), None, ParseOutcome::Parsed(2024))
        };
        let mut typed = table(vec![invoiced("INV-1"), invoiced("INV-2"), invoiced("INV-2")]);
        typed.extra_columns = vec!["Invoice No".into()];

        let cleaned = clean(typed).unwrap();

        assert_eq!(cleaned.table.len(), 2);
        assert_eq!(cleaned.stats.duplicates, 1);
        assert_eq!(cleaned.dropped[0].row, 2);
        assert_eq!(cleaned.table.extra_columns, vec!["Invoice No"]);

        let again = clean(TypedTable::from(cleaned.table.clone())).unwrap();
        assert_eq!(again.table, cleaned.table);
    }

    #[test]
    fn test_row_level_drops() {
        let mut missing_supplier = row("x", ParseOutcome::Parsed(1.0), None, ParseOutcome::Absent);
        missing_supplier.supplier = None;

        let cleaned = clean(table(vec![
            row("Acme", ParseOutcome::Parsed(-50.0), None, ParseOutcome::Absent),
            row("Acme", ParseOutcome::Failed("n/a".into()), None, ParseOutcome::Absent),
            row("Acme", ParseOutcome::Absent, None, ParseOutcome::Absent),
            row("Acme", ParseOutcome::Parsed(10.0), None, ParseOutcome::Failed("2024.5".into())),
            row("nan", ParseOutcome::Parsed(10.0), None, ParseOutcome::Absent),
            missing_supplier,
            row("Acme", ParseOutcome::Parsed(20.0), None, ParseOutcome::Absent),
        ]))
        .unwrap();

        assert_eq!(cleaned.table.len(), 1);
        assert_eq!(cleaned.table.records[0].spend, 20.0);
        assert_eq!(cleaned.stats.negative_spend, 1);
        assert_eq!(cleaned.stats.unparseable_spend, 1);
        assert_eq!(cleaned.stats.missing_spend, 1);
        assert_eq!(cleaned.stats.invalid_year, 1);
        assert_eq!(cleaned.stats.missing_supplier, 2);
        assert_eq!(cleaned.stats.dropped_rows(), 6);
        assert_eq!(cleaned.dropped[1].value.as_deref(), Some("n/a"));
    }

    #[test]
    fn test_absent_category_not_stringified() {
        let cleaned = clean(table(vec![row(
            "Acme",
            ParseOutcome::Parsed(1.0),
            Some("NaN"),
            ParseOutcome::Absent,
        )]))
        .unwrap();

        assert_eq!(cleaned.table.records[0].category, None);
        assert_eq!(cleaned.table.records[0].year, None);
    }

    #[test]
    fn test_zero_spend_kept_and_negative_zero_folded() {
        let cleaned = clean(table(vec![
            row("Acme", ParseOutcome::Parsed(0.0), None, ParseOutcome::Absent),
            row("Acme", ParseOutcome::Parsed(-0.0), None, ParseOutcome::Absent),
        ]))
        .unwrap();

        assert_eq!(cleaned.table.len(), 1);
        assert_eq!(cleaned.stats.duplicates, 1);
    }

    #[test]
    fn test_no_valid_rows_is_fatal() {
        let err = clean(table(vec![
            row("Acme", ParseOutcome::Failed("abc".into()), None, ParseOutcome::Absent),
            row("Globex", ParseOutcome::Failed("xyz".into()), None, ParseOutcome::Absent),
        ]))
        .unwrap_err();

        assert!(matches!(err, PipelineError::NoValidRows { input_rows: 2 }));
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let first = clean(table(vec![
            row("acme", ParseOutcome::Parsed(10.0), Some("it"), ParseOutcome::Parsed(2023)),
            row("ACME", ParseOutcome::Parsed(10.0), Some("IT"), ParseOutcome::Parsed(2023)),
            row("globex", ParseOutcome::Parsed(5.5), None, ParseOutcome::Absent),
        ]))
        .unwrap();

        let second = clean(TypedTable::from(first.table.clone())).unwrap();

        assert_eq!(second.table, first.table);
        assert_eq!(second.stats.dropped_rows(), 0);
    }
}
