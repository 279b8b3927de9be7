//! Domain models for the spend analysis pipeline.
//!
//! Tables move through the stages by value:
//!
//! ```text
//! RawTable ──resolve──▶ ResolvedTable ──normalize──▶ TypedTable ──clean──▶ CanonicalTable
//! ```
//!
//! - [`Cell`] - Untyped value at the input boundary
//! - [`RawTable`] - Header row plus untyped rows, as read from the file
//! - [`CanonicalField`] - The four unified column names
//! - [`ParseOutcome`] - Tagged result of the numeric and temporal normalizers
//! - [`TypedRow`] / [`TypedTable`] - Rows after normalization, before validation
//! - [`SpendRecord`] / [`CanonicalTable`] - The clean, validated dataset

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Raw input
// =============================================================================

/// Tokens treated as an explicit absent value (compared case-insensitively).
pub const EMPTY_TOKENS: &[&str] = &["", "nan", "none", "nat"];

/// An untyped cell as read from a delimited file or a spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Build a cell from raw text; the empty string becomes [`Cell::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    /// Whether this cell is empty or one of the [`EMPTY_TOKENS`].
    pub fn is_absent(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(n) => n.is_nan(),
            Cell::Text(s) => {
                let lower = s.trim().to_lowercase();
                EMPTY_TOKENS.contains(&lower.as_str())
            }
        }
    }

    /// Text rendering of the cell. Whole numbers render without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// The raw input boundary: original headers and row-ordered cells.
///
/// Rows are positional against `headers`; a short row is padded with
/// [`Cell::Empty`] when built through [`RawTable::push_row`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All cells of one column, in row order.
    pub fn column(&self, index: usize) -> Vec<&Cell> {
        self.rows
            .iter()
            .map(|row| row.get(index).unwrap_or(&Cell::Empty))
            .collect()
    }

    /// Concatenate another table row-wise, unioning columns by exact header.
    ///
    /// Columns keep first-seen order; cells of columns missing on either side
    /// are [`Cell::Empty`].
    pub fn append(&mut self, other: RawTable) {
        let positions: Vec<usize> = other
            .headers
            .iter()
            .map(|header| match self.column_index(header) {
                Some(idx) => idx,
                None => {
                    self.headers.push(header.clone());
                    self.headers.len() - 1
                }
            })
            .collect();

        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, Cell::Empty);
        }

        for row in other.rows {
            let mut merged = vec![Cell::Empty; width];
            for (cell, &pos) in row.into_iter().zip(positions.iter()) {
                merged[pos] = cell;
            }
            self.rows.push(merged);
        }
    }
}

// =============================================================================
// Canonical fields
// =============================================================================

/// The four unified column names every alias resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Supplier,
    Spend,
    Category,
    Year,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::Supplier,
        CanonicalField::Spend,
        CanonicalField::Category,
        CanonicalField::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Supplier => "supplier",
            CanonicalField::Spend => "spend",
            CanonicalField::Category => "category",
            CanonicalField::Year => "year",
        }
    }

    /// `supplier` and `spend` must resolve; the others may be absent.
    pub fn is_required(&self) -> bool {
        matches!(self, CanonicalField::Supplier | CanonicalField::Spend)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Parse outcomes
// =============================================================================

/// Result of normalizing one cell.
///
/// Keeps a legitimate absence apart from a value that failed to parse, so a
/// missing year is never mistaken for a malformed one and an unparseable
/// spend is never mistaken for zero.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// Successfully parsed value.
    Parsed(T),
    /// Empty cell or empty token.
    Absent,
    /// Parse failure, tagged with the offending raw text.
    Failed(String),
}

impl<T> ParseOutcome<T> {
    pub fn parsed(&self) -> Option<&T> {
        match self {
            ParseOutcome::Parsed(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ParseOutcome::Failed(_))
    }
}

// =============================================================================
// Typed and canonical tables
// =============================================================================

/// A row after schema resolution and normalization, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRow {
    /// Raw supplier text; `None` when the cell is absent.
    pub supplier: Option<String>,
    pub spend: ParseOutcome<f64>,
    /// Raw category text; `None` when absent or when the column is missing.
    pub category: Option<String>,
    pub year: ParseOutcome<i32>,
    /// Trimmed text of the unmatched columns, empty when absent.
    pub extra: Vec<String>,
}

/// Normalized rows plus which optional columns exist in the table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedTable {
    pub rows: Vec<TypedRow>,
    pub has_category: bool,
    pub has_year: bool,
    /// Headers of the unmatched columns, in the order of [`TypedRow::extra`]
    pub extra_columns: Vec<String>,
}

/// One clean, validated spend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRecord {
    pub supplier: String,
    pub spend: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub year: Option<i32>,
    /// Unmatched cells of the source row. They only tell otherwise identical
    /// rows apart and are never exported.
    #[serde(skip)]
    pub extra: Vec<String>,
}

/// The clean dataset produced by the validator.
///
/// Every record has a supplier and a non-negative spend; `year`, when set,
/// lies in the accepted range.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CanonicalTable {
    pub records: Vec<SpendRecord>,
    pub has_category: bool,
    pub has_year: bool,
    #[serde(skip)]
    pub extra_columns: Vec<String>,
}

impl CanonicalTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Canonical column names present in this table, in canonical order.
    pub fn columns(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|field| match field {
                CanonicalField::Category => self.has_category,
                CanonicalField::Year => self.has_year,
                _ => true,
            })
            .collect()
    }
}

impl From<CanonicalTable> for TypedTable {
    fn from(table: CanonicalTable) -> Self {
        let rows = table
            .records
            .into_iter()
            .map(|record| TypedRow {
                supplier: Some(record.supplier),
                spend: ParseOutcome::Parsed(record.spend),
                category: record.category,
                year: record
                    .year
                    .map(ParseOutcome::Parsed)
                    .unwrap_or(ParseOutcome::Absent),
                extra: record.extra,
            })
            .collect();

        TypedTable {
            rows,
            has_category: table.has_category,
            has_year: table.has_year,
            extra_columns: table.extra_columns,
        }
    }
}
