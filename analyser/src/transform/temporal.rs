//! Year normalization under a strict format contract.
//!
//! Accepted inputs:
//!
//! - numeric years with no fractional part (`2024`, `2024.0`)
//! - text of exactly four digits (`"2024"`)
//! - text in the exact ISO pattern `YYYY-MM-DD` (`"2024-03-15"`)
//! - empty cells and empty tokens, which mean "no year"
//!
//! Any other text aborts the run: guessing a date format risks attributing
//! spend to the wrong fiscal year. Every parsed year must also fall within
//! [`MIN_YEAR`, `MAX_YEAR`]. Format validity is checked before range, so a
//! column that breaks both contracts reports the format error.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{YearError, MAX_EXAMPLES};
use crate::models::{Cell, ParseOutcome};

/// Earliest accepted fiscal year.
pub const MIN_YEAR: i32 = 2000;

/// Latest accepted fiscal year.
pub const MAX_YEAR: i32 = 2100;

/// Human-readable description of the accepted year formats.
pub const ACCEPTED_YEAR_FORMATS: &str = "YYYY or YYYY-MM-DD";

static FOUR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid regex"));
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// How a year column is interpreted, decided once for the whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearColumnMode {
    /// Every present value is a number.
    Numeric,
    /// At least one present value is non-numeric text.
    Textual,
}

/// Classification of a single year cell.
#[derive(Debug, Clone, PartialEq)]
enum YearCell {
    Year(i32),
    Absent,
    /// Number with a fractional part: a row-level failure.
    Fractional(String),
    /// Whole number too large to be a year: fatal for the run.
    OutOfRange(String),
    /// Text outside the accepted formats: fatal for the run.
    Malformed(String),
}

fn as_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Cell::Empty => None,
    }
}

/// Decide the interpretation of a year column.
pub fn detect_mode(cells: &[&Cell]) -> YearColumnMode {
    let all_numeric = cells
        .iter()
        .filter(|cell| !cell.is_absent())
        .all(|cell| as_number(cell).is_some());

    if all_numeric {
        YearColumnMode::Numeric
    } else {
        YearColumnMode::Textual
    }
}

fn classify_numeric(value: f64, raw: String) -> YearCell {
    if !value.is_finite() {
        YearCell::OutOfRange(raw)
    } else if value.fract() != 0.0 {
        YearCell::Fractional(raw)
    } else if value.abs() > i32::MAX as f64 {
        YearCell::OutOfRange(raw)
    } else {
        YearCell::Year(value as i32)
    }
}

fn classify_text(text: &str) -> YearCell {
    let text = text.trim();
    if FOUR_DIGITS.is_match(text) {
        return match text.parse::<i32>() {
            Ok(year) => YearCell::Year(year),
            Err(_) => YearCell::Malformed(text.to_string()),
        };
    }

    if ISO_DATE.is_match(text) {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return YearCell::Year(date.year());
        }
    }

    YearCell::Malformed(text.to_string())
}

fn classify(cell: &Cell, mode: YearColumnMode) -> YearCell {
    if cell.is_absent() {
        return YearCell::Absent;
    }

    match (mode, cell) {
        (YearColumnMode::Numeric, _) => match as_number(cell) {
            Some(value) => classify_numeric(value, cell.as_text().trim().to_string()),
            None => YearCell::Malformed(cell.as_text()),
        },
        (YearColumnMode::Textual, Cell::Number(n)) => classify_numeric(*n, cell.as_text()),
        (YearColumnMode::Textual, _) => classify_text(&cell.as_text()),
    }
}

/// Up to [`MAX_EXAMPLES`] distinct values, in first-seen order.
fn examples<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if out.len() == MAX_EXAMPLES {
            break;
        }
        if !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Normalize a whole year column.
///
/// Returns one outcome per cell: [`ParseOutcome::Parsed`] for a valid year,
/// [`ParseOutcome::Absent`] for an empty value and [`ParseOutcome::Failed`]
/// for a number with a fractional part (the row is dropped later). Malformed
/// text fails with [`YearError::Format`]; out-of-range years, including whole
/// numbers too large for any calendar, fail with [`YearError::Range`].
pub fn normalize_years(cells: &[&Cell]) -> Result<Vec<ParseOutcome<i32>>, YearError> {
    let mode = detect_mode(cells);
    debug!(?mode, cells = cells.len(), "normalizing year column");

    let classified: Vec<YearCell> = cells.iter().map(|cell| classify(cell, mode)).collect();

    let malformed = examples(classified.iter().filter_map(|c| match c {
        YearCell::Malformed(raw) => Some(raw.as_str()),
        _ => None,
    }));
    if !malformed.is_empty() {
        return Err(YearError::Format { examples: malformed });
    }

    let out_of_range: Vec<String> = classified
        .iter()
        .filter_map(|c| match c {
            YearCell::Year(year) if !(MIN_YEAR..=MAX_YEAR).contains(year) => Some(year.to_string()),
            YearCell::OutOfRange(raw) => Some(raw.clone()),
            _ => None,
        })
        .collect();
    if !out_of_range.is_empty() {
        return Err(YearError::Range {
            min: MIN_YEAR,
            max: MAX_YEAR,
            examples: examples(out_of_range.iter().map(String::as_str)),
        });
    }

    Ok(classified
        .into_iter()
        .map(|c| match c {
            YearCell::Year(year) => ParseOutcome::Parsed(year),
            YearCell::Absent => ParseOutcome::Absent,
            YearCell::Fractional(raw) | YearCell::OutOfRange(raw) | YearCell::Malformed(raw) => {
                ParseOutcome::Failed(raw)
            }
        })
        .collect())
}
