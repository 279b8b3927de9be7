//! Spend normalization for mixed-locale amounts.
//!
//! ERP exports disagree on separators: `1,234.56` (US) and `1.234,56` (EU)
//! describe the same amount. Without a locale flag the rightmost separator is
//! taken as the decimal point when both kinds appear, which assumes a number
//! carries at most one genuine decimal separator.

use crate::models::{Cell, ParseOutcome};

/// Keep digits, commas, periods and a minus sign that precedes everything else.
///
/// Currency symbols, letters and spaces used as thousands separators go away.
pub fn strip_noise(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '0'..='9' | ',' | '.' => kept.push(c),
            '-' if kept.is_empty() => kept.push(c),
            _ => {}
        }
    }
    kept
}

/// Rewrite separators so the string uses `.` as its only decimal point.
///
/// - both `,` and `.`: the later of the two last occurrences is the decimal
///   point; the other kind is a thousands separator and is removed
/// - only `,`: the comma is a decimal point
/// - only `.` or neither: unchanged
pub fn unify_separators(cleaned: &str) -> String {
    match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(period)) if period > comma => cleaned.replace(',', ""),
        (Some(_), Some(_)) => cleaned.replace('.', "").replace(',', "."),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned.to_string(),
    }
}

/// Parse one spend cell.
///
/// Numbers pass through when finite. Empty cells and empty tokens are
/// [`ParseOutcome::Absent`]; anything that does not yield a number after
/// cleaning is [`ParseOutcome::Failed`] with the raw text.
///
/// # Example
/// ```
/// use spend_analyser::models::{Cell, ParseOutcome};
/// use spend_analyser::transform::numeric::normalize_spend;
///
/// assert_eq!(normalize_spend(&Cell::text("€ 1.234,56")), ParseOutcome::Parsed(1234.56));
/// ```
pub fn normalize_spend(cell: &Cell) -> ParseOutcome<f64> {
    if cell.is_absent() {
        return ParseOutcome::Absent;
    }

    let raw = match cell {
        Cell::Number(n) if n.is_finite() => return ParseOutcome::Parsed(*n),
        other => other.as_text(),
    };

    let unified = unify_separators(&strip_noise(raw.trim()));
    match unified.parse::<f64>() {
        Ok(value) if value.is_finite() => ParseOutcome::Parsed(value),
        _ => ParseOutcome::Failed(raw),
    }
}
