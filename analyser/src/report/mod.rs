//! Fixed-format text report over an [`AnalysisResult`].

pub mod chart;

use std::fmt;

use crate::analysis::{AnalysisResult, LabelledTotal};

/// Width of the `=` rules framing the report.
const RULE_WIDTH: usize = 60;

/// Entries shown in each top list.
const TOP_LIST_LEN: usize = 3;

/// Format an amount with thousands separators and two decimals: `1234.5` → `1,234.50`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| matches!(c, '1'..='9')) {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

fn tail(series: &[LabelledTotal]) -> &[LabelledTotal] {
    &series[series.len().saturating_sub(TOP_LIST_LEN)..]
}

/// The summary report, rendered through [`fmt::Display`].
///
/// The category block is left out when there are no categories and the growth
/// line when fewer than two years are present.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub result: &'a AnalysisResult,
    pub currency: &'a str,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a AnalysisResult, currency: &'a str) -> Self {
        Self { result, currency }
    }

    fn write_list(&self, f: &mut fmt::Formatter<'_>, title: &str, series: &[LabelledTotal]) -> fmt::Result {
        writeln!(f, "\nTop {TOP_LIST_LEN} {title}:")?;
        for entry in tail(series) {
            writeln!(f, "  • {}: {}{}", entry.label, self.currency, format_amount(entry.total))?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let currency = self.currency;
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "{rule}")?;
        writeln!(f, "PROCUREMENT SPEND ANALYSIS REPORT")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "\nTotal Spend: {currency}{}", format_amount(result.total_spend))?;
        writeln!(f, "Average Transaction: {currency}{}", format_amount(result.mean_spend))?;
        writeln!(f, "Number of Suppliers: {}", result.supplier_count)?;

        self.write_list(f, "Suppliers", &result.top_suppliers)?;
        if !result.categories.is_empty() {
            self.write_list(f, "Categories", &result.categories)?;
        }

        if let Some(growth) = result.yoy_growth() {
            let value = match growth.percent {
                Some(percent) => format!("{percent:+.1}%"),
                None => "not applicable".to_string(),
            };
            writeln!(
                f,
                "\nYoY Growth ({} → {}): {value}",
                growth.previous_year, growth.latest_year
            )?;
        }

        writeln!(f, "{rule}")
    }
}

/// Render the summary report as a string.
pub fn render_report(result: &AnalysisResult, currency: &str) -> String {
    Report::new(result, currency).to_string()
}
