//! Aggregation over the clean dataset.
//!
//! [`analyze`] builds a read-only [`AnalysisResult`] snapshot from a
//! [`CanonicalTable`]: grouped totals per supplier, category and year, plus the
//! headline statistics used by the report.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::models::CanonicalTable;

/// Total spend of one supplier or category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledTotal {
    pub label: String,
    pub total: f64,
}

/// Total spend of one fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total: f64,
}

/// Growth between the two most recent years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YoyGrowth {
    pub previous_year: i32,
    pub latest_year: i32,
    /// Percentage change; `None` when the previous total is zero
    pub percent: Option<f64>,
}

/// Aggregate snapshot of a clean dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Largest suppliers, ascending by total
    pub top_suppliers: Vec<LabelledTotal>,
    /// Every category, ascending by total; empty without a category column
    pub categories: Vec<LabelledTotal>,
    /// Every year, ascending by year; empty without a year column
    pub years: Vec<YearTotal>,
    pub total_spend: f64,
    pub mean_spend: f64,
    pub supplier_count: usize,
    pub record_count: usize,
}

impl AnalysisResult {
    /// Growth between the two most recent years, if there are two.
    pub fn yoy_growth(&self) -> Option<YoyGrowth> {
        let [.., previous, latest] = self.years.as_slice() else {
            return None;
        };

        let percent = if previous.total == 0.0 {
            None
        } else {
            Some((latest.total - previous.total) / previous.total * 100.0)
        };

        Some(YoyGrowth {
            previous_year: previous.year,
            latest_year: latest.year,
            percent,
        })
    }
}

fn ascending(a: &LabelledTotal, b: &LabelledTotal) -> Ordering {
    a.total.total_cmp(&b.total).then_with(|| a.label.cmp(&b.label))
}

/// Sum spend per label, keeping first-seen label order.
fn group_totals<'a>(entries: impl Iterator<Item = (&'a str, f64)>) -> Vec<LabelledTotal> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<LabelledTotal> = Vec::new();

    for (label, spend) in entries {
        match positions.get(label) {
            Some(&idx) => totals[idx].total += spend,
            None => {
                positions.insert(label, totals.len());
                totals.push(LabelledTotal {
                    label: label.to_string(),
                    total: spend,
                });
            }
        }
    }
    totals
}

/// Aggregate a clean table; `top_n` bounds the supplier list.
pub fn analyze(table: &CanonicalTable, top_n: usize) -> AnalysisResult {
    let records = &table.records;

    let mut suppliers = group_totals(records.iter().map(|r| (r.supplier.as_str(), r.spend)));
    let supplier_count = suppliers.len();

    // Largest first (ties alphabetical), cut, then back to ascending.
    suppliers.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.label.cmp(&b.label)));
    suppliers.truncate(top_n);
    suppliers.sort_by(ascending);

    let mut categories = group_totals(
        records
            .iter()
            .filter_map(|r| r.category.as_deref().map(|c| (c, r.spend))),
    );
    categories.sort_by(ascending);

    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for record in records {
        if let Some(year) = record.year {
            *by_year.entry(year).or_insert(0.0) += record.spend;
        }
    }
    let years: Vec<YearTotal> = by_year
        .into_iter()
        .map(|(year, total)| YearTotal { year, total })
        .collect();

    let total_spend: f64 = records.iter().map(|r| r.spend).sum();
    let mean_spend = if records.is_empty() {
        0.0
    } else {
        total_spend / records.len() as f64
    };

    debug!(
        suppliers = supplier_count,
        categories = categories.len(),
        years = years.len(),
        "aggregated spend"
    );

    AnalysisResult {
        top_suppliers: suppliers,
        categories,
        years,
        total_spend,
        mean_spend,
        supplier_count,
        record_count: records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpendRecord;

    fn record(supplier: &str, spend: f64, category: Option<&str>, year: Option<i32>) -> SpendRecord {
        SpendRecord {
            supplier: supplier.to_string(),
            spend,
            category: category.map(str::to_string),
            year,
            extra: Vec::new(),
        }
    }

    fn table(records: Vec<SpendRecord>) -> CanonicalTable {
        CanonicalTable {
            has_category: records.iter().any(|r| r.category.is_some()),
            has_year: records.iter().any(|r| r.year.is_some()),
            records,
            extra_columns: Vec::new(),
        }
    }

    #[test]
    fn test_two_year_dataset() {
        let result = analyze(
            &table(vec![
                record("Acme Inc", 1000.0, Some("Services"), Some(2023)),
                record("Globex", 500.0, Some("Goods"), Some(2024)),
            ]),
            10,
        );

        assert_eq!(result.total_spend, 1500.0);
        assert_eq!(result.mean_spend, 750.0);
        assert_eq!(result.supplier_count, 2);
        assert_eq!(result.top_suppliers[0].label, "Globex");
        assert_eq!(result.top_suppliers[1].label, "Acme Inc");

        let growth = result.yoy_growth().unwrap();
        assert_eq!((growth.previous_year, growth.latest_year), (2023, 2024));
        assert_eq!(growth.percent, Some(-50.0));
    }

    #[test]
    fn test_top_n_keeps_largest_ascending() {
        let records = (1..=12)
            .map(|i| record(&format!("S{i:02}"), i as f64 * 10.0, None, None))
            .collect();

        let result = analyze(&table(records), 10);

        assert_eq!(result.top_suppliers.len(), 10);
        assert_eq!(result.top_suppliers[0].label, "S03");
        assert_eq!(result.top_suppliers[9].label, "S12");
        assert_eq!(result.supplier_count, 12);
    }

    #[test]
    fn test_top_n_ties_alphabetical() {
        let result = analyze(
            &table(vec![
                record("Zeta", 10.0, None, None),
                record("Alpha", 10.0, None, None),
                record("Mid", 10.0, None, None),
            ]),
            2,
        );
        let labels: Vec<&str> = result.top_suppliers.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Alpha", "Mid"]);
    }

    #[test]
    fn test_supplier_totals_summed() {
        let result = analyze(
            &table(vec![
                record("Acme", 10.0, Some("It"), Some(2023)),
                record("Acme", 15.0, None, Some(2023)),
                record("Globex", 20.0, Some("It"), None),
            ]),
            10,
        );

        assert_eq!(result.top_suppliers[0], LabelledTotal { label: "Globex".into(), total: 20.0 });
        assert_eq!(result.top_suppliers[1], LabelledTotal { label: "Acme".into(), total: 25.0 });
        // Rows without a category or year are left out of those series.
        assert_eq!(result.categories, vec![LabelledTotal { label: "It".into(), total: 30.0 }]);
        assert_eq!(result.years, vec![YearTotal { year: 2023, total: 25.0 }]);
    }

    #[test]
    fn test_no_year_column() {
        let result = analyze(&table(vec![record("Acme", 10.0, None, None)]), 10);
        assert!(result.years.is_empty());
        assert!(result.categories.is_empty());
        assert!(result.yoy_growth().is_none());
    }

    #[test]
    fn test_growth_not_applicable_on_zero_base() {
        let result = analyze(
            &table(vec![
                record("Acme", 0.0, None, Some(2022)),
                record("Acme", 100.0, None, Some(2023)),
            ]),
            10,
        );
        assert_eq!(result.yoy_growth().unwrap().percent, None);
    }

    #[test]
    fn test_growth_uses_two_latest_years() {
        let result = analyze(
            &table(vec![
                record("A", 400.0, None, Some(2024)),
                record("A", 100.0, None, Some(2021)),
                record("A", 200.0, None, Some(2023)),
            ]),
            10,
        );
        let growth = result.yoy_growth().unwrap();
        assert_eq!((growth.previous_year, growth.latest_year), (2023, 2024));
        assert_eq!(growth.percent, Some(100.0));
    }
}
