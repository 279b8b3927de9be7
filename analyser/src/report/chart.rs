//! Dashboard description for the three spend charts.
//!
//! The dashboard is a plain data structure; drawing it is left to a
//! [`ChartRenderer`]. [`JsonChartRenderer`] writes it as JSON for a plotting
//! front end.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::analysis::{AnalysisResult, LabelledTotal};
use crate::error::ExportResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    HorizontalBar,
    Line,
}

/// One labelled value of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<Point>,
    /// Set when there is nothing to plot
    pub blank: bool,
}

impl Panel {
    fn new(title: &str, kind: ChartKind, x_label: &str, y_label: &str, points: Vec<Point>) -> Self {
        Self {
            title: title.to_string(),
            kind,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            blank: points.is_empty(),
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub panels: Vec<Panel>,
}

fn points(series: &[LabelledTotal]) -> Vec<Point> {
    series
        .iter()
        .map(|t| Point {
            label: t.label.clone(),
            value: t.total,
        })
        .collect()
}

impl Dashboard {
    /// Top suppliers, categories and the yearly trend.
    pub fn from_analysis(result: &AnalysisResult, currency: &str) -> Self {
        let spend_axis = format!("Total Spend ({currency})");
        let years = result
            .years
            .iter()
            .map(|y| Point {
                label: y.year.to_string(),
                value: y.total,
            })
            .collect();

        Self {
            panels: vec![
                Panel::new(
                    &format!("Top {} Suppliers by Spend", result.top_suppliers.len()),
                    ChartKind::HorizontalBar,
                    &spend_axis,
                    "Supplier",
                    points(&result.top_suppliers),
                ),
                Panel::new(
                    "Spend by Category",
                    ChartKind::HorizontalBar,
                    &spend_axis,
                    "Category",
                    points(&result.categories),
                ),
                Panel::new(
                    "Year-over-Year Spend Trend",
                    ChartKind::Line,
                    "Year",
                    &spend_axis,
                    years,
                ),
            ],
        }
    }
}

/// Something that can draw a dashboard to a file.
pub trait ChartRenderer {
    fn render(&self, dashboard: &Dashboard, path: &Path) -> ExportResult<()>;
}

/// Writes the dashboard as pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonChartRenderer;

impl ChartRenderer for JsonChartRenderer {
    fn render(&self, dashboard: &Dashboard, path: &Path) -> ExportResult<()> {
        let json = serde_json::to_string_pretty(dashboard)?;
        fs::write(path, json)?;
        tracing::info!(path = %path.display(), "dashboard written");
        Ok(())
    }
}
