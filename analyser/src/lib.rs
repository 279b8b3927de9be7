//! # Spend Analyser - procurement spend ingestion and normalization
//!
//! Spend Analyser reads procurement exports from different ERP systems (CSV or
//! multi-sheet spreadsheets), resolves their column names, normalizes
//! mixed-locale amounts and fiscal years, and produces one clean, validated
//! dataset plus aggregate summaries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV / XLSX │────▶│   Parser    │────▶│  Transform  │────▶│  Validation │────▶│  Analysis   │
//! │  (any ERP)  │     │  (auto-enc) │     │ (schema/num │     │  (drop +    │     │  (report,   │
//! │             │     │             │     │  /year)     │     │   dedup)    │     │   charts)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spend_analyser::{analyze, render_report, run_pipeline, PipelineOptions};
//! use std::path::Path;
//!
//! let options = PipelineOptions::default();
//! let result = run_pipeline(Path::new("spend.csv"), &options)?;
//! let analysis = analyze(&result.table, options.top_n);
//! print!("{}", render_report(&analysis, "€"));
//! # Ok::<(), spend_analyser::PipelineError>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Pipeline options and environment configuration
//! - [`logging`] - Tracing subscriber setup
//! - [`models`] - Tables and records passed between stages
//! - [`parser`] - Delimited text and spreadsheet input
//! - [`transform`] - Schema resolution, spend and year normalization, pipeline
//! - [`validation`] - Row validation and deduplication
//! - [`analysis`] - Grouped totals and year-over-year growth
//! - [`report`] - Text report and chart dashboard
//! - [`export`] - CSV / Excel / JSON writers
//! - [`select`] - Interactive input selection

// Core modules
pub mod config;
pub mod error;
pub mod logging;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Collaborators
pub mod analysis;
pub mod export;
pub mod report;
pub mod select;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ExportError, IngestError, PipelineError, SchemaError, YearError};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{AnalyserConfig, ExportKind, PipelineOptions};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CanonicalField,
    CanonicalTable,
    Cell,
    ParseOutcome,
    RawTable,
    SpendRecord,
    TypedRow,
    TypedTable,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    read_table,
    ParseResult,
    SourceInfo,
    SourceKind,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{normalize, run_on_table, run_pipeline, PipelineResult};
pub use transform::schema::{resolve, ColumnSynonymRegistry, ResolvedTable, DEFAULT_REGISTRY};
pub use transform::numeric::normalize_spend;
pub use transform::temporal::normalize_years;
pub use validation::{clean, Cleaned, CleaningStats};

// =============================================================================
// Re-exports - Collaborators
// =============================================================================

pub use analysis::{analyze, AnalysisResult, YoyGrowth};
pub use export::{export_table, write_analysis_json, ExportFormat, ExportOutcome};
pub use report::chart::{ChartRenderer, Dashboard, JsonChartRenderer};
pub use report::{render_report, Report};
pub use select::{discover_inputs, prompt_choice, SelectError};
