//! Error types for the spend analysis pipeline.
//!
//! Errors follow the two severities of the pipeline:
//!
//! - Fatal conditions are `Err` values of the types below and abort the run.
//! - Row-level conditions never become errors; they are counted in
//!   [`crate::validation::CleaningStats`] and the row is excluded.
//!
//! The hierarchy:
//!
//! - [`IngestError`] - Reading and decoding the input file
//! - [`SchemaError`] - Column resolution against the synonym registry
//! - [`YearError`] - Strict year format / range contract
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ExportError`] - Writing the clean table or analysis back out
//! - [`ConfigError`] - Environment configuration
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across stage boundaries.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::CanonicalField;

/// Maximum number of offending example values carried by a fatal error.
pub const MAX_EXAMPLES: usize = 5;

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors while reading the input file.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be decoded.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Malformed delimited text.
    #[error("Invalid delimited text: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet could not be opened or read.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Delimiter is not a single-byte character.
    #[error("Unsupported delimiter {0:?}: must be a single ASCII character")]
    InvalidDelimiter(char),

    /// Extension is neither delimited text nor a spreadsheet.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// No header row or no data row.
    #[error("Input file is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    /// Header row is present but blank.
    #[error("No headers found in {}", .0.display())]
    NoHeaders(PathBuf),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors during column resolution.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// One or more required canonical fields have no matching alias.
    #[error("Required column(s) missing: {}", join_fields(.missing))]
    MissingColumns { missing: Vec<CanonicalField> },
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Year Errors
// =============================================================================

/// Violations of the accepted year contract. Both are fatal.
#[derive(Debug, Error)]
pub enum YearError {
    /// Text that is neither a 4-digit year nor a `YYYY-MM-DD` date.
    #[error("Year values must be YYYY or YYYY-MM-DD; offending values: {}", .examples.join(", "))]
    Format { examples: Vec<String> },

    /// Parsed years outside the accepted fiscal range.
    #[error("Year values must lie within [{min}, {max}]; offending values: {}", .examples.join(", "))]
    Range {
        min: i32,
        max: i32,
        examples: Vec<String>,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_pipeline`].
/// Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input boundary error.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Column resolution error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Year contract violation.
    #[error("Year error: {0}")]
    Year(#[from] YearError),

    /// Every row was dropped by cleaning.
    #[error("No valid rows after cleaning ({input_rows} input rows)")]
    NoValidRows { input_rows: usize },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing outputs.
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Excel writer error.
    #[error("Excel write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delimiter the CSV writer cannot use.
    #[error("Invalid output delimiter: {0:?}")]
    InvalidDelimiter(char),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A recognised variable carries an unusable value.
    #[error("Invalid value '{value}' for {variable}: {reason}")]
    InvalidValue {
        variable: String,
        value: String,
        reason: String,
    },

    /// The tracing subscriber could not be installed.
    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
