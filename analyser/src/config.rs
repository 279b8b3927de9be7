//! Runtime configuration.
//!
//! [`PipelineOptions`] tunes a single pipeline run. [`AnalyserConfig`] is the
//! process configuration of the binary, read from the environment (an optional
//! `.env` file is loaded first) and then overridden by command-line flags.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `SPEND_ANALYSER_DELIMITER` | Field delimiter for delimited text (`tab` for `\t`) | auto-detect |
//! | `SPEND_ANALYSER_TOP_N` | Number of suppliers in the top list | `10` |
//! | `SPEND_ANALYSER_OUTPUT_DIR` | Directory for exports and dashboards | `.` |
//! | `SPEND_ANALYSER_EXPORT_FORMAT` | `csv` or `xlsx` | `xlsx` |
//! | `SPEND_ANALYSER_CURRENCY` | Currency symbol used in the report | `€` |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

pub const ENV_DELIMITER: &str = "SPEND_ANALYSER_DELIMITER";
pub const ENV_TOP_N: &str = "SPEND_ANALYSER_TOP_N";
pub const ENV_OUTPUT_DIR: &str = "SPEND_ANALYSER_OUTPUT_DIR";
pub const ENV_EXPORT_FORMAT: &str = "SPEND_ANALYSER_EXPORT_FORMAT";
pub const ENV_CURRENCY: &str = "SPEND_ANALYSER_CURRENCY";

/// Default size of the top-supplier list.
pub const DEFAULT_TOP_N: usize = 10;

/// Options for the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Field delimiter for delimited text; auto-detected when `None`
    pub delimiter: Option<char>,

    /// Number of suppliers kept in the top list
    pub top_n: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// File format of the clean-table export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Csv,
    Xlsx,
}

impl ExportKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::Csv => "csv",
            ExportKind::Xlsx => "xlsx",
        }
    }
}

impl std::str::FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportKind::Csv),
            "xlsx" | "excel" => Ok(ExportKind::Xlsx),
            other => Err(format!("expected 'csv' or 'xlsx', got '{other}'")),
        }
    }
}

/// Process configuration of the command-line tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyserConfig {
    pub pipeline: PipelineOptions,
    pub output_dir: PathBuf,
    pub export_format: ExportKind,
    pub currency: String,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineOptions::default(),
            output_dir: PathBuf::from("."),
            export_format: ExportKind::Xlsx,
            currency: "€".to_string(),
        }
    }
}

/// Parse a delimiter setting: a single character, or `tab` / `\t`.
pub fn parse_delimiter(value: &str) -> Result<char, String> {
    match value {
        "tab" | "\\t" | "\t" => return Ok('\t'),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err("expected a single ASCII character or 'tab'".to_string()),
    }
}

/// Parse a top-N setting: a positive integer.
pub fn parse_top_n(value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| "expected a positive integer".to_string())
}

impl AnalyserConfig {
    /// Load `.env` (if present) and read the recognised variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_DELIMITER) {
            let delimiter = parse_delimiter(&value).map_err(|reason| invalid(ENV_DELIMITER, &value, reason))?;
            config.pipeline.delimiter = Some(delimiter);
        }

        if let Some(value) = lookup(ENV_TOP_N) {
            config.pipeline.top_n = parse_top_n(&value).map_err(|reason| invalid(ENV_TOP_N, &value, reason))?;
        }

        if let Some(value) = lookup(ENV_OUTPUT_DIR) {
            if value.trim().is_empty() {
                return Err(invalid(ENV_OUTPUT_DIR, &value, "must not be empty".into()));
            }
            config.output_dir = PathBuf::from(value);
        }

        if let Some(value) = lookup(ENV_EXPORT_FORMAT) {
            config.export_format = value
                .parse()
                .map_err(|reason| invalid(ENV_EXPORT_FORMAT, &value, reason))?;
        }

        if let Some(value) = lookup(ENV_CURRENCY) {
            config.currency = value;
        }

        Ok(config)
    }
}

fn invalid(variable: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        variable: variable.to_string(),
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_options() {
        let opts = PipelineOptions::default();
        assert_eq!(opts.delimiter, None);
        assert_eq!(opts.top_n, 10);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = AnalyserConfig::from_lookup(lookup_from(&[
            (ENV_DELIMITER, ";"),
            (ENV_TOP_N, "5"),
            (ENV_OUTPUT_DIR, "out"),
            (ENV_EXPORT_FORMAT, "CSV"),
            (ENV_CURRENCY, "$"),
        ]))
        .unwrap();

        assert_eq!(config.pipeline.delimiter, Some(';'));
        assert_eq!(config.pipeline.top_n, 5);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.export_format, ExportKind::Csv);
        assert_eq!(config.currency, "$");
    }

    #[test]
    fn test_config_defaults_when_unset() {
        let config = AnalyserConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AnalyserConfig::default());
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = AnalyserConfig::from_lookup(lookup_from(&[(ENV_TOP_N, "zero")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TOP_N));

        let err = AnalyserConfig::from_lookup(lookup_from(&[(ENV_TOP_N, "0")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TOP_N));

        let err = AnalyserConfig::from_lookup(lookup_from(&[(ENV_DELIMITER, ";;")])).unwrap_err();
        assert!(err.to_string().contains(ENV_DELIMITER));

        let err = AnalyserConfig::from_lookup(lookup_from(&[(ENV_EXPORT_FORMAT, "pdf")])).unwrap_err();
        assert!(err.to_string().contains("pdf"));
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("tab"), Ok('\t'));
        assert_eq!(parse_delimiter("|"), Ok('|'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("§").is_err());
    }

    #[test]
    fn test_parse_top_n() {
        assert_eq!(parse_top_n("3"), Ok(3));
        assert_eq!(parse_top_n(" 12 "), Ok(12));
        assert!(parse_top_n("0").is_err());
        assert!(parse_top_n("-1").is_err());
        assert!(parse_top_n("ten").is_err());
    }
}
