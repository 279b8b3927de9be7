//! Transformation module.
//!
//! This module turns a raw table into a clean spend dataset:
//! - Schema: Header aliases to canonical columns
//! - Numeric: Mixed-locale spend amounts
//! - Temporal: Strict fiscal year contract
//! - Pipeline: Stage orchestration

pub mod numeric;
pub mod pipeline;
pub mod schema;
pub mod temporal;

pub use numeric::normalize_spend;
pub use pipeline::*;
pub use schema::{resolve, ColumnBindings, ColumnSynonymRegistry, ResolvedTable, DEFAULT_REGISTRY};
pub use temporal::{normalize_years, MAX_YEAR, MIN_YEAR};
