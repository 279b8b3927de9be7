//! Schema resolution: binds arbitrary input headers to the canonical fields.
//!
//! Header names are compared after trimming and lowercasing. For each canonical
//! field the aliases are tried in declared order and the first alias present in
//! the table wins, which makes the priority between aliases explicit.

use std::fmt;
use tracing::{debug, info};

use crate::error::SchemaError;
use crate::models::{CanonicalField, RawTable};

/// Ordered alias lists per canonical field. Process-wide and immutable.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSynonymRegistry {
    entries: &'static [(CanonicalField, &'static [&'static str])],
}

/// The built-in registry. The canonical name is always the first alias, so an
/// already-canonical table resolves onto itself.
pub static DEFAULT_REGISTRY: ColumnSynonymRegistry = ColumnSynonymRegistry {
    entries: &[
        (
            CanonicalField::Supplier,
            &["supplier", "vendor", "supplier name", "nominated supplier", "counterpart"],
        ),
        (CanonicalField::Spend, &["spend", "amount", "value", "cost"]),
        (CanonicalField::Category, &["category", "group", "type"]),
        (CanonicalField::Year, &["year", "fiscal year", "period"]),
    ],
};

impl ColumnSynonymRegistry {
    pub const fn new(entries: &'static [(CanonicalField, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    /// Aliases of one field, in priority order.
    pub fn aliases(&self, field: CanonicalField) -> &'static [&'static str] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }

    pub fn entries(&self) -> impl Iterator<Item = (CanonicalField, &'static [&'static str])> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for ColumnSynonymRegistry {
    fn default() -> Self {
        DEFAULT_REGISTRY
    }
}

/// Normalize a header for comparison.
pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Column positions bound to each canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnBindings {
    pub supplier: usize,
    pub spend: usize,
    pub category: Option<usize>,
    pub year: Option<usize>,
}

impl ColumnBindings {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        match field {
            CanonicalField::Supplier => Some(self.supplier),
            CanonicalField::Spend => Some(self.spend),
            CanonicalField::Category => self.category,
            CanonicalField::Year => self.year,
        }
    }

    fn bound_indices(&self) -> Vec<usize> {
        CanonicalField::ALL.iter().filter_map(|f| self.get(*f)).collect()
    }
}

/// A table whose matched columns carry canonical names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub table: RawTable,
    pub bindings: ColumnBindings,
}

impl ResolvedTable {
    /// Positions of the columns left untouched by resolution.
    pub fn unmatched_indices(&self) -> Vec<usize> {
        let bound = self.bindings.bound_indices();
        (0..self.table.headers.len())
            .filter(|idx| !bound.contains(idx))
            .collect()
    }

    /// Headers left untouched by resolution.
    pub fn unmatched_columns(&self) -> Vec<&str> {
        self.unmatched_indices()
            .into_iter()
            .map(|idx| self.table.headers[idx].as_str())
            .collect()
    }
}

impl fmt::Display for ColumnBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "supplier=#{}, spend=#{}", self.supplier, self.spend)?;
        if let Some(idx) = self.category {
            write!(f, ", category=#{idx}")?;
        }
        if let Some(idx) = self.year {
            write!(f, ", year=#{idx}")?;
        }
        Ok(())
    }
}

/// Find the column bound to one field: first alias (in declared order) that
/// matches a header, leftmost header on duplicates.
fn bind_field(
    normalized: &[String],
    aliases: &[&str],
    taken: &[usize],
) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        normalized
            .iter()
            .enumerate()
            .find(|(idx, header)| header.as_str() == *alias && !taken.contains(idx))
            .map(|(idx, _)| idx)
    })
}

/// Resolve the columns of `table` against `registry`.
///
/// Matched columns are renamed to their canonical names; unmatched columns are
/// kept as they are. Fails when `supplier` or `spend` cannot be bound, listing
/// every missing required field.
pub fn resolve(
    mut table: RawTable,
    registry: &ColumnSynonymRegistry,
) -> Result<ResolvedTable, SchemaError> {
    let normalized: Vec<String> = table.headers.iter().map(|h| normalize_header(h)).collect();

    let mut taken: Vec<usize> = Vec::new();
    let mut bound: Vec<(CanonicalField, Option<usize>)> = Vec::new();

    for field in CanonicalField::ALL {
        let index = bind_field(&normalized, registry.aliases(field), &taken);
        if let Some(idx) = index {
            debug!(field = %field, column = %table.headers[idx], "bound column");
            taken.push(idx);
        }
        bound.push((field, index));
    }

    let lookup = |field: CanonicalField| {
        bound
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, idx)| *idx)
    };

    let (Some(supplier), Some(spend)) = (lookup(CanonicalField::Supplier), lookup(CanonicalField::Spend))
    else {
        let missing = bound
            .iter()
            .filter(|(field, idx)| field.is_required() && idx.is_none())
            .map(|(field, _)| *field)
            .collect();
        return Err(SchemaError::MissingColumns { missing });
    };
    let bindings = ColumnBindings {
        supplier,
        spend,
        category: lookup(CanonicalField::Category),
        year: lookup(CanonicalField::Year),
    };

    for (field, index) in &bound {
        if let Some(idx) = index {
            table.headers[*idx] = field.as_str().to_string();
        }
    }

    let resolved = ResolvedTable { table, bindings };
    info!(bindings = %resolved.bindings, "resolved columns");
    let unmatched = resolved.unmatched_columns();
    if !unmatched.is_empty() {
        debug!(columns = %unmatched.join(", "), "kept unmatched columns");
    }

    Ok(resolved)
}
