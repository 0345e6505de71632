//! Column projection: build the output field list for an included row

use crate::selector::{
    CompiledFilter, FIELD_SEPARATOR, FilterOptions, FilterStats, SelectorError, TypedValue,
    split_fields,
};

/// Projects a row onto the selected columns, in clause declaration order,
/// and appends one value per matching pivot predicate
#[derive(Debug, Clone)]
pub struct ColumnFilter {
    filter: CompiledFilter,
}

impl ColumnFilter {
    pub fn new(selector: Option<&str>, options: FilterOptions) -> Result<Self, SelectorError> {
        Ok(ColumnFilter {
            filter: CompiledFilter::new(selector, options)?,
        })
    }

    /// Project a line; an unconstrained filter returns it unchanged.
    /// Returns `None` only for an empty input line.
    pub fn process(&self, line: &str) -> Option<String> {
        self.process_with_stats(line, &mut FilterStats::default())
    }

    pub fn process_with_stats(&self, line: &str, stats: &mut FilterStats) -> Option<String> {
        if line.is_empty() {
            return None;
        }
        if self.filter.is_identity_projection() {
            return Some(line.to_string());
        }
        let fields = split_fields(line);
        let projected = self.filter.project(&fields, stats);
        Some(projected.join(&FIELD_SEPARATOR.to_string()))
    }
}

/// A [`ColumnFilter`] whose projected values keep their declared types,
/// used to build sort keys. `n:` columns compare numerically and `d:`
/// columns chronologically; everything else compares lexically.
#[derive(Debug, Clone)]
pub struct ColumnTypeFilter {
    filter: CompiledFilter,
}

impl ColumnTypeFilter {
    pub fn new(selector: Option<&str>, options: FilterOptions) -> Result<Self, SelectorError> {
        Ok(ColumnTypeFilter {
            filter: CompiledFilter::new(selector, options)?,
        })
    }

    pub fn process(&self, line: &str) -> Option<Vec<TypedValue>> {
        self.process_with_stats(line, &mut FilterStats::default())
    }

    pub fn process_with_stats(
        &self,
        line: &str,
        stats: &mut FilterStats,
    ) -> Option<Vec<TypedValue>> {
        if line.is_empty() {
            return None;
        }
        let fields = split_fields(line);
        Some(self.filter.project_typed(&fields, stats))
    }
}
