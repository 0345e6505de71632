//! Row membership: should this line survive the pass?

use crate::selector::{CompiledFilter, FilterOptions, FilterStats, SelectorError};

/// Decides per row whether it is included, by its 0-based position in the
/// file, its full text, or a boolean expression over its fields
///
/// Immutable once built; one instance serves a whole file (or several).
#[derive(Debug, Clone)]
pub struct RowFilter {
    filter: CompiledFilter,
}

impl RowFilter {
    pub fn new(selector: Option<&str>, options: FilterOptions) -> Result<Self, SelectorError> {
        Ok(RowFilter {
            filter: CompiledFilter::new(selector, options)?,
        })
    }

    /// Pass the line through when it is included, by index, by content
    /// match, or by the boolean expression. An unconstrained filter passes
    /// every line.
    pub fn process<'a>(&self, line: &'a str, row: usize) -> Option<&'a str> {
        self.process_with_stats(line, row, &mut FilterStats::default())
    }

    pub fn process_with_stats<'a>(
        &self,
        line: &'a str,
        row: usize,
        stats: &mut FilterStats,
    ) -> Option<&'a str> {
        self.filter
            .row_matches_with_stats(row, line, stats)
            .then_some(line)
    }

    pub fn matches(&self, line: &str, row: usize) -> bool {
        self.filter.row_matches(row, line)
    }
}
