//! Sorting rows by a typed column key
//!
//! The key is built by a [`ColumnTypeFilter`], so `n:` columns sort
//! numerically and `d:` columns chronologically instead of lexically.
//! Output lines are the original input lines; the sort is stable, ties
//! keep input order.

use crate::column_filter::ColumnTypeFilter;
use crate::row_filter::RowFilter;
use crate::selector::{FilterOptions, FilterStats, SelectorError, TypedValue};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    pub rows_read: u64,
    pub rows_written: u64,
    pub coercion_failures: u64,
}

/// Sorts the rows of a file on a typed column selector
#[derive(Debug, Clone)]
pub struct Sorter {
    row_filter: RowFilter,
    key_filter: ColumnTypeFilter,
}

impl Sorter {
    pub fn new(
        rows: Option<&str>,
        cols: Option<&str>,
        options: FilterOptions,
    ) -> Result<Self, SelectorError> {
        Ok(Sorter {
            row_filter: RowFilter::new(rows, options.clone())?,
            key_filter: ColumnTypeFilter::new(cols, options)?,
        })
    }

    /// Sorting buffers the whole input by necessity.
    pub fn sort<R: BufRead, W: Write>(&self, reader: R, writer: &mut W) -> Result<SortStats> {
        let mut stats = SortStats::default();
        let mut filter_stats = FilterStats::default();
        let mut keyed: Vec<(Vec<TypedValue>, String)> = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.context("failed to read input line")?;
            stats.rows_read += 1;
            if line.is_empty() {
                continue;
            }
            if self
                .row_filter
                .process_with_stats(&line, index, &mut filter_stats)
                .is_none()
            {
                continue;
            }
            let Some(key) = self.key_filter.process_with_stats(&line, &mut filter_stats) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            keyed.push((key, line));
        }

        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, line) in &keyed {
            writeln!(writer, "{}", line).context("failed to write output line")?;
            stats.rows_written += 1;
        }
        writer.flush().context("failed to flush output")?;
        stats.coercion_failures = filter_stats.coercion_failures;
        Ok(stats)
    }

    pub fn sort_file(&self, infile: &Path, outfile: &Path) -> Result<SortStats> {
        let reader = BufReader::new(
            File::open(infile)
                .with_context(|| format!("failed to open input file '{}'", infile.display()))?,
        );
        let mut writer = BufWriter::new(
            File::create(outfile)
                .with_context(|| format!("failed to create output file '{}'", outfile.display()))?,
        );
        self.sort(reader, &mut writer)
    }
}
