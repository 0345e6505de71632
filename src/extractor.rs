//! Streaming extraction: row filter, column projection, write-through
//!
//! One pass over the input, one evaluation per line, output in input
//! order. The 0-based physical line number is the row index, so blank
//! lines count for numbering even though they are never emitted.

use crate::column_filter::ColumnFilter;
use crate::header::{HeaderState, HeaderTemplate};
use crate::row_filter::RowFilter;
use crate::selector::{FilterOptions, FilterStats, SelectorError};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Counters reported after a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub rows_read: u64,
    pub rows_written: u64,
    /// Fields that could not be coerced to their declared type; these fail
    /// their comparison but never abort the run
    pub coercion_failures: u64,
}

/// Extracts selected rows and columns from an input stream
#[derive(Debug, Clone)]
pub struct Extractor {
    row_filter: RowFilter,
    col_filter: ColumnFilter,
    header: Option<HeaderTemplate>,
}

impl Extractor {
    pub fn new(
        rows: Option<&str>,
        cols: Option<&str>,
        header: Option<&str>,
        options: FilterOptions,
    ) -> Result<Self, SelectorError> {
        let header = match header {
            Some(template) => {
                let parsed = HeaderTemplate::parse(Some(template))?;
                (!parsed.is_empty()).then_some(parsed)
            }
            None => None,
        };
        Ok(Extractor {
            row_filter: RowFilter::new(rows, options.clone())?,
            col_filter: ColumnFilter::new(cols, options)?,
            header,
        })
    }

    /// Run the pass. Without a header template the output streams line by
    /// line; with one, data lines are buffered so the header can list the
    /// dynamic columns discovered over the whole input before anything else
    /// is written.
    pub fn extract<R: BufRead, W: Write>(&self, reader: R, writer: &mut W) -> Result<ExtractStats> {
        let mut stats = ExtractStats::default();
        let mut filter_stats = FilterStats::default();
        let mut header_state = HeaderState::default();
        let mut buffered: Vec<String> = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.context("failed to read input line")?;
            stats.rows_read += 1;
            if line.is_empty() {
                continue;
            }
            if let Some(header) = &self.header {
                header.process(&mut header_state, &line);
            }
            let Some(kept) = self
                .row_filter
                .process_with_stats(&line, index, &mut filter_stats)
            else {
                continue;
            };
            let Some(projected) = self.col_filter.process_with_stats(kept, &mut filter_stats)
            else {
                continue;
            };
            if projected.is_empty() {
                continue;
            }
            stats.rows_written += 1;
            if self.header.is_some() {
                buffered.push(projected);
            } else {
                writeln!(writer, "{}", projected).context("failed to write output line")?;
            }
        }

        if let Some(header) = &self.header {
            writeln!(writer, "{}", header.render(&header_state))
                .context("failed to write header line")?;
            for line in buffered {
                writeln!(writer, "{}", line).context("failed to write output line")?;
            }
        }
        writer.flush().context("failed to flush output")?;
        stats.coercion_failures = filter_stats.coercion_failures;
        Ok(stats)
    }

    /// Convenience wrapper over file paths
    pub fn extract_file(&self, infile: &Path, outfile: &Path) -> Result<ExtractStats> {
        let reader = BufReader::new(
            File::open(infile)
                .with_context(|| format!("failed to open input file '{}'", infile.display()))?,
        );
        let mut writer = BufWriter::new(
            File::create(outfile)
                .with_context(|| format!("failed to create output file '{}'", outfile.display()))?,
        );
        self.extract(reader, &mut writer)
    }
}
