//! File structure analysis
//!
//! Answers "what does this file look like" before building selectors
//! against it: column names from the header row, counts, and a sample data
//! row paired with the columns it fills.

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use std::io::BufRead;

use crate::selector::split_fields;

/// Structure report for one file
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub columns: Vec<String>,
    pub column_count: usize,
    /// Non-blank lines after the header row
    pub row_count: usize,
    pub sample_row: Option<String>,
}

impl Analysis {
    /// Column name and sample value pairs, padded with empty strings when
    /// the sample row is shorter than the header
    pub fn column_samples(&self) -> Vec<(String, String)> {
        let sample_fields: Vec<&str> = self
            .sample_row
            .as_deref()
            .map(split_fields)
            .unwrap_or_default();
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                (
                    name.clone(),
                    sample_fields.get(i).copied().unwrap_or("").to_string(),
                )
            })
            .collect()
    }
}

/// Read the stream once and report its structure. The first non-blank line
/// is the header; the next non-blank line is the sample row.
pub fn analyze<R: BufRead>(reader: R) -> Result<Analysis> {
    let mut columns: Option<Vec<String>> = None;
    let mut sample_row: Option<String> = None;
    let mut row_count = 0usize;

    for line in reader.lines() {
        let line = line.context("failed to read input line")?;
        if line.is_empty() {
            continue;
        }
        match columns {
            None => {
                columns = Some(split_fields(&line).iter().map(|f| (*f).to_string()).collect());
            }
            Some(_) => {
                row_count += 1;
                if sample_row.is_none() {
                    sample_row = Some(line);
                }
            }
        }
    }

    let columns = columns.unwrap_or_default();
    Ok(Analysis {
        column_count: columns.len(),
        columns,
        row_count,
        sample_row,
    })
}

/// Text report: counts plus a column/sample table
pub fn format_analysis_text(analysis: &Analysis) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} columns, {} data rows\n",
        analysis.column_count.to_string().bold(),
        analysis.row_count.to_string().bold()
    ));

    if analysis.columns.is_empty() {
        out.push_str(&format!("{}\n", "File is empty.".yellow()));
        return out;
    }

    if let Some(sample) = &analysis.sample_row {
        out.push_str(&format!("Sample row: {}\n", sample.cyan()));
    } else {
        out.push_str(&format!("{}\n", "No data rows after the header.".yellow()));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Index", "Column", "Sample"]);
    for (i, (name, sample)) in analysis.column_samples().into_iter().enumerate() {
        table.add_row(vec![i.to_string(), name, sample]);
    }
    out.push_str(&format!("{table}\n"));
    out
}

pub fn format_analysis_json(analysis: &Analysis) -> String {
    serde_json::to_string_pretty(analysis)
        .unwrap_or_else(|_| "{\"error\":\"failed to serialize analysis\"}".to_string())
}
