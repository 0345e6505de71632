pub mod analyzer;
pub mod cli;
pub mod column_filter;
pub mod extractor;
pub mod header;
pub mod row_filter;
pub mod selector;
pub mod sorter;

pub use cli::{Cli, Commands, NumberFormat, OutputFormat, PivotMode, cli_parse};
pub use column_filter::{ColumnFilter, ColumnTypeFilter};
pub use extractor::{ExtractStats, Extractor};
pub use header::{HeaderState, HeaderTemplate};
pub use row_filter::RowFilter;
pub use selector::{CompiledFilter, FilterOptions, FilterStats, SelectorError};
pub use sorter::{SortStats, Sorter};

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use crate::selector::{NumberLocale, PivotValues};

fn build_options(
    date_format: &str,
    number_format: NumberFormat,
    pivot_values: PivotMode,
) -> FilterOptions {
    FilterOptions {
        date_format: date_format.to_string(),
        number_locale: match number_format {
            NumberFormat::En => NumberLocale::En,
            NumberFormat::De => NumberLocale::De,
        },
        pivot_values: match pivot_values {
            PivotMode::Label => PivotValues::Label,
            PivotMode::Indicator => PivotValues::Indicator,
        },
    }
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path).with_context(|| {
        format!("failed to open input file '{}'", path.display())
    })?))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path).with_context(
            || format!("failed to create output file '{}'", path.display()),
        )?))),
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn report_pass(rows_read: u64, rows_written: u64, coercion_failures: u64) {
    eprintln!("{} rows read, {} written", rows_read, rows_written);
    if coercion_failures > 0 {
        eprintln!(
            "{} field(s) could not be coerced to their declared type and were treated as non-matches",
            coercion_failures
        );
    }
}

pub fn run() -> Result<()> {
    let cli = cli_parse();

    match &cli.command {
        Commands::Extract {
            file,
            rows,
            cols,
            header,
            output,
            date_format,
            number_format,
            pivot_values,
        } => {
            let options = build_options(date_format, *number_format, *pivot_values);
            let extractor = Extractor::new(
                rows.as_deref(),
                cols.as_deref(),
                header.as_deref(),
                options,
            )?;
            let reader = open_input(file)?;
            let mut writer = open_output(output.as_deref())?;
            let stats = extractor.extract(reader, &mut writer)?;
            report_pass(stats.rows_read, stats.rows_written, stats.coercion_failures);
        }
        Commands::Sort {
            file,
            rows,
            cols,
            output,
            date_format,
            number_format,
        } => {
            let options = build_options(date_format, *number_format, PivotMode::Label);
            let sorter = Sorter::new(rows.as_deref(), cols.as_deref(), options)?;
            let reader = open_input(file)?;
            let mut writer = open_output(output.as_deref())?;
            let stats = sorter.sort(reader, &mut writer)?;
            report_pass(stats.rows_read, stats.rows_written, stats.coercion_failures);
        }
        Commands::Analyze { file, format } => {
            let reader = open_input(file)?;
            let analysis = analyzer::analyze(reader)?;
            match format {
                OutputFormat::Text => print!("{}", analyzer::format_analysis_text(&analysis)),
                OutputFormat::Json => println!("{}", analyzer::format_analysis_json(&analysis)),
            }
        }
    }

    Ok(())
}
