use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// A selector-driven toolkit for semicolon-delimited files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract selected rows and columns into a new file
    Extract {
        /// Input file
        file: PathBuf,

        /// Row selector, e.g. "1-5", "1,/foo/", "BEGINn1>50END"
        #[arg(short, long)]
        rows: Option<String>,

        /// Column selector, e.g. "0,2" or "0,1:<10,1:10-50,1:>50"
        #[arg(short, long)]
        cols: Option<String>,

        /// Header template, e.g. "Year,c0=~/(\d{4})/"
        #[arg(long)]
        header: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Date format of date fields and literals
        #[arg(long, default_value = "%Y-%m-%d")]
        date_format: String,

        /// Number format of the input values
        #[arg(long, value_enum, default_value = "en")]
        number_format: NumberFormat,

        /// What a pivot column emits per row
        #[arg(long, value_enum, default_value = "label")]
        pivot_values: PivotMode,
    },
    /// Sort rows on a typed column selector
    Sort {
        /// Input file
        file: PathBuf,

        /// Row selector applied before sorting
        #[arg(short, long)]
        rows: Option<String>,

        /// Sort key columns with types, e.g. "n:1" or "d:2,n:0"
        #[arg(short, long)]
        cols: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Date format of date fields
        #[arg(long, default_value = "%Y-%m-%d")]
        date_format: String,

        /// Number format of the input values
        #[arg(long, value_enum, default_value = "en")]
        number_format: NumberFormat,
    },
    /// Report the column structure of a file
    Analyze {
        /// File to analyze
        file: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Number locale of the input: `en` reads 1,234.5, `de` reads 1.234,5
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NumberFormat {
    En,
    De,
}

/// Pivot column output mode: labels on match, or 1/0 indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PivotMode {
    Label,
    Indicator,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
