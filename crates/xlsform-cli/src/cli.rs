//! CLI argument definitions for the XLSForm submission validator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "xlsform",
    version,
    about = "Validate Excel data submissions against an XLSForm schema",
    long_about = "Validate Excel data submissions against an XLSForm schema.\n\n\
                  Every data row is checked for required values, data types and\n\
                  constraints. Invalid submissions get a copy with the offending\n\
                  cells highlighted for review."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a submitted workbook and highlight invalid cells.
    Validate(ValidateArgs),

    /// Parse an XLSForm schema and list its field rules.
    Schema(SchemaArgs),
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// XLSForm schema workbook (.xlsx) with `survey` and `choices` sheets.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Submitted data workbook (.xlsx).
    #[arg(long = "data", value_name = "PATH")]
    pub data: PathBuf,

    /// Directory for the highlighted workbook (default: <DATA_DIR>/results).
    #[arg(long = "results-dir", value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Write the validation result as a JSON report.
    #[arg(long = "report-json", value_name = "PATH")]
    pub report_json: Option<PathBuf>,

    /// Write the error list as CSV.
    #[arg(long = "report-csv", value_name = "PATH")]
    pub report_csv: Option<PathBuf>,

    /// Fill colour for invalid cells, as RRGGBB or AARRGGBB hex.
    #[arg(long = "highlight-color", value_name = "HEX")]
    pub highlight_color: Option<String>,
}

#[derive(Parser)]
pub struct SchemaArgs {
    /// XLSForm schema workbook (.xlsx).
    #[arg(value_name = "PATH")]
    pub schema: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
