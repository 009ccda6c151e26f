//! CLI argument definitions for the cannibalization analyzer.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use kca_model::DEFAULT_THRESHOLD_PERCENT;

#[derive(Parser)]
#[command(
    name = "kca",
    version,
    about = "Keyword Cannibalization Analyzer - Find pages competing for the same query",
    long_about = "Find queries served by more than one page in a search performance export.\n\n\
                  Reads Search Console or SEO-tool CSV exports, keeps the queries that\n\
                  carry the top share of traffic, and writes a spreadsheet listing the\n\
                  pages competing for each of them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

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
    /// Analyze a performance export for keyword cannibalization.
    Analyze(AnalyzeArgs),

    /// List the supported input layouts.
    Schemas,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Path to the CSV performance export.
    #[arg(value_name = "EXPORT")]
    pub input: PathBuf,

    /// Share of total traffic to analyze, in percent.
    ///
    /// Queries are ranked by their share of each metric; only those that
    /// together account for this cumulative share are searched for
    /// competing pages.
    #[arg(
        long = "threshold",
        value_name = "PERCENT",
        default_value_t = DEFAULT_THRESHOLD_PERCENT,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub threshold: u8,

    /// Workbook path (default: <EXPORT stem>_cannibalization.xlsx next to the input).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also write the run summary as JSON to this path.
    #[arg(long = "summary-json", value_name = "PATH")]
    pub summary_json: Option<PathBuf>,

    /// Keep rows whose query contains non-ASCII characters.
    #[arg(long = "keep-non-ascii")]
    pub keep_non_ascii: bool,

    /// Analyze and print the summary without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
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
