use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::ingest::{DEFAULT_BATCH_SIZE, ReadOptions};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reprice trading-card inventory from a previous and a current snapshot",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge a current snapshot with the previous one and recompute store prices
    Reprice(RepriceArgs),
    /// Coerce a previous snapshot onto the canonical column set
    Normalize(NormalizeArgs),
    /// Print summary statistics for an already repriced file
    Summarize(SummarizeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Rows read per batch
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_batch_size)]
    pub batch_size: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl InputArgs {
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            batch_size: self.batch_size,
            delimiter: self.delimiter,
            encoding: self.input_encoding.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct RepriceArgs {
    /// Snapshot produced by the previous run (or the previous export)
    #[arg(short = 'p', long = "previous")]
    pub previous: PathBuf,
    /// Fresh marketplace export
    #[arg(short = 'c', long = "current")]
    pub current: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,
    /// Directory for a timestamped updated_pricing_*.csv file
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Delimiter to use for output (defaults to the input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Write the summary as JSON to this file ('-' for stdout)
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,
    /// Do not print the summary table
    #[arg(long = "quiet-summary")]
    pub quiet_summary: bool,
    #[command(flatten)]
    pub read: InputArgs,
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Previous snapshot to normalize
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub read: InputArgs,
}

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// Repriced CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub read: InputArgs,
}

pub fn parse_batch_size(value: &str) -> Result<usize, String> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a valid batch size"))?;
    if parsed == 0 {
        Err("Batch size must be at least 1".to_string())
    } else {
        Ok(parsed)
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
