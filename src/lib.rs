pub mod cli;
pub mod data;
pub mod error;
pub mod ingest;
pub mod io_utils;
pub mod job;
pub mod merge;
pub mod normalize;
pub mod output;
pub mod pricing;
pub mod record;
pub mod schema;
pub mod summary;
pub mod table;

use std::{env, fs, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, NormalizeArgs, RepriceArgs, SummarizeArgs},
    job::RepriceJob,
    output::{OutputTarget, Rendered},
    record::{ItemRecord, Snapshot},
    schema::ColumnMap,
    summary::Summary,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tcg_reprice", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Reprice(args) => handle_reprice(&args),
        Commands::Normalize(args) => handle_normalize(&args),
        Commands::Summarize(args) => handle_summarize(&args),
    }
}

fn handle_reprice(args: &RepriceArgs) -> Result<()> {
    let read = args.read.read_options();
    let input_delimiter = io_utils::resolve_input_delimiter(&args.current, read.delimiter);
    info!(
        "Repricing '{}' against '{}' (delimiter '{}', batch size {})",
        io_utils::display_path(&args.current),
        io_utils::display_path(&args.previous),
        printable_delimiter(input_delimiter),
        read.batch_size
    );

    let writing_to_stdout = args.output_dir.is_none()
        && args.output.as_deref().is_none_or(io_utils::is_dash);
    let summary_to_stdout = args.summary_json.as_deref().is_some_and(io_utils::is_dash);
    if writing_to_stdout && summary_to_stdout {
        bail!("--summary-json - cannot be combined with CSV output to stdout");
    }

    let outcome = RepriceJob::new(read)
        .run_paths(&args.previous, &args.current)
        .context("Repricing snapshots")?;
    let report = &outcome.report;
    debug!("Run report: {report:?}");
    if report.skipped_previous_rows + report.skipped_current_rows > 0 {
        warn!(
            "{} malformed row(s) skipped (previous {}, current {})",
            report.skipped_previous_rows + report.skipped_current_rows,
            report.skipped_previous_rows,
            report.skipped_current_rows
        );
    }

    let target = match &args.output_dir {
        Some(dir) => OutputTarget::Directory(dir.clone()),
        None => OutputTarget::Path(args.output.clone().unwrap_or_else(|| PathBuf::from("-"))),
    };
    let output_delimiter = io_utils::resolve_output_delimiter(
        args.output.as_deref(),
        args.output_delimiter,
        input_delimiter,
    );
    let rendered = output::render(&outcome.repriced, &target, output_delimiter)
        .context("Writing repriced output")?;
    match &rendered {
        Rendered::Written { target, rows } => {
            info!("Wrote {rows} repriced row(s) to {target}");
        }
        // stdout stays a single JSON document when it carries the summary
        Rendered::Stored { path, bytes, .. } if summary_to_stdout => {
            info!("Stored {} ({bytes} bytes)", path.display());
        }
        Rendered::Stored { path, bytes, .. } => {
            println!("{} ({bytes} bytes)", path.display());
        }
        Rendered::Inline(_) => {}
    }

    if let Some(path) = &args.summary_json {
        let json = outcome
            .summary
            .to_json_pretty()
            .context("Serializing summary")?;
        if io_utils::is_dash(path) {
            println!("{json}");
        } else {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Writing summary to {path:?}"))?;
            info!("Summary written to {path:?}");
        }
    }

    if !args.quiet_summary && !writing_to_stdout && !summary_to_stdout {
        print_summary(&outcome.summary);
    }
    Ok(())
}

fn handle_normalize(args: &NormalizeArgs) -> Result<()> {
    let read = args.read.read_options();
    let table = ingest::read_table_from_path(&args.input, &read)
        .with_context(|| format!("Reading previous snapshot {:?}", args.input))?;
    let snapshot = normalize::normalize_previous(&table);
    let input_delimiter = io_utils::resolve_input_delimiter(&args.input, read.delimiter);
    let output_delimiter =
        io_utils::resolve_output_delimiter(args.output.as_deref(), None, input_delimiter);
    let target = OutputTarget::Path(args.output.clone().unwrap_or_else(|| PathBuf::from("-")));
    let rendered = output::render(&snapshot, &target, output_delimiter)
        .context("Writing normalized snapshot")?;
    if let Rendered::Written { target, rows } = rendered {
        info!("Normalized {rows} row(s) -> {target}");
    }
    Ok(())
}

fn handle_summarize(args: &SummarizeArgs) -> Result<()> {
    let table = ingest::read_table_from_path(&args.input, &args.read.read_options())
        .with_context(|| format!("Reading repriced file {:?}", args.input))?;
    let snapshot = snapshot_from_table(&table);
    let summary = Summary::from_records(&snapshot.records);
    if args.json {
        println!(
            "{}",
            summary.to_json_pretty().context("Serializing summary")?
        );
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Types an already repriced table as-is, without normalization fallbacks.
fn snapshot_from_table(table: &ingest::RawTable) -> Snapshot {
    let map = ColumnMap::resolve(&table.headers);
    Snapshot {
        extra_headers: map.extra_headers(),
        records: table
            .rows
            .iter()
            .map(|row| ItemRecord::from_row(&map, row))
            .collect(),
    }
}

fn print_summary(summary: &Summary) {
    let headers = vec!["metric".to_string(), "value".to_string()];
    table::print_table(&headers, &summary.rows());
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
