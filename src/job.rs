//! One repricing run, end to end.
//!
//! A [`RepriceJob`] owns every per-run setting; nothing is cached between
//! runs. The only state carried from one run to the next is the output table
//! the caller feeds back in as the following run's previous snapshot.

use std::{io::Read, path::Path};

use log::info;

use crate::{
    error::{RepriceError, Result},
    ingest::{self, RawTable, ReadOptions},
    io_utils, merge, normalize, pricing,
    record::Snapshot,
    summary::Summary,
};

/// Counters describing what happened to the rows of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub previous_rows: usize,
    pub current_rows: usize,
    pub skipped_previous_rows: usize,
    pub skipped_current_rows: usize,
    pub dropped_unopened: usize,
    pub dropped_unpriced: usize,
    pub duplicate_previous_ids: usize,
    pub matched: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub repriced: Snapshot,
    pub summary: Summary,
    pub report: JobReport,
}

#[derive(Debug, Clone, Default)]
pub struct RepriceJob {
    pub read: ReadOptions,
}

impl RepriceJob {
    pub fn new(read: ReadOptions) -> Self {
        Self { read }
    }

    pub fn run_paths(&self, previous: &Path, current: &Path) -> Result<JobOutcome> {
        for (label, path) in [("previous", previous), ("current", current)] {
            if path.as_os_str().is_empty() {
                return Err(RepriceError::Transport(format!(
                    "no {label} snapshot was supplied"
                )));
            }
        }
        if io_utils::is_dash(previous) && io_utils::is_dash(current) {
            return Err(RepriceError::Transport(
                "previous and current snapshots cannot both be read from stdin".into(),
            ));
        }
        if previous == current {
            return Err(RepriceError::Transport(format!(
                "previous and current snapshots are the same file ({})",
                previous.display()
            )));
        }
        let previous = ingest::read_table_from_path(previous, &self.read)?;
        let current = ingest::read_table_from_path(current, &self.read)?;
        self.run_tables(previous, current)
    }

    pub fn run_readers<P: Read, C: Read>(&self, previous: P, current: C) -> Result<JobOutcome> {
        let delimiter = self.read.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
        let previous = ingest::read_table(previous, "previous", &self.read, delimiter)?;
        let current = ingest::read_table(current, "current", &self.read, delimiter)?;
        self.run_tables(previous, current)
    }

    pub fn run_tables(&self, previous: RawTable, current: RawTable) -> Result<JobOutcome> {
        let mut report = JobReport {
            previous_rows: previous.len(),
            current_rows: current.len(),
            skipped_previous_rows: previous.skipped_rows,
            skipped_current_rows: current.skipped_rows,
            ..Default::default()
        };

        let previous = normalize::normalize_previous(&previous);
        let current = merge::prepare_current(&current)?;
        report.dropped_unopened = current.dropped_unopened;
        report.dropped_unpriced = current.dropped_unpriced;

        let merged = merge::merge(current.snapshot, &previous);
        report.duplicate_previous_ids = merged.duplicate_previous_ids;
        report.matched = merged.matched;
        report.unmatched = merged.records.len() - merged.matched;

        let repriced = pricing::price_all(merged)?;
        let summary = Summary::from_records(&repriced.records);
        info!(
            "Repriced {} item(s): {} up, {} down, {} unchanged",
            summary.total_items,
            summary.price_changes.increased,
            summary.price_changes.decreased,
            summary.price_changes.unchanged
        );
        Ok(JobOutcome {
            repriced,
            summary,
            report,
        })
    }
}
