//! Renders a typed snapshot back to delimited text.
//!
//! Column order is fixed: the canonical columns in catalogue order, then any
//! extra columns in the order they arrived. There is never a row-index
//! column. Where the bytes go is chosen by [`OutputTarget`]; the rendering is
//! the same for every target.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;
use log::info;

use crate::{
    error::{RepriceError, Result},
    io_utils,
    record::Snapshot,
};

pub const STORED_FILE_PREFIX: &str = "updated_pricing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Keep the encoded table in memory.
    Memory,
    /// Write to a path; `-` means stdout.
    Path(PathBuf),
    /// Create a timestamped file inside a directory.
    Directory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Inline(Vec<u8>),
    Written { target: String, rows: usize },
    Stored { path: PathBuf, bytes: u64, rows: usize },
}

pub fn write_snapshot<W: Write>(snapshot: &Snapshot, writer: W, delimiter: u8) -> Result<usize> {
    write_snapshot_to(snapshot, writer, delimiter, "output")
}

fn write_snapshot_to<W: Write>(
    snapshot: &Snapshot,
    writer: W,
    delimiter: u8,
    target: &str,
) -> Result<usize> {
    let mut writer = io_utils::open_csv_writer(writer, delimiter);
    let to_output_error = |err: csv::Error| RepriceError::output(target, err.into());
    writer
        .write_record(snapshot.headers())
        .map_err(to_output_error)?;
    for record in &snapshot.records {
        writer
            .write_record(record.to_row())
            .map_err(to_output_error)?;
    }
    writer
        .flush()
        .map_err(|err| RepriceError::output(target, err))?;
    Ok(snapshot.records.len())
}

pub fn render_to_bytes(snapshot: &Snapshot, delimiter: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_snapshot_to(snapshot, &mut buffer, delimiter, "memory")?;
    Ok(buffer)
}

pub fn stored_file_name() -> String {
    format!(
        "{STORED_FILE_PREFIX}_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

pub fn render(snapshot: &Snapshot, target: &OutputTarget, delimiter: u8) -> Result<Rendered> {
    match target {
        OutputTarget::Memory => render_to_bytes(snapshot, delimiter).map(Rendered::Inline),
        OutputTarget::Path(path) => {
            let name = if io_utils::is_dash(path) {
                "stdout".to_string()
            } else {
                path.display().to_string()
            };
            let writer = io_utils::open_output(Some(path))
                .map_err(|err| RepriceError::output(&name, err))?;
            let rows = write_snapshot_to(snapshot, writer, delimiter, &name)?;
            Ok(Rendered::Written { target: name, rows })
        }
        OutputTarget::Directory(dir) => store_in_directory(snapshot, dir, delimiter),
    }
}

fn store_in_directory(snapshot: &Snapshot, dir: &Path, delimiter: u8) -> Result<Rendered> {
    let dir_name = dir.display().to_string();
    fs::create_dir_all(dir).map_err(|err| RepriceError::output(&dir_name, err))?;
    let path = dir.join(stored_file_name());
    let name = path.display().to_string();
    let file = fs::File::create(&path).map_err(|err| RepriceError::output(&name, err))?;
    let rows = write_snapshot_to(snapshot, std::io::BufWriter::new(file), delimiter, &name)?;
    let bytes = fs::metadata(&path)
        .map_err(|err| RepriceError::output(&name, err))?
        .len();
    info!(
        "Stored {} row(s) in {} ({:.2} MB)",
        rows,
        name,
        bytes as f64 / (1024.0 * 1024.0)
    );
    Ok(Rendered::Stored { path, bytes, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record::ItemRecord, schema::Column};

    fn sample() -> Snapshot {
        Snapshot {
            extra_headers: vec!["Bin".into()],
            records: vec![ItemRecord {
                id: Some(100),
                product_name: "Pikachu, Promo".into(),
                market_price: Some(2.0),
                store_price: Some(2.0),
                multiplier: Some(1.21),
                extra: vec!["A1".into()],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn header_is_canonical_then_extra_without_index() {
        let bytes = render_to_bytes(&sample(), b',').unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("TCGplayer Id,Product Line,Set Name"));
        assert!(header.ends_with("Multiplier,Diff,Bin"));
        assert_eq!(header.split(',').count(), Column::ALL.len() + 1);
    }

    #[test]
    fn values_are_quoted_only_when_needed() {
        let bytes = render_to_bytes(&sample(), b',').unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("100,,,\"Pikachu, Promo\","));
        assert!(row.ends_with(",1.21,,A1"));
    }

    #[test]
    fn directory_target_creates_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let rendered =
            render(&sample(), &OutputTarget::Directory(dir.path().to_path_buf()), b',').unwrap();
        match rendered {
            Rendered::Stored { path, bytes, rows } => {
                assert_eq!(rows, 1);
                assert!(bytes > 0);
                let name = path.file_name().unwrap().to_string_lossy().to_string();
                assert!(name.starts_with("updated_pricing_"));
                assert!(name.ends_with(".csv"));
            }
            other => panic!("expected stored output, got {other:?}"),
        }
    }
}
