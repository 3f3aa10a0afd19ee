//! Coerces a previous snapshot of arbitrary shape onto the canonical schema.
//!
//! Every canonical column ends up present and typed. Absent columns are
//! synthesized with the type's null (null for numbers, empty string for text).
//! Numeric cells that do not parse become null. An integer column holding a
//! value that cannot be cast without loss is replaced wholesale by nulls;
//! there is no per-cell recovery in that case. Normalization never fails.

use itertools::Itertools;
use log::{info, warn};

use crate::{
    data::{Cell, parse_float, parse_integer},
    ingest::RawTable,
    record::{ItemRecord, Snapshot},
    schema::{Column, ColumnMap, ColumnType, cell_at},
};

/// A coerced column. `Integer` and `Float` hold one entry per row.
#[derive(Debug, Clone, PartialEq)]
enum ColumnValues {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<String>),
}

impl ColumnValues {
    fn null(ty: ColumnType, rows: usize) -> Self {
        match ty {
            ColumnType::Integer => ColumnValues::Integer(vec![None; rows]),
            ColumnType::Float => ColumnValues::Float(vec![None; rows]),
            ColumnType::String => ColumnValues::Text(vec![String::new(); rows]),
        }
    }

    fn into_cells(self) -> Box<dyn Iterator<Item = Cell>> {
        match self {
            ColumnValues::Integer(values) => Box::new(values.into_iter().map(Cell::Integer)),
            ColumnValues::Float(values) => Box::new(values.into_iter().map(Cell::Float)),
            ColumnValues::Text(values) => Box::new(values.into_iter().map(Cell::Text)),
        }
    }
}

fn coerce_column<'a, I>(column: Column, raw: I) -> Result<ColumnValues, String>
where
    I: Iterator<Item = &'a str>,
{
    match column.datatype() {
        ColumnType::Float => Ok(ColumnValues::Float(raw.map(parse_float).collect())),
        ColumnType::Integer => raw
            .map(parse_integer)
            .collect::<Result<Vec<_>, _>>()
            .map(ColumnValues::Integer)
            .map_err(|err| err.to_string()),
        ColumnType::String => Ok(ColumnValues::Text(raw.map(str::to_string).collect())),
    }
}

pub fn normalize_previous(table: &RawTable) -> Snapshot {
    let map = ColumnMap::resolve(&table.headers);
    let rows = table.rows.len();
    let missing = map.missing();
    if !missing.is_empty() {
        info!(
            "{}: synthesizing {} absent column(s): {}",
            table.source_name,
            missing.len(),
            missing.iter().map(|c| c.name()).join(", ")
        );
    }

    let mut records: Vec<ItemRecord> = vec![ItemRecord::default(); rows];
    for column in Column::ALL {
        let values = match map.position(column) {
            None => ColumnValues::null(column.datatype(), rows),
            Some(position) => {
                let raw = table.rows.iter().map(|row| cell_at(row, Some(position)));
                coerce_column(column, raw).unwrap_or_else(|reason| {
                    warn!(
                        "{}: column '{}' is not castable to {} ({}); replacing with nulls",
                        table.source_name,
                        column,
                        column.datatype(),
                        reason
                    );
                    ColumnValues::null(column.datatype(), rows)
                })
            }
        };
        for (record, cell) in records.iter_mut().zip(values.into_cells()) {
            record.set(column, cell);
        }
    }

    for (record, row) in records.iter_mut().zip(&table.rows) {
        record.extra = map
            .extras()
            .iter()
            .map(|(idx, _)| cell_at(row, Some(*idx)).to_string())
            .collect();
    }

    Snapshot {
        extra_headers: map.extra_headers(),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut table = RawTable::new(
            "previous.csv",
            headers.iter().map(|s| s.to_string()).collect(),
        );
        table.rows = rows
            .iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect();
        table
    }

    #[test]
    fn absent_columns_get_typed_nulls() {
        let snapshot = normalize_previous(&table(&["TCGplayer Id"], &[&["100"]]));
        let record = &snapshot.records[0];
        assert_eq!(record.id, Some(100));
        assert_eq!(record.old_multiplier, None);
        assert_eq!(record.total_quantity, None);
        assert_eq!(record.title, "");
        assert!(snapshot.extra_headers.is_empty());
    }

    #[test]
    fn unparseable_numeric_cells_become_null() {
        let snapshot = normalize_previous(&table(
            &["TCGplayer Id", "Old Multiplier", "Total Quantity"],
            &[&["1", "abc", "3"], &["2", "1.1", ""]],
        ));
        assert_eq!(snapshot.records[0].old_multiplier, None);
        assert_eq!(snapshot.records[1].old_multiplier, Some(1.1));
        assert_eq!(snapshot.records[0].total_quantity, Some(3));
        assert_eq!(snapshot.records[1].total_quantity, None);
    }

    #[test]
    fn fractional_integer_column_is_nulled_as_a_whole() {
        let snapshot = normalize_previous(&table(
            &["TCGplayer Id", "Total Quantity"],
            &[&["1", "4"], &["2", "2.5"]],
        ));
        assert!(snapshot.records.iter().all(|r| r.total_quantity.is_none()));
        assert_eq!(snapshot.records[0].id, Some(1));
    }

    #[test]
    fn extra_columns_are_carried_through() {
        let snapshot = normalize_previous(&table(&["Bin", "TCGplayer Id"], &[&["A1", "5"]]));
        assert_eq!(snapshot.extra_headers, vec!["Bin"]);
        assert_eq!(snapshot.records[0].extra, vec!["A1"]);
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let first = normalize_previous(&table(
            &["TCGplayer Id", "Condition", "TCG Market Price", "Old Qty", "Bin"],
            &[&["100", "Near Mint", "2", "5", "A1"], &["x", "", "n/a", "", ""]],
        ));
        let mut rendered = RawTable::new("normalized.csv", first.headers());
        rendered.rows = first.records.iter().map(ItemRecord::to_row).collect();
        let second = normalize_previous(&rendered);
        assert_eq!(first, second);
    }
}
