//! Current-snapshot preparation and the left join against the previous snapshot.

use std::collections::HashMap;

use log::{info, warn};

use crate::{
    error::{RepriceError, Result},
    ingest::RawTable,
    record::{ItemRecord, Snapshot},
    schema::{Column, ColumnMap},
};

pub const DEFAULT_MULTIPLIER: f64 = 1.2;
pub const UNOPENED_CONDITION: &str = "Unopened";

/// Columns the pricing pass cannot run without.
pub const REQUIRED_CURRENT_COLUMNS: [Column; 5] = [
    Column::TcgplayerId,
    Column::Condition,
    Column::MarketPrice,
    Column::LowPrice,
    Column::TotalQuantity,
];

/// Source column renamed into each "old" column of the current snapshot.
const CURRENT_RENAMES: [(Column, Column); 2] = [
    (Column::StorePrice, Column::OldStorePrice),
    (Column::MarketplacePrice, Column::OldMarketplacePrice),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentSnapshot {
    pub snapshot: Snapshot,
    pub dropped_unopened: usize,
    pub dropped_unpriced: usize,
}

/// Renames the live price columns to their "old" names.
///
/// A rename displaces any column already carrying the target name (its header
/// is blanked, so it is ignored). When the source column is absent the target
/// stays absent and reads as null.
pub fn rename_current_headers(headers: &[String]) -> Vec<String> {
    let mut renamed = headers.to_vec();
    for (from, to) in CURRENT_RENAMES {
        if let Some(src) = renamed.iter().position(|h| h == from.name()) {
            for header in renamed.iter_mut() {
                if header == to.name() {
                    header.clear();
                }
            }
            renamed[src] = to.name().to_string();
        }
    }
    renamed
}

pub fn prepare_current(table: &RawTable) -> Result<CurrentSnapshot> {
    let headers = rename_current_headers(&table.headers);
    let map = ColumnMap::resolve(&headers);
    for column in REQUIRED_CURRENT_COLUMNS {
        if !map.contains(column) {
            return Err(RepriceError::MissingColumn {
                column: column.name(),
                snapshot: "current",
            });
        }
    }

    let mut dropped_unopened = 0usize;
    let mut dropped_unpriced = 0usize;
    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let record = ItemRecord::from_row(&map, row);
        if record.condition == UNOPENED_CONDITION {
            dropped_unopened += 1;
            continue;
        }
        if record.market_price.is_none() {
            dropped_unpriced += 1;
            continue;
        }
        records.push(record);
    }
    info!(
        "{}: kept {} row(s), dropped {} unopened and {} without a market price",
        table.source_name,
        records.len(),
        dropped_unopened,
        dropped_unpriced
    );

    Ok(CurrentSnapshot {
        snapshot: Snapshot {
            extra_headers: map.extra_headers(),
            records,
        },
        dropped_unopened,
        dropped_unpriced,
    })
}

/// What the previous run knew about one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorState {
    pub multiplier: Option<f64>,
    pub quantity: Option<i64>,
}

impl PriorState {
    fn from_record(record: &ItemRecord) -> Self {
        Self {
            multiplier: record.multiplier.or(record.old_multiplier),
            quantity: record.total_quantity,
        }
    }
}

/// Previous snapshot keyed by id. Duplicate ids keep the last occurrence.
#[derive(Debug, Clone, Default)]
pub struct PreviousIndex {
    by_id: HashMap<i64, PriorState>,
    duplicates: usize,
}

impl PreviousIndex {
    pub fn build(previous: &Snapshot) -> Self {
        let mut by_id = HashMap::with_capacity(previous.records.len());
        let mut duplicates = 0usize;
        for record in &previous.records {
            let Some(id) = record.id else { continue };
            if by_id.insert(id, PriorState::from_record(record)).is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            warn!(
                "Previous snapshot repeats {} id(s); keeping the last occurrence of each",
                duplicates
            );
        }
        Self { by_id, duplicates }
    }

    pub fn get(&self, id: Option<i64>) -> Option<&PriorState> {
        id.and_then(|id| self.by_id.get(&id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// A current record paired with the prior state it inherits.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub record: ItemRecord,
    pub prior_multiplier: f64,
    pub prior_quantity: Option<i64>,
    pub matched: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSnapshot {
    pub extra_headers: Vec<String>,
    pub records: Vec<MergedRecord>,
    pub matched: usize,
    pub duplicate_previous_ids: usize,
}

/// Left join: every current row appears exactly once, in input order.
///
/// Unmatched rows start from [`DEFAULT_MULTIPLIER`] and fall back to their own
/// `Old Qty` for the prior quantity.
pub fn merge(current: Snapshot, previous: &Snapshot) -> MergedSnapshot {
    let index = PreviousIndex::build(previous);
    let mut matched = 0usize;
    let records = current
        .records
        .into_iter()
        .map(|record| match index.get(record.id) {
            Some(prior) => {
                matched += 1;
                MergedRecord {
                    prior_multiplier: prior.multiplier.unwrap_or(DEFAULT_MULTIPLIER),
                    prior_quantity: prior.quantity,
                    matched: true,
                    record,
                }
            }
            None => MergedRecord {
                prior_multiplier: DEFAULT_MULTIPLIER,
                prior_quantity: record.old_qty,
                matched: false,
                record,
            },
        })
        .collect::<Vec<_>>();
    info!(
        "Merged {} current row(s) against {} previous id(s): {} matched",
        records.len(),
        index.len(),
        matched
    );
    MergedSnapshot {
        extra_headers: current.extra_headers,
        records,
        matched,
        duplicate_previous_ids: index.duplicates(),
    }
}
