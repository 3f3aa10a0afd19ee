//! Canonical column catalogue for inventory snapshots.
//!
//! This module owns the [`Column`] enum (the fixed, ordered set of business
//! columns every snapshot is normalized to), their [`ColumnType`], and
//! [`ColumnMap`], which resolves a table's header row to column positions
//! once so per-row code never looks columns up by name.
//!
//! Column names are exact business strings taken from the marketplace
//! export; matching is case- and whitespace-sensitive.

use std::{collections::HashMap, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    String,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    TcgplayerId,
    ProductLine,
    SetName,
    ProductName,
    Title,
    Number,
    Rarity,
    Condition,
    MarketPrice,
    DirectLow,
    LowPriceWithShipping,
    LowPrice,
    TotalQuantity,
    AddToQuantity,
    OldMarketplacePrice,
    ReserveQuantity,
    OldStorePrice,
    PhotoUrl,
    OldQty,
    BasePrice,
    MarketplacePrice,
    StorePrice,
    OldMultiplier,
    Multiplier,
    Diff,
}

impl Column {
    /// Canonical output order.
    pub const ALL: [Column; 25] = [
        Column::TcgplayerId,
        Column::ProductLine,
        Column::SetName,
        Column::ProductName,
        Column::Title,
        Column::Number,
        Column::Rarity,
        Column::Condition,
        Column::MarketPrice,
        Column::DirectLow,
        Column::LowPriceWithShipping,
        Column::LowPrice,
        Column::TotalQuantity,
        Column::AddToQuantity,
        Column::OldMarketplacePrice,
        Column::ReserveQuantity,
        Column::OldStorePrice,
        Column::PhotoUrl,
        Column::OldQty,
        Column::BasePrice,
        Column::MarketplacePrice,
        Column::StorePrice,
        Column::OldMultiplier,
        Column::Multiplier,
        Column::Diff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::TcgplayerId => "TCGplayer Id",
            Column::ProductLine => "Product Line",
            Column::SetName => "Set Name",
            Column::ProductName => "Product Name",
            Column::Title => "Title",
            Column::Number => "Number",
            Column::Rarity => "Rarity",
            Column::Condition => "Condition",
            Column::MarketPrice => "TCG Market Price",
            Column::DirectLow => "TCG Direct Low",
            Column::LowPriceWithShipping => "TCG Low Price With Shipping",
            Column::LowPrice => "TCG Low Price",
            Column::TotalQuantity => "Total Quantity",
            Column::AddToQuantity => "Add to Quantity",
            Column::OldMarketplacePrice => "Old Marketplace Price",
            Column::ReserveQuantity => "My Store Reserve Quantity",
            Column::OldStorePrice => "Old My Store Price",
            Column::PhotoUrl => "Photo URL",
            Column::OldQty => "Old Qty",
            Column::BasePrice => "Base Price",
            Column::MarketplacePrice => "TCG Marketplace Price",
            Column::StorePrice => "My Store Price",
            Column::OldMultiplier => "Old Multiplier",
            Column::Multiplier => "Multiplier",
            Column::Diff => "Diff",
        }
    }

    pub fn datatype(self) -> ColumnType {
        match self {
            Column::TcgplayerId
            | Column::TotalQuantity
            | Column::AddToQuantity
            | Column::ReserveQuantity
            | Column::OldQty => ColumnType::Integer,
            Column::ProductLine
            | Column::SetName
            | Column::ProductName
            | Column::Title
            | Column::Number
            | Column::Rarity
            | Column::Condition
            | Column::PhotoUrl => ColumnType::String,
            _ => ColumnType::Float,
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|column| column.name() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn canonical_headers() -> Vec<String> {
    Column::ALL.iter().map(|c| c.name().to_string()).collect()
}

/// Header positions for one table, resolved once.
///
/// The first occurrence of a canonical name wins; any later duplicate of a
/// canonical name is dropped. Blank headers are ignored. Other headers become
/// extra columns, kept in their input order.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    positions: HashMap<Column, usize>,
    extras: Vec<(usize, String)>,
}

impl ColumnMap {
    pub fn resolve(headers: &[String]) -> Self {
        let mut positions = HashMap::new();
        let mut extras = Vec::new();
        let mut seen_extra = std::collections::HashSet::new();
        for (idx, header) in headers.iter().enumerate() {
            match Column::from_name(header) {
                Some(column) => {
                    positions.entry(column).or_insert(idx);
                }
                None if header.is_empty() => {}
                None => {
                    if seen_extra.insert(header.as_str()) {
                        extras.push((idx, header.clone()));
                    }
                }
            }
        }
        Self { positions, extras }
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.positions.contains_key(&column)
    }

    pub fn extras(&self) -> &[(usize, String)] {
        &self.extras
    }

    pub fn extra_headers(&self) -> Vec<String> {
        self.extras.iter().map(|(_, name)| name.clone()).collect()
    }

    pub fn missing(&self) -> Vec<Column> {
        Column::ALL
            .iter()
            .copied()
            .filter(|column| !self.contains(*column))
            .collect()
    }
}

/// Fetches a cell by position; short rows read as empty.
pub fn cell_at(row: &[String], position: Option<usize>) -> &str {
    position
        .and_then(|idx| row.get(idx))
        .map(|s| s.as_str())
        .unwrap_or("")
}
