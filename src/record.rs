use crate::{
    data::Cell,
    schema::{Column, ColumnMap, cell_at},
};

/// One catalog item in one snapshot.
///
/// Columns outside the canonical set are carried verbatim in `extra`, aligned
/// with the owning [`Snapshot::extra_headers`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemRecord {
    pub id: Option<i64>,
    pub product_line: String,
    pub set_name: String,
    pub product_name: String,
    pub title: String,
    pub number: String,
    pub rarity: String,
    pub condition: String,
    pub market_price: Option<f64>,
    pub direct_low: Option<f64>,
    pub low_price_with_shipping: Option<f64>,
    pub low_price: Option<f64>,
    pub total_quantity: Option<i64>,
    pub add_to_quantity: Option<i64>,
    pub old_marketplace_price: Option<f64>,
    pub reserve_quantity: Option<i64>,
    pub old_store_price: Option<f64>,
    pub photo_url: String,
    pub old_qty: Option<i64>,
    pub base_price: Option<f64>,
    pub marketplace_price: Option<f64>,
    pub store_price: Option<f64>,
    pub old_multiplier: Option<f64>,
    pub multiplier: Option<f64>,
    pub diff: Option<f64>,
    pub extra: Vec<String>,
}

impl ItemRecord {
    pub fn cell(&self, column: Column) -> Cell {
        match column {
            Column::TcgplayerId => Cell::Integer(self.id),
            Column::ProductLine => Cell::Text(self.product_line.clone()),
            Column::SetName => Cell::Text(self.set_name.clone()),
            Column::ProductName => Cell::Text(self.product_name.clone()),
            Column::Title => Cell::Text(self.title.clone()),
            Column::Number => Cell::Text(self.number.clone()),
            Column::Rarity => Cell::Text(self.rarity.clone()),
            Column::Condition => Cell::Text(self.condition.clone()),
            Column::MarketPrice => Cell::Float(self.market_price),
            Column::DirectLow => Cell::Float(self.direct_low),
            Column::LowPriceWithShipping => Cell::Float(self.low_price_with_shipping),
            Column::LowPrice => Cell::Float(self.low_price),
            Column::TotalQuantity => Cell::Integer(self.total_quantity),
            Column::AddToQuantity => Cell::Integer(self.add_to_quantity),
            Column::OldMarketplacePrice => Cell::Float(self.old_marketplace_price),
            Column::ReserveQuantity => Cell::Integer(self.reserve_quantity),
            Column::OldStorePrice => Cell::Float(self.old_store_price),
            Column::PhotoUrl => Cell::Text(self.photo_url.clone()),
            Column::OldQty => Cell::Integer(self.old_qty),
            Column::BasePrice => Cell::Float(self.base_price),
            Column::MarketplacePrice => Cell::Float(self.marketplace_price),
            Column::StorePrice => Cell::Float(self.store_price),
            Column::OldMultiplier => Cell::Float(self.old_multiplier),
            Column::Multiplier => Cell::Float(self.multiplier),
            Column::Diff => Cell::Float(self.diff),
        }
    }

    pub fn set(&mut self, column: Column, cell: Cell) {
        match column {
            Column::TcgplayerId => self.id = cell.as_integer(),
            Column::ProductLine => self.product_line = cell.into_text(),
            Column::SetName => self.set_name = cell.into_text(),
            Column::ProductName => self.product_name = cell.into_text(),
            Column::Title => self.title = cell.into_text(),
            Column::Number => self.number = cell.into_text(),
            Column::Rarity => self.rarity = cell.into_text(),
            Column::Condition => self.condition = cell.into_text(),
            Column::MarketPrice => self.market_price = cell.as_float(),
            Column::DirectLow => self.direct_low = cell.as_float(),
            Column::LowPriceWithShipping => self.low_price_with_shipping = cell.as_float(),
            Column::LowPrice => self.low_price = cell.as_float(),
            Column::TotalQuantity => self.total_quantity = cell.as_integer(),
            Column::AddToQuantity => self.add_to_quantity = cell.as_integer(),
            Column::OldMarketplacePrice => self.old_marketplace_price = cell.as_float(),
            Column::ReserveQuantity => self.reserve_quantity = cell.as_integer(),
            Column::OldStorePrice => self.old_store_price = cell.as_float(),
            Column::PhotoUrl => self.photo_url = cell.into_text(),
            Column::OldQty => self.old_qty = cell.as_integer(),
            Column::BasePrice => self.base_price = cell.as_float(),
            Column::MarketplacePrice => self.marketplace_price = cell.as_float(),
            Column::StorePrice => self.store_price = cell.as_float(),
            Column::OldMultiplier => self.old_multiplier = cell.as_float(),
            Column::Multiplier => self.multiplier = cell.as_float(),
            Column::Diff => self.diff = cell.as_float(),
        }
    }

    /// Builds a record from a raw row with per-cell lenient coercion.
    pub fn from_row(map: &ColumnMap, row: &[String]) -> Self {
        let mut record = ItemRecord::default();
        for column in Column::ALL {
            if let Some(position) = map.position(column) {
                let raw = cell_at(row, Some(position));
                record.set(column, Cell::parse(raw, column.datatype()));
            }
        }
        record.extra = map
            .extras()
            .iter()
            .map(|(idx, _)| cell_at(row, Some(*idx)).to_string())
            .collect();
        record
    }

    /// Canonical cells followed by extras, rendered as text.
    pub fn to_row(&self) -> Vec<String> {
        Column::ALL
            .iter()
            .map(|column| self.cell(*column).to_string())
            .chain(self.extra.iter().cloned())
            .collect()
    }
}

/// A fully typed table: records plus the names of their extra columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub extra_headers: Vec<String>,
    pub records: Vec<ItemRecord>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> Vec<String> {
        crate::schema::canonical_headers()
            .into_iter()
            .chain(self.extra_headers.iter().cloned())
            .collect()
    }
}
