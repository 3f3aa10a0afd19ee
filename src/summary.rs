//! Summary statistics over a repriced table.

use serde::{Serialize, Serializer};

use crate::{data::round_cents, record::ItemRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriceChanges {
    pub increased: usize,
    pub decreased: usize,
    pub unchanged: usize,
}

/// Means and totals are `None` when there is nothing to average.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_items: usize,
    #[serde(serialize_with = "serialize_cents")]
    pub avg_market_price: Option<f64>,
    #[serde(serialize_with = "serialize_cents")]
    pub avg_store_price: Option<f64>,
    #[serde(serialize_with = "serialize_cents")]
    pub total_value: Option<f64>,
    pub price_changes: PriceChanges,
}

fn serialize_cents<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) if v.is_finite() => serializer.serialize_some(&round_cents(*v)),
        _ => serializer.serialize_none(),
    }
}

#[derive(Debug, Default)]
struct MeanAccumulator {
    count: usize,
    sum: f64,
}

impl MeanAccumulator {
    fn ingest(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.count += 1;
            self.sum += v;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    fn total(&self) -> Option<f64> {
        (self.count > 0).then_some(self.sum)
    }
}

impl Summary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ItemRecord>,
    {
        let mut total_items = 0usize;
        let mut market = MeanAccumulator::default();
        let mut store = MeanAccumulator::default();
        let mut changes = PriceChanges::default();
        for record in records {
            total_items += 1;
            market.ingest(record.market_price);
            store.ingest(record.store_price);
            if let Some(diff) = record.diff.map(round_cents) {
                if diff > 0.0 {
                    changes.increased += 1;
                } else if diff < 0.0 {
                    changes.decreased += 1;
                } else if diff == 0.0 {
                    changes.unchanged += 1;
                }
            }
        }
        Self {
            total_items,
            avg_market_price: market.mean(),
            avg_store_price: store.mean(),
            total_value: store.total(),
            price_changes: changes,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// `metric`/`value` pairs for console rendering.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let money = |value: Option<f64>| {
            value
                .map(|v| format!("{:.2}", round_cents(v)))
                .unwrap_or_else(|| "n/a".to_string())
        };
        vec![
            vec!["total items".into(), self.total_items.to_string()],
            vec!["avg market price".into(), money(self.avg_market_price)],
            vec!["avg store price".into(), money(self.avg_store_price)],
            vec!["total value".into(), money(self.total_value)],
            vec![
                "increased".into(),
                self.price_changes.increased.to_string(),
            ],
            vec![
                "decreased".into(),
                self.price_changes.decreased.to_string(),
            ],
            vec![
                "unchanged".into(),
                self.price_changes.unchanged.to_string(),
            ],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(market: f64, store: f64, diff: Option<f64>) -> ItemRecord {
        ItemRecord {
            market_price: Some(market),
            store_price: Some(store),
            diff,
            ..Default::default()
        }
    }

    #[test]
    fn aggregates_means_totals_and_change_buckets() {
        let records = vec![
            priced(2.0, 2.0, Some(2.0)),
            priced(1.0, 1.0, Some(-0.5)),
            priced(3.0, 3.0, Some(0.0)),
            priced(4.0, 4.0, Some(0.001)),
        ];
        let summary = Summary::from_records(&records);
        assert_eq!(summary.total_items, 4);
        assert_eq!(summary.avg_market_price, Some(2.5));
        assert_eq!(summary.avg_store_price, Some(2.5));
        assert_eq!(summary.total_value, Some(10.0));
        assert_eq!(
            summary.price_changes,
            PriceChanges {
                increased: 1,
                decreased: 1,
                unchanged: 2,
            }
        );
    }

    #[test]
    fn empty_input_reports_undefined_statistics() {
        let summary = Summary::from_records(&Vec::<ItemRecord>::new());
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.avg_market_price, None);
        assert_eq!(summary.avg_store_price, None);
        assert_eq!(summary.total_value, None);
        let json: serde_json::Value =
            serde_json::from_str(&summary.to_json_pretty().unwrap()).unwrap();
        assert!(json["avg_market_price"].is_null());
        assert_eq!(json["price_changes"]["unchanged"], 0);
    }

    #[test]
    fn json_values_are_rounded_to_cents() {
        let records = vec![
            priced(1.0, 1.0, None),
            priced(1.0, 1.004, None),
            priced(1.0, 1.0, None),
        ];
        let json = serde_json::to_value(Summary::from_records(&records)).unwrap();
        assert_eq!(json["avg_market_price"], 1.0);
        assert_eq!(json["total_value"], 3.0);
        assert_eq!(json["price_changes"]["increased"], 0);
    }
}
