//! The pricing rule engine.
//!
//! Each merged record is priced independently, in a fixed order:
//! base price, then multiplier, then store price, then diff. Nothing here
//! reads or writes state outside the record being priced.

use log::info;

use crate::{
    data::{format_integer, round_cents},
    error::{RepriceError, Result},
    merge::{DEFAULT_MULTIPLIER, MergedRecord, MergedSnapshot},
    record::{ItemRecord, Snapshot},
};

/// Base price reported when neither a market nor a low price is known.
pub const UNPRICEABLE_BASE_PRICE: f64 = 50_000.00;

const MULTIPLIER_STEP: f64 = 0.01;
const MULTIPLIER_LARGE_STEP: f64 = 0.05;
/// Smallest multiplier a shrink can produce; keeps the multiplier positive.
pub const MIN_MULTIPLIER: f64 = 0.01;

pub fn base_price(market: Option<f64>, low: Option<f64>) -> f64 {
    match (market, low) {
        (Some(market), Some(low)) => round_cents(market.min(low)),
        (None, Some(low)) => round_cents(low),
        (Some(market), None) => round_cents(market),
        (None, None) => UNPRICEABLE_BASE_PRICE,
    }
}

/// Which adjustment the multiplier receives. Branches are tried in
/// declaration order and the first match wins; later conditions assume the
/// earlier ones failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplierRule {
    /// No quantity on record for the previous run.
    ResetNoHistory,
    /// Stock ran out since the previous run.
    ResetSoldOut,
    /// Stock grew.
    Grow,
    /// Stock shrank and the multiplier has room above 1.0 for a large step.
    ShrinkLarge,
    ShrinkSmall,
}

impl MultiplierRule {
    pub fn select(old_qty: i64, new_qty: i64, prior: f64) -> Self {
        if old_qty == 0 {
            MultiplierRule::ResetNoHistory
        } else if old_qty > 0 && new_qty == 0 {
            MultiplierRule::ResetSoldOut
        } else if old_qty < new_qty {
            MultiplierRule::Grow
        } else if prior - MULTIPLIER_LARGE_STEP > 1.0 {
            MultiplierRule::ShrinkLarge
        } else {
            MultiplierRule::ShrinkSmall
        }
    }

    pub fn apply(self, prior: f64) -> f64 {
        let next = match self {
            MultiplierRule::ResetNoHistory | MultiplierRule::ResetSoldOut => {
                return DEFAULT_MULTIPLIER;
            }
            MultiplierRule::Grow => round_cents(prior + MULTIPLIER_STEP),
            MultiplierRule::ShrinkLarge => round_cents(prior - MULTIPLIER_LARGE_STEP),
            MultiplierRule::ShrinkSmall => round_cents(prior - MULTIPLIER_STEP),
        };
        next.max(MIN_MULTIPLIER)
    }
}

/// Next multiplier for an item. Unknown quantities count as zero.
pub fn multiplier(old_qty: Option<i64>, new_qty: Option<i64>, prior: f64) -> f64 {
    let old_qty = old_qty.unwrap_or(0);
    let new_qty = new_qty.unwrap_or(0);
    MultiplierRule::select(old_qty, new_qty, prior).apply(prior)
}

/// Minimum absolute store price for a stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorBump {
    /// 40 or more on hand.
    Deep,
    /// 20 to 39 on hand.
    Medium,
    Shallow,
}

impl FloorBump {
    pub fn for_quantity(quantity: Option<i64>) -> Self {
        match quantity {
            Some(qty) if qty >= 40 => FloorBump::Deep,
            Some(qty) if qty >= 20 => FloorBump::Medium,
            _ => FloorBump::Shallow,
        }
    }

    pub fn target(self) -> f64 {
        match self {
            FloorBump::Deep => 0.05,
            FloorBump::Medium => 0.15,
            FloorBump::Shallow => 0.25,
        }
    }

    /// `raw + max(0, target - raw)`, evaluated as `max(raw, target)` so the
    /// result is never a rounding error short of the target.
    pub fn apply(self, raw: f64) -> f64 {
        raw.max(self.target())
    }
}

pub fn store_price(
    market: Option<f64>,
    base: f64,
    multiplier: f64,
    quantity: Option<i64>,
) -> f64 {
    let raw = round_cents(market.unwrap_or(base * multiplier));
    FloorBump::for_quantity(quantity).apply(raw)
}

/// Change against the previous store price, a missing one counting as 0.0.
pub fn diff(store_price: f64, old_store_price: Option<f64>) -> f64 {
    round_cents(store_price - old_store_price.unwrap_or(0.0))
}

/// Prices one merged record, writing the computed fields into it.
pub fn price_record(merged: MergedRecord) -> ItemRecord {
    let MergedRecord {
        mut record,
        prior_multiplier,
        prior_quantity,
        ..
    } = merged;

    let base = base_price(record.market_price, record.low_price);
    let next_multiplier = multiplier(prior_quantity, record.total_quantity, prior_multiplier);
    let store = store_price(
        record.market_price,
        base,
        next_multiplier,
        record.total_quantity,
    );
    let old_store = record.old_store_price.unwrap_or(0.0);

    record.old_qty = prior_quantity;
    record.old_multiplier = Some(prior_multiplier);
    record.base_price = Some(base);
    record.multiplier = Some(next_multiplier);
    record.store_price = Some(store);
    record.old_store_price = Some(old_store);
    record.diff = Some(diff(store, Some(old_store)));
    record
}

/// Prices every record. A computed price or diff that overflows `f64` fails
/// the whole run; input cells never carry infinities.
pub fn price_all(merged: MergedSnapshot) -> Result<Snapshot> {
    let records = merged
        .records
        .into_iter()
        .map(|record| {
            let priced = price_record(record);
            match (priced.store_price, priced.diff) {
                (Some(store), Some(diff)) if store.is_finite() && diff.is_finite() => Ok(priced),
                _ => Err(RepriceError::Computation(format!(
                    "non-finite store price for item {}",
                    format_integer(priced.id)
                ))),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    info!("Priced {} record(s)", records.len());
    Ok(Snapshot {
        extra_headers: merged.extra_headers,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_price_prefers_the_lower_of_market_and_low() {
        assert_eq!(base_price(Some(2.0), Some(1.5)), 1.5);
        assert_eq!(base_price(Some(1.5), Some(2.0)), 1.5);
        assert_eq!(base_price(None, Some(0.987)), 0.99);
        assert_eq!(base_price(Some(3.456), None), 3.46);
        assert_eq!(base_price(None, None), UNPRICEABLE_BASE_PRICE);
    }

    #[test]
    fn multiplier_table() {
        assert_eq!(multiplier(Some(0), Some(12), 1.5), 1.2);
        assert_eq!(multiplier(None, Some(12), 1.5), 1.2);
        assert_eq!(multiplier(Some(5), Some(0), 1.5), 1.2);
        assert_eq!(multiplier(Some(5), Some(10), 1.10), 1.11);
        assert_eq!(multiplier(Some(10), Some(5), 1.20), 1.15);
        assert_eq!(multiplier(Some(10), Some(5), 1.03), 1.02);
    }

    #[test]
    fn multiplier_rule_order_is_load_bearing() {
        // Negative stock is neither "no history" nor "sold out": growth wins.
        assert_eq!(MultiplierRule::select(-1, 0, 1.2), MultiplierRule::Grow);
        // Equal quantities are a shrink, not a growth.
        assert_eq!(
            MultiplierRule::select(4, 4, 1.2),
            MultiplierRule::ShrinkLarge
        );
        assert_eq!(
            MultiplierRule::select(4, 4, 1.04),
            MultiplierRule::ShrinkSmall
        );
    }

    #[test]
    fn repeated_small_shrinks_stay_positive() {
        let mut current = 1.02;
        for _ in 0..200 {
            current = multiplier(Some(10), Some(5), current);
        }
        assert_eq!(current, MIN_MULTIPLIER);
    }

    #[test]
    fn floor_bump_buckets() {
        assert_eq!(FloorBump::for_quantity(Some(40)).target(), 0.05);
        assert_eq!(FloorBump::for_quantity(Some(39)).target(), 0.15);
        assert_eq!(FloorBump::for_quantity(Some(20)).target(), 0.15);
        assert_eq!(FloorBump::for_quantity(Some(19)).target(), 0.25);
        assert_eq!(FloorBump::for_quantity(None).target(), 0.25);
    }

    #[test]
    fn store_price_uses_market_then_base_times_multiplier() {
        assert_eq!(store_price(Some(2.0), 1.5, 1.21, Some(8)), 2.0);
        assert_eq!(store_price(None, 2.0, 1.25, Some(8)), 2.5);
        assert_eq!(store_price(Some(0.1), 0.1, 1.2, Some(8)), 0.25);
        assert_eq!(store_price(Some(0.1), 0.1, 1.2, Some(25)), 0.15);
        assert_eq!(store_price(Some(0.01), 0.01, 1.2, Some(45)), 0.05);
    }

    #[test]
    fn sub_cent_prices_round_on_their_stored_value() {
        assert_eq!(base_price(Some(0.155), Some(0.2)), 0.15);
        assert_eq!(base_price(None, Some(0.005)), 0.01);
        assert_eq!(store_price(Some(0.155), 0.15, 1.2, Some(50)), 0.15);
        assert_eq!(store_price(Some(1.015), 1.0, 1.2, Some(5)), 1.01);
        assert_eq!(store_price(None, 0.125, 1.0, Some(50)), 0.12);
    }

    #[test]
    fn diff_against_missing_old_price_is_full_price() {
        assert_eq!(diff(2.0, None), 2.0);
        assert_eq!(diff(2.0, Some(2.5)), -0.5);
        assert_eq!(diff(1.21, Some(1.2)), 0.01);
    }

    #[test]
    fn price_record_fills_computed_columns() {
        let merged = MergedRecord {
            record: ItemRecord {
                id: Some(100),
                condition: "Near Mint".into(),
                market_price: Some(2.0),
                low_price: Some(1.5),
                total_quantity: Some(8),
                ..Default::default()
            },
            prior_multiplier: 1.2,
            prior_quantity: Some(5),
            matched: true,
        };
        let priced = price_record(merged);
        assert_eq!(priced.base_price, Some(1.5));
        assert_eq!(priced.multiplier, Some(1.21));
        assert_eq!(priced.store_price, Some(2.0));
        assert_eq!(priced.old_store_price, Some(0.0));
        assert_eq!(priced.diff, Some(2.0));
        assert_eq!(priced.old_qty, Some(5));
        assert_eq!(priced.old_multiplier, Some(1.2));
    }

    #[test]
    fn overflowing_diff_fails_the_run() {
        let merged = MergedSnapshot {
            records: vec![MergedRecord {
                record: ItemRecord {
                    id: Some(9),
                    market_price: Some(f64::MAX),
                    old_store_price: Some(-f64::MAX),
                    total_quantity: Some(1),
                    ..Default::default()
                },
                prior_multiplier: 1.2,
                prior_quantity: None,
                matched: false,
            }],
            ..Default::default()
        };
        let err = price_all(merged).unwrap_err();
        assert!(matches!(err, RepriceError::Computation(_)));
        assert!(err.to_string().contains("item 9"));
    }
}
