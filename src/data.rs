//! Nullable scalar cells and their text coercions.
//!
//! Business-level "unknown price" or "unknown quantity" is modelled as
//! `Option<f64>` / `Option<i64>`. Every parser in this module follows the
//! same rule: an invalid cell becomes `None`, it never raises.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::schema::ColumnType;

/// A typed cell produced by coercing raw text against a [`ColumnType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Integer(Option<i64>),
    Float(Option<f64>),
    Text(String),
}

/// Returned when a numeric value cannot be represented as an integer without loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonIntegral(pub f64);

impl fmt::Display for NonIntegral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot be cast to an integer", self.0)
    }
}

impl Cell {
    pub fn null(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Integer => Cell::Integer(None),
            ColumnType::Float => Cell::Float(None),
            ColumnType::String => Cell::Text(String::new()),
        }
    }

    /// Per-cell lenient coercion. Integer cells holding a fractional value become null.
    pub fn parse(raw: &str, ty: ColumnType) -> Self {
        match ty {
            ColumnType::Integer => Cell::Integer(parse_integer(raw).ok().flatten()),
            ColumnType::Float => Cell::Float(parse_float(raw)),
            ColumnType::String => Cell::Text(raw.to_string()),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Cell::Float(value) => *value,
            Cell::Integer(value) => value.map(|v| v as f64),
            Cell::Text(text) => parse_float(text),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Integer(value) => *value,
            Cell::Float(value) => value.and_then(|v| integral(v).ok()),
            Cell::Text(text) => parse_integer(text).ok().flatten(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Cell::Text(text) => text,
            Cell::Integer(value) => format_integer(value),
            Cell::Float(value) => format_float(value),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Integer(value) => f.write_str(&format_integer(*value)),
            Cell::Float(value) => f.write_str(&format_float(*value)),
        }
    }
}

const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
];

pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw.trim())
}

/// Parses a float, mapping blanks, null tokens, garbage, NaN and infinities
/// to `None`.
pub fn parse_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if is_null_token(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a nullable integer.
///
/// Unparseable text is `Ok(None)`. A well-formed number with a fractional
/// part is an `Err`, because the caller may need to treat the column as a
/// whole as uncastable.
pub fn parse_integer(raw: &str) -> Result<Option<i64>, NonIntegral> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(Some(value));
    }
    match parse_float(trimmed) {
        Some(value) => integral(value).map(Some),
        None => Ok(None),
    }
}

fn integral(value: f64) -> Result<i64, NonIntegral> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(NonIntegral(value))
    }
}

/// Rounds the exact binary value to two decimals, ties to even.
///
/// Quantizing goes through [`Decimal`] so that `0.155` (stored just below the
/// half cent) becomes `0.15`. Values outside the decimal range come back
/// unchanged.
pub fn round_cents(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

pub fn format_integer(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Shortest round-trip form, always with a decimal point (`2.0`, `1.21`).
pub fn format_float(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.1}"),
        Some(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_maps_invalid_to_none() {
        assert_eq!(parse_float("2.5"), Some(2.5));
        assert_eq!(parse_float(" 3 "), Some(3.0));
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("N/A"), None);
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("-infinity"), None);
        assert_eq!(parse_float("1e999"), None);
    }

    #[test]
    fn parse_integer_distinguishes_garbage_from_fractions() {
        assert_eq!(parse_integer("12"), Ok(Some(12)));
        assert_eq!(parse_integer("12.0"), Ok(Some(12)));
        assert_eq!(parse_integer("twelve"), Ok(None));
        assert_eq!(parse_integer(""), Ok(None));
        assert_eq!(parse_integer("12.5"), Err(NonIntegral(12.5)));
    }

    #[test]
    fn round_cents_uses_bankers_rounding_on_exact_halves() {
        assert_eq!(round_cents(0.125), 0.12);
        assert_eq!(round_cents(0.375), 0.38);
        assert_eq!(round_cents(1.1 + 0.01), 1.11);
        assert_eq!(round_cents(1.2 - 0.05), 1.15);
    }

    #[test]
    fn round_cents_rounds_the_stored_value_not_a_scaled_copy() {
        assert_eq!(round_cents(0.005), 0.01);
        assert_eq!(round_cents(0.015), 0.01);
        assert_eq!(round_cents(0.155), 0.15);
        assert_eq!(round_cents(2.675), 2.67);
        assert_eq!(round_cents(-0.155), -0.15);
        assert_eq!(round_cents(50_000.0), 50_000.0);
        assert_eq!(round_cents(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn format_float_keeps_a_decimal_point() {
        assert_eq!(format_float(Some(2.0)), "2.0");
        assert_eq!(format_float(Some(50000.0)), "50000.0");
        assert_eq!(format_float(Some(1.21)), "1.21");
        assert_eq!(format_float(None), "");
    }

    #[test]
    fn cell_parse_is_lenient_per_cell() {
        assert_eq!(
            Cell::parse("7.5", ColumnType::Integer),
            Cell::Integer(None)
        );
        assert_eq!(Cell::parse("x", ColumnType::Float), Cell::Float(None));
        assert_eq!(
            Cell::parse("Near Mint", ColumnType::String),
            Cell::Text("Near Mint".into())
        );
    }
}
