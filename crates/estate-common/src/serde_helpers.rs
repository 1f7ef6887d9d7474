//! Deserialization helpers for request payloads.
//!
//! Decimal columns (prices, budgets, areas, commissions) arrive from form
//! clients either as JSON numbers or as numeric strings, and partial updates
//! need to tell an absent field apart from an explicit `null`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Number(f64),
    Text(String),
}

fn parse_decimal<E: serde::de::Error>(raw: RawDecimal) -> Result<Option<f64>, E> {
    let value = match raw {
        RawDecimal::Number(n) => n,
        RawDecimal::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid decimal '{}'", s)))?
        }
    };
    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(E::custom("decimal must be finite"))
    }
}

/// Required decimal: a number or a non-empty numeric string.
pub fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawDecimal::deserialize(deserializer)?;
    parse_decimal(raw)?.ok_or_else(|| D::Error::custom("decimal value is required"))
}

/// Optional decimal: `null`, an empty string, a number, or a numeric string.
pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawDecimal>::deserialize(deserializer)? {
        Some(raw) => parse_decimal(raw),
        None => Ok(None),
    }
}

/// Patch decimal for a required column: absent → `None`, a value →
/// `Some(v)`, `null` or an empty string is an error.
/// Use together with `#[serde(default)]`.
pub fn present_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    decimal(deserializer).map(Some)
}

/// Patch decimal: only invoked when the field is present, so `null` or an
/// empty string yields `Some(None)` (clear) and a value yields `Some(Some(_))`.
/// Use together with `#[serde(default)]`.
pub fn patch_decimal<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_decimal(deserializer).map(Some)
}

/// Absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
