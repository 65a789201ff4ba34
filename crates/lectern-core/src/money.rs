//! Currency amount conversion between display units and minor units.
//!
//! Most currencies store amounts in hundredths (cents); zero-decimal
//! currencies have no minor unit and are stored as-is. The list mirrors the
//! payment processor's.

/// ISO 4217 codes with no minor unit.
const ZERO_DECIMAL: &[&str] = &[
  "BIF", "CLP", "DJF", "GNF", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF",
  "UGX", "VND", "VUV", "XAF", "XOF", "XPF",
];

pub fn is_zero_decimal(currency: &str) -> bool {
  let upper = currency.to_ascii_uppercase();
  ZERO_DECIMAL.contains(&upper.as_str())
}

/// Convert a display amount (e.g. dollars) to minor units (e.g. cents).
/// Zero-decimal currencies pass through rounded to the whole unit.
pub fn to_minor_units(amount: f64, currency: &str) -> i64 {
  if is_zero_decimal(currency) {
    amount.round() as i64
  } else {
    (amount * 100.0).round() as i64
  }
}

/// Convert minor units back to a display amount.
pub fn from_minor_units(minor: i64, currency: &str) -> f64 {
  if is_zero_decimal(currency) {
    minor as f64
  } else {
    minor as f64 / 100.0
  }
}
