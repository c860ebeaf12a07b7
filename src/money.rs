//! Money handling for amounts exchanged with the budgeting API.
//!
//! The backend speaks decimal numbers (`50000.0`); everything inside the
//! crate is integer cents so that `remaining = amount - spent` is exact.

use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{SyncError, SyncResult};

/// Currencies the backend accepts for a user profile.
pub const SUPPORTED_CURRENCIES: &[&str] = &["RWF", "USD", "EUR", "CNY"];

/// Currency used when the profile has not told us otherwise.
pub const DEFAULT_CURRENCY: &str = "RWF";

pub fn is_supported_currency(code: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&code.to_uppercase().as_str())
}

/// Convert a decimal amount into cents, rounding to the nearest cent.
pub fn to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Convert cents back into the decimal number the API expects.
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Parse user input such as `"1250"`, `"12.5"` or `"1,250.75"` into cents.
pub fn parse_amount(input: &str) -> SyncResult<i64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(SyncError::InvalidInput("Amount is required".into()));
    }

    let value: f64 = cleaned
        .parse()
        .map_err(|_| SyncError::InvalidInput(format!("'{}' is not a valid amount", input)))?;

    if !value.is_finite() {
        return Err(SyncError::InvalidInput(format!(
            "'{}' is not a valid amount",
            input
        )));
    }

    Ok(to_cents(value))
}

/// Format cents with the currency symbol and a thousands separator, no sign
/// prefix for positive values: `₣50,000.00`, `-$12.30`.
pub fn format_money(cents: i64, currency: &str) -> String {
    let abs_cents = cents.abs();
    let whole = abs_cents / 100;
    let fractional = abs_cents % 100;
    let sign = if cents < 0 { "-" } else { "" };

    format!(
        "{}{}{}.{:02}",
        sign,
        currency_symbol(currency),
        format_with_thousands(whole),
        fractional
    )
}

/// Format a percentage with one decimal place: `62.0%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

fn format_with_thousands(n: i64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_uppercase().as_str() {
        "RWF" => "\u{20a3}",
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "CNY" => "\u{00a5}",
        _ => "\u{20a3}",
    }
}

/// Serde adapter: decimal number on the wire, cents in memory.
pub mod cents {
    use super::*;

    pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(from_cents(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Ok(to_cents(value))
    }
}

/// Like [`cents`] but treats a missing or `null` value as zero.
pub mod cents_or_zero {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<f64> = Option::deserialize(deserializer)?;
        Ok(value.map(to_cents).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_default_currency() {
        assert_eq!(format_money(5_000_000, "RWF"), "\u{20a3}50,000.00");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_money(-1230, "USD"), "-$12.30");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_money(0, "EUR"), "\u{20ac}0.00");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_money(123_456_789, "USD"), "$1,234,567.89");
        assert_eq!(format_money(99_999, "USD"), "$999.99");
    }

    #[test]
    fn test_unknown_currency_uses_franc() {
        assert_eq!(format_money(100, "XYZ"), "\u{20a3}1.00");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1250").unwrap(), 125_000);
        assert_eq!(parse_amount("12.5").unwrap(), 1250);
        assert_eq!(parse_amount(" 1,250.75 ").unwrap(), 125_075);
        assert_eq!(parse_amount("0.1").unwrap(), 10);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_supported_currencies() {
        assert!(is_supported_currency("usd"));
        assert!(is_supported_currency("RWF"));
        assert!(!is_supported_currency("GBP"));
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(62.0), "62.0%");
        assert_eq!(format_percent(100.0), "100.0%");
    }
}
