use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "expense_id")]
    pub id: i64,
    pub plan_id: i64,
    pub category_id: i64,
    /// Denormalised by the list endpoint; absent on single-expense reads.
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(with = "money::cents")]
    pub amount: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(deserialize_with = "date_or_datetime")]
    pub expense_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewExpense {
    pub plan_id: i64,
    pub category_id: i64,
    #[serde(serialize_with = "money::cents::serialize")]
    pub amount: i64,
    pub description: String,
    pub expense_date: NaiveDate,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// The backend stores expense dates as timestamps, so the list endpoint
/// sends `2025-01-05 00:00:00` (with optional fraction or `T` separator).
/// Plain `2025-01-05` is accepted as well.
fn date_or_datetime<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_expense_date(raw.trim()).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid expense_date '{}'", raw))
    })
}

fn parse_expense_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}
