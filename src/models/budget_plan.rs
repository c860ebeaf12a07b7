use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetPlan {
    #[serde(rename = "plan_id")]
    pub id: i64,
    pub category_id: i64,
    #[serde(with = "money::cents")]
    pub amount: i64,
    /// Computed by the backend from the plan's expenses.
    #[serde(default, deserialize_with = "money::cents_or_zero::deserialize")]
    pub spent: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl BudgetPlan {
    /// Not clamped: an overspent plan has a negative remainder.
    pub fn remaining(&self) -> i64 {
        self.amount - self.spent
    }

    /// Share of the plan already spent, clamped to `[0, 100]`. A plan with a
    /// non-positive amount reports 0.
    pub fn spent_percentage(&self) -> f64 {
        if self.amount <= 0 {
            return 0.0;
        }
        (self.spent as f64 / self.amount as f64 * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBudgetPlan {
    pub category_id: i64,
    #[serde(serialize_with = "money::cents::serialize")]
    pub amount: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
