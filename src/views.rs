//! Display-ready values derived from a [`CacheSnapshot`].
//!
//! Everything here is a pure function of the snapshot; nothing touches the
//! network or the store. A [`Dashboard`] is rebuilt wholesale whenever the
//! cache changes.

use chrono::NaiveDate;

use crate::models::{BudgetPlan, Category, Expense};
use crate::money::{self, DEFAULT_CURRENCY};
use crate::store::CacheSnapshot;

/// Label used when an expense points at a category we do not know.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

const WARNING_THRESHOLD: f64 = 60.0;
const CRITICAL_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Severity {
    pub fn from_percentage(pct: f64) -> Self {
        if pct > CRITICAL_THRESHOLD {
            Severity::Critical
        } else if pct > WARNING_THRESHOLD {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// Home-view summary of the active plan.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanSummary {
    pub plan_id: Option<i64>,
    pub category_name: Option<String>,
    pub amount: i64,
    pub spent: i64,
    pub remaining: i64,
    pub spent_percentage: f64,
    pub severity: Severity,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PlanSummary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_plan(plan: &BudgetPlan, categories: &[Category]) -> Self {
        let spent_percentage = plan.spent_percentage();
        Self {
            plan_id: Some(plan.id),
            category_name: Some(category_name(plan.category_id, categories).to_string()),
            amount: plan.amount,
            spent: plan.spent,
            remaining: plan.remaining(),
            spent_percentage,
            severity: Severity::from_percentage(spent_percentage),
            start_date: Some(plan.start_date),
            end_date: Some(plan.end_date),
        }
    }

    pub fn has_plan(&self) -> bool {
        self.plan_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuickCounts {
    pub plans: usize,
    pub expenses: usize,
    pub categories: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseRow {
    pub expense_id: i64,
    pub category_name: String,
    pub amount: String,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub username: Option<String>,
    pub currency: String,
    pub summary: PlanSummary,
    pub counts: QuickCounts,
    pub plan_options: Vec<SelectOption>,
    pub category_options: Vec<SelectOption>,
    pub expense_rows: Vec<ExpenseRow>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::compute(&CacheSnapshot::default())
    }
}

impl Dashboard {
    pub fn compute(cache: &CacheSnapshot) -> Self {
        let currency = cache
            .profile
            .as_ref()
            .map(|p| p.currency.clone())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let summary = active_plan(&cache.plans)
            .map(|plan| PlanSummary::from_plan(plan, &cache.categories))
            .unwrap_or_else(PlanSummary::empty);

        Self {
            username: cache.profile.as_ref().map(|p| p.username.clone()),
            summary,
            counts: quick_counts(cache),
            plan_options: plan_options(&cache.plans, &cache.categories, &currency),
            category_options: category_options(&cache.categories),
            expense_rows: expense_rows(&cache.expenses, &cache.categories, &currency),
            currency,
        }
    }

    pub fn amount_display(&self) -> String {
        if self.summary.has_plan() {
            money::format_money(self.summary.amount, &self.currency)
        } else {
            "No budget plan".to_string()
        }
    }

    pub fn remaining_display(&self) -> String {
        if self.summary.has_plan() {
            money::format_money(self.summary.remaining, &self.currency)
        } else {
            "Create a budget plan first".to_string()
        }
    }
}

/// The plan shown on the home view: latest `start_date`, ties going to the
/// highest id. Backend ordering is not used.
pub fn active_plan(plans: &[BudgetPlan]) -> Option<&BudgetPlan> {
    plans.iter().max_by_key(|p| (p.start_date, p.id))
}

pub fn quick_counts(cache: &CacheSnapshot) -> QuickCounts {
    QuickCounts {
        plans: cache.plans.len(),
        expenses: cache.expenses.len(),
        categories: cache.categories.len(),
    }
}

fn category_name(category_id: i64, categories: &[Category]) -> &str {
    categories
        .iter()
        .find(|c| c.id == category_id)
        .map(|c| c.name.as_str())
        .unwrap_or(UNKNOWN_CATEGORY)
}

/// Never fails: denormalised name first, then the cached categories, then
/// [`UNKNOWN_CATEGORY`].
pub fn resolve_category_name<'a>(expense: &'a Expense, categories: &'a [Category]) -> &'a str {
    match expense.category_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name,
        _ => category_name(expense.category_id, categories),
    }
}

pub fn plan_options(
    plans: &[BudgetPlan],
    categories: &[Category],
    currency: &str,
) -> Vec<SelectOption> {
    plans
        .iter()
        .map(|plan| SelectOption {
            value: plan.id,
            label: format!(
                "{} - {}",
                category_name(plan.category_id, categories),
                money::format_money(plan.amount, currency)
            ),
        })
        .collect()
}

pub fn category_options(categories: &[Category]) -> Vec<SelectOption> {
    categories
        .iter()
        .map(|c| SelectOption {
            value: c.id,
            label: c.name.clone(),
        })
        .collect()
}

pub fn expense_rows(
    expenses: &[Expense],
    categories: &[Category],
    currency: &str,
) -> Vec<ExpenseRow> {
    expenses
        .iter()
        .map(|e| ExpenseRow {
            expense_id: e.id,
            category_name: resolve_category_name(e, categories).to_string(),
            amount: money::format_money(e.amount, currency),
            description: e.description.clone(),
            date: e.expense_date,
        })
        .collect()
}
