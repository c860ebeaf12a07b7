//! Full reload of the cache: profile, categories, budget plans, expenses,
//! in that order.
//!
//! Each step replaces its slice of the cache on success and leaves it
//! untouched on failure. Profile and categories are prerequisites for the
//! rest (names in dropdowns and expense rows resolve through them), so a
//! failure there aborts the sequence. Plans and expenses failures are
//! recorded in the [`LoadReport`] and the sequence carries on.
//!
//! Every call claims a new store generation. A step whose generation has
//! been overtaken by a newer `load_all` (or by a logout) discards its
//! result and the older load stops with [`SyncError::Superseded`].

use tracing::{debug, info, warn};

use crate::api::paths;
use crate::controller::Controller;
use crate::error::{SyncError, SyncResult};
use crate::models::{BudgetPlan, Category, Expense, UserProfile};
use crate::transport::{ApiRequest, Transport};
use crate::views::Dashboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Profile,
    Categories,
    BudgetPlans,
    Expenses,
}

impl Resource {
    pub const LOAD_ORDER: [Resource; 4] = [
        Resource::Profile,
        Resource::Categories,
        Resource::BudgetPlans,
        Resource::Expenses,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Resource::Profile => paths::PROFILE,
            Resource::Categories => paths::CATEGORIES,
            Resource::BudgetPlans => paths::BUDGET_PLANS,
            Resource::Expenses => paths::EXPENSES,
        }
    }

    /// Whether a failure of this step aborts the rest of the load.
    pub fn is_prerequisite(&self) -> bool {
        matches!(self, Resource::Profile | Resource::Categories)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Profile => "profile",
            Resource::Categories => "categories",
            Resource::BudgetPlans => "budget_plans",
            Resource::Expenses => "expenses",
        }
    }

    /// Name shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Profile => "profile",
            Resource::Categories => "categories",
            Resource::BudgetPlans => "budget plans",
            Resource::Expenses => "expenses",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    NotAttempted,
    Refreshed,
    /// Fetch failed; the cached slice is whatever it was before.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub generation: u64,
    pub profile: StepStatus,
    pub categories: StepStatus,
    pub budget_plans: StepStatus,
    pub expenses: StepStatus,
}

impl LoadReport {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            profile: StepStatus::default(),
            categories: StepStatus::default(),
            budget_plans: StepStatus::default(),
            expenses: StepStatus::default(),
        }
    }

    pub fn status(&self, resource: Resource) -> &StepStatus {
        match resource {
            Resource::Profile => &self.profile,
            Resource::Categories => &self.categories,
            Resource::BudgetPlans => &self.budget_plans,
            Resource::Expenses => &self.expenses,
        }
    }

    fn set(&mut self, resource: Resource, status: StepStatus) {
        match resource {
            Resource::Profile => self.profile = status,
            Resource::Categories => self.categories = status,
            Resource::BudgetPlans => self.budget_plans = status,
            Resource::Expenses => self.expenses = status,
        }
    }

    /// True when every resource was refreshed.
    pub fn is_complete(&self) -> bool {
        Resource::LOAD_ORDER
            .iter()
            .all(|r| *self.status(*r) == StepStatus::Refreshed)
    }

    pub fn failures(&self) -> Vec<(Resource, &str)> {
        Resource::LOAD_ORDER
            .iter()
            .filter_map(|r| match self.status(*r) {
                StepStatus::Failed(msg) => Some((*r, msg.as_str())),
                _ => None,
            })
            .collect()
    }
    /// User-facing warning naming every resource that is still showing
    /// stale data, or `None` when the load was complete.
    pub fn stale_message(&self) -> Option<String> {
        let failures = self.failures();
        if failures.is_empty() {
            return None;
        }

        let parts: Vec<String> = failures
            .iter()
            .map(|(resource, msg)| format!("{} ({})", resource.label(), msg.trim_end_matches('.')))
            .collect();
        Some(format!(
            "Could not refresh {}. Showing the last loaded data.",
            parts.join(", ")
        ))
    }
}

impl<T: Transport> Controller<T> {
    /// Refresh the whole cache and republish the dashboard.
    ///
    /// Without a session this fails with `Unauthenticated` before touching
    /// the network. A 401 on any step logs out and stops the sequence.
    pub async fn load_all(&self) -> SyncResult<LoadReport> {
        if !self.session.is_authenticated() {
            return Err(SyncError::Unauthenticated);
        }

        let generation = self.store.begin();
        debug!(generation, "Starting full load");

        let result = self.run_load(generation).await;

        // Views always follow the cache, even after an aborted load. A
        // superseded or logged-out load leaves that to whoever replaced it.
        if self.store.is_current(generation) {
            self.publish_views();
        }

        match &result {
            Ok(report) if report.is_complete() => info!(generation, "Full load complete"),
            Ok(report) => warn!(
                generation,
                failed = ?report.failures(),
                "Load finished with stale resources"
            ),
            Err(e) => debug!(generation, error = %e, "Load aborted"),
        }

        result
    }

    async fn run_load(&self, generation: u64) -> SyncResult<LoadReport> {
        let mut report = LoadReport::new(generation);

        for resource in Resource::LOAD_ORDER {
            if !self.store.is_current(generation) {
                return Err(SyncError::Superseded);
            }

            match self.load_resource(generation, resource).await {
                Ok(()) => report.set(resource, StepStatus::Refreshed),
                Err(e @ (SyncError::Unauthenticated | SyncError::Superseded)) => return Err(e),
                Err(e) if resource.is_prerequisite() => {
                    warn!(resource = resource.as_str(), error = %e, "Required resource failed, aborting load");
                    return Err(e);
                }
                Err(e) => {
                    warn!(resource = resource.as_str(), error = %e, "Resource failed, keeping cached copy");
                    report.set(resource, StepStatus::Failed(e.user_message()));
                }
            }
        }

        Ok(report)
    }

    async fn load_resource(&self, generation: u64, resource: Resource) -> SyncResult<()> {
        let response = self.authorized(ApiRequest::get(resource.path())).await?;

        let applied = match resource {
            Resource::Profile => {
                let profile: UserProfile = response.json()?;
                self.store.set_profile(generation, profile)
            }
            Resource::Categories => {
                let categories: Vec<Category> = response.json()?;
                self.store.set_categories(generation, categories)
            }
            Resource::BudgetPlans => {
                let plans: Vec<BudgetPlan> = response.json()?;
                self.store.set_plans(generation, plans)
            }
            Resource::Expenses => {
                let expenses: Vec<Expense> = response.json()?;
                self.store.set_expenses(generation, expenses)
            }
        };

        if !applied {
            debug!(resource = resource.as_str(), generation, "Discarding superseded result");
            return Err(SyncError::Superseded);
        }
        Ok(())
    }

    /// Recompute every derived view from one consistent snapshot.
    pub(crate) fn publish_views(&self) {
        let snapshot = self.store.snapshot();
        self.dashboard.send_replace(Dashboard::compute(&snapshot));
    }
}
