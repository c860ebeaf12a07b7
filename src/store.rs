use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::models::{BudgetPlan, Category, Expense, UserProfile};

/// Last successfully fetched server state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSnapshot {
    pub profile: Option<UserProfile>,
    pub categories: Vec<Category>,
    pub plans: Vec<BudgetPlan>,
    pub expenses: Vec<Expense>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.profile.is_none()
            && self.categories.is_empty()
            && self.plans.is_empty()
            && self.expenses.is_empty()
    }

    pub fn find_category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.has_name(name))
    }
}

/// Generation-guarded cache. Every load claims a generation with
/// [`Store::begin`]; its writes land only while that generation is still
/// the newest one. `reset` also moves the generation forward, so nothing
/// started before a logout can repopulate the cache after it.
pub struct Store {
    generation: AtomicU64,
    inner: RwLock<CacheSnapshot>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            inner: RwLock::new(CacheSnapshot::default()),
        }
    }

    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, gen: u64) -> bool {
        self.generation() == gen
    }

    /// Apply `update` if `gen` is still current. The check happens under
    /// the write lock so a concurrent `begin`/`reset` cannot slip between.
    fn write_if_current(&self, gen: u64, update: impl FnOnce(&mut CacheSnapshot)) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if !self.is_current(gen) {
            return false;
        }
        update(&mut guard);
        true
    }

    pub fn set_profile(&self, gen: u64, profile: UserProfile) -> bool {
        self.write_if_current(gen, |cache| cache.profile = Some(profile))
    }

    pub fn set_categories(&self, gen: u64, categories: Vec<Category>) -> bool {
        self.write_if_current(gen, |cache| cache.categories = categories)
    }

    pub fn set_plans(&self, gen: u64, plans: Vec<BudgetPlan>) -> bool {
        self.write_if_current(gen, |cache| cache.plans = plans)
    }

    pub fn set_expenses(&self, gen: u64, expenses: Vec<Expense>) -> bool {
        self.write_if_current(gen, |cache| cache.expenses = expenses)
    }

    /// Drop everything and invalidate in-flight loads.
    pub fn reset(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::SeqCst);
        *guard = CacheSnapshot::default();
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
