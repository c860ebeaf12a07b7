pub mod auth;
pub mod budget_plan;
pub mod category;
pub mod expense;
pub mod profile;
pub mod quote;

pub use auth::{LoginRequest, RegisterRequest, TokenResponse};
pub use budget_plan::{BudgetPlan, NewBudgetPlan};
pub use category::{Category, CategoryCreated, NewCategory};
pub use expense::{Expense, NewExpense};
pub use profile::{CurrencyUpdate, PictureUpdate, ProfileUpdate, UserProfile};
pub use quote::Quote;
