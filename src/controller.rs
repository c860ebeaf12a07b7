//! Composition root for the client.
//!
//! A [`Controller`] owns the session, the cache and the API client. UI
//! events become [`Command`]s; each command is one awaited task that may
//! mutate the cache (through the loader) and republish the derived views.

use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{paths, ApiClient, Reply};
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::loader::LoadReport;
use crate::models::{
    CategoryCreated, CurrencyUpdate, LoginRequest, NewBudgetPlan, NewCategory, NewExpense,
    PictureUpdate, ProfileUpdate, Quote, RegisterRequest, TokenResponse,
};
use crate::money;
use crate::session::{AuthState, FileTokenStore, SessionManager, TokenStore};
use crate::store::{CacheSnapshot, Store};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use crate::validate;
use crate::views::{self, Dashboard};

/// Categories created by [`Controller::seed_default_categories`].
pub const DEFAULT_CATEGORIES: &[&str] = &["Food", "Transport", "Bills", "Shopping", "Entertainment"];

const QUOTE_UNAVAILABLE: &str = "Take control of your finances, one expense at a time.";
const QUOTE_OFFLINE: &str =
    "The best time to start budgeting was yesterday. The second best time is now.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    Home,
    Dashboard,
    AddExpense,
}

impl View {
    pub fn requires_session(&self) -> bool {
        matches!(self, View::Home | View::Dashboard | View::AddExpense)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiState {
    pub view: View,
    pub theme: Theme,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            view: View::Login,
            theme: Theme::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanForm {
    pub category_id: i64,
    pub amount: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryChoice {
    Existing(i64),
    /// The "Other" entry: create this category first.
    New(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseForm {
    /// Defaults to the active plan.
    pub plan_id: Option<i64>,
    pub category: CategoryChoice,
    pub amount: i64,
    pub description: Option<String>,
    pub expense_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Navigate(View),
    Login {
        email: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
    },
    Logout,
    Refresh,
    CreateCategory {
        name: String,
        description: Option<String>,
    },
    SeedDefaultCategories,
    CreatePlan(PlanForm),
    DeletePlan(i64),
    AddExpense(ExpenseForm),
    DeleteExpense(i64),
    UpdateProfile(ProfileUpdate),
    UpdateCurrency(String),
    UpdatePicture(String),
    SetTheme(Theme),
}

impl Command {
    /// Name for logs; never includes field values such as passwords.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Navigate(_) => "navigate",
            Command::Login { .. } => "login",
            Command::Register { .. } => "register",
            Command::Logout => "logout",
            Command::Refresh => "refresh",
            Command::CreateCategory { .. } => "create_category",
            Command::SeedDefaultCategories => "seed_default_categories",
            Command::CreatePlan(_) => "create_plan",
            Command::DeletePlan(_) => "delete_plan",
            Command::AddExpense(_) => "add_expense",
            Command::DeleteExpense(_) => "delete_expense",
            Command::UpdateProfile(_) => "update_profile",
            Command::UpdateCurrency(_) => "update_currency",
            Command::UpdatePicture(_) => "update_picture",
            Command::SetTheme(_) => "set_theme",
        }
    }
}

/// What a successful command reports back to the user. Silent notices
/// (navigation, theme) carry no message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(pub Option<String>);

impl Notice {
    fn new(message: impl Into<String>) -> Self {
        Self(Some(message.into()))
    }

    fn silent() -> Self {
        Self(None)
    }

    /// Append a stale-data warning, if any.
    fn with_warning(self, warning: Option<String>) -> Self {
        match (self.0, warning) {
            (Some(message), Some(warning)) => Self(Some(format!("{} {}", message, warning))),
            (None, warning) => Self(warning),
            (message, None) => Self(message),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Outcome of a command that reloads the cache once the backend has
/// accepted it. `stale` is set when that reload left data unrefreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synced<V = ()> {
    pub value: V,
    pub stale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The backend issued a token; the user is now logged in.
    LoggedIn,
    /// Account created, but the user still has to log in.
    LoginRequired,
}

pub struct Controller<T> {
    config: Config,
    api: ApiClient<T>,
    pub(crate) session: SessionManager,
    pub(crate) store: Store,
    ui: watch::Sender<UiState>,
    pub(crate) dashboard: watch::Sender<Dashboard>,
}

impl Controller<HttpTransport> {
    /// Production wiring: `reqwest` transport and a token file.
    pub fn from_config(config: Config) -> SyncResult<Self> {
        let transport = HttpTransport::new(&config)?;
        let store = FileTokenStore::new(&config.token_path);
        Ok(Self::new(config, transport, store))
    }
}

impl<T: Transport> Controller<T> {
    pub fn new(config: Config, transport: T, token_store: impl TokenStore + 'static) -> Self {
        let (ui, _) = watch::channel(UiState::default());
        let (dashboard, _) = watch::channel(Dashboard::default());

        Self {
            config,
            api: ApiClient::new(transport),
            session: SessionManager::new(token_store),
            store: Store::new(),
            ui,
            dashboard,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        self.api.transport()
    }

    pub fn auth_state(&self) -> AuthState {
        self.session.state()
    }

    pub fn ui_state(&self) -> UiState {
        *self.ui.borrow()
    }

    pub fn subscribe_ui(&self) -> watch::Receiver<UiState> {
        self.ui.subscribe()
    }

    pub fn dashboard(&self) -> Dashboard {
        self.dashboard.borrow().clone()
    }

    pub fn subscribe_dashboard(&self) -> watch::Receiver<Dashboard> {
        self.dashboard.subscribe()
    }

    pub fn cache(&self) -> CacheSnapshot {
        self.store.snapshot()
    }

    /// Pick up a persisted token from a previous run and land on the home
    /// view if there is one. Nothing is fetched yet.
    pub fn restore(&self) -> SyncResult<AuthState> {
        let state = self.session.restore()?;
        if state == AuthState::Authenticated {
            info!("Restored persisted session");
            self.set_view(View::Home);
        }
        Ok(state)
    }

    /// End the session: forget the token, empty the cache, invalidate any
    /// load in flight and send the UI back to the login view. Idempotent.
    pub fn clear(&self) {
        self.session.clear();
        self.store.reset();
        self.dashboard.send_replace(Dashboard::default());
        self.set_view(View::Login);
    }

    pub fn logout(&self) {
        info!("Logging out");
        self.clear();
    }

    fn set_view(&self, view: View) {
        self.ui.send_modify(|ui| ui.view = view);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.ui.send_modify(|ui| ui.theme = theme);
    }

    /// Run an authenticated request with the current token. A 401 ends the
    /// session before the error reaches the caller.
    pub async fn authorized(&self, request: ApiRequest) -> SyncResult<ApiResponse> {
        let token = self.session.token();
        match self.api.authorized(token.as_deref(), request).await {
            Reply::Ok(response) => Ok(response),
            Reply::Unauthorized => {
                info!("Backend rejected the session token, logging out");
                self.clear();
                Err(SyncError::Unauthenticated)
            }
            Reply::Failure(e) => Err(e),
        }
    }

    pub async fn dispatch(&self, command: Command) -> SyncResult<Notice> {
        debug!(command = command.name(), "Dispatching command");
        match command {
            Command::Navigate(view) => {
                let report = self.navigate(view).await?;
                Ok(Notice::silent().with_warning(report.and_then(|r| r.stale_message())))
            }
            Command::Login { email, password } => {
                let synced = self.login(&email, &password).await?;
                Ok(Notice::new("Logged in successfully!").with_warning(synced.stale))
            }
            Command::Register {
                username,
                email,
                password,
            } => {
                let synced = self.register(&username, &email, &password).await?;
                let notice = match synced.value {
                    RegisterOutcome::LoggedIn => Notice::new("Registration successful!"),
                    RegisterOutcome::LoginRequired => {
                        Notice::new("Registration successful! Please log in.")
                    }
                };
                Ok(notice.with_warning(synced.stale))
            }
            Command::Logout => {
                self.logout();
                Ok(Notice::new("Logged out."))
            }
            Command::Refresh => {
                let report = self.load_all().await?;
                Ok(match report.stale_message() {
                    Some(warning) => Notice::new(warning),
                    None => Notice::new("Data refreshed."),
                })
            }
            Command::CreateCategory { name, description } => {
                let synced = self.create_category(&name, description).await?;
                let notice = Notice::new(format!("Category '{}' created.", name.trim()));
                Ok(notice.with_warning(synced.stale))
            }
            Command::SeedDefaultCategories => {
                let synced = self.seed_default_categories().await?;
                let notice = Notice::new(format!("Created {} default categories.", synced.value));
                Ok(notice.with_warning(synced.stale))
            }
            Command::CreatePlan(form) => {
                let synced = self.create_plan(form).await?;
                Ok(Notice::new("Budget plan added!").with_warning(synced.stale))
            }
            Command::DeletePlan(id) => {
                let synced = self.delete_plan(id).await?;
                Ok(Notice::new("Budget plan deleted.").with_warning(synced.stale))
            }
            Command::AddExpense(form) => {
                let synced = self.add_expense(form).await?;
                Ok(Notice::new("Expense added successfully!").with_warning(synced.stale))
            }
            Command::DeleteExpense(id) => {
                let synced = self.delete_expense(id).await?;
                Ok(Notice::new("Expense deleted.").with_warning(synced.stale))
            }
            Command::UpdateProfile(update) => {
                let synced = self.update_profile(update).await?;
                Ok(Notice::new("Profile updated.").with_warning(synced.stale))
            }
            Command::UpdateCurrency(code) => {
                let synced = self.update_currency(&code).await?;
                let notice = Notice::new(format!("Currency set to {}.", code.to_uppercase()));
                Ok(notice.with_warning(synced.stale))
            }
            Command::UpdatePicture(url) => {
                let synced = self.update_picture(&url).await?;
                Ok(Notice::new("Profile picture updated.").with_warning(synced.stale))
            }
            Command::SetTheme(theme) => {
                self.set_theme(theme);
                Ok(Notice::silent())
            }
        }
    }

    /// Switch sections. Every authenticated section reloads everything and
    /// hands back the load report; other sections load nothing.
    pub async fn navigate(&self, view: View) -> SyncResult<Option<LoadReport>> {
        if !view.requires_session() {
            self.set_view(view);
            return Ok(None);
        }
        if !self.session.is_authenticated() {
            self.set_view(View::Login);
            return Err(SyncError::Unauthenticated);
        }
        self.set_view(view);
        self.load_all().await.map(Some)
    }

    pub async fn login(&self, email: &str, password: &str) -> SyncResult<Synced> {
        validate::email(email)?;
        validate::login_password(password)?;

        let request = ApiRequest::post(
            paths::LOGIN,
            &LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            },
        )?;
        let response = self.api.public(request).await?;

        if response.status == 401 {
            return Err(SyncError::Validation {
                status: 401,
                message: "Invalid email or password".into(),
            });
        }
        if !response.is_success() {
            return Err(SyncError::from_status(response.status, &response.body));
        }

        let token = response
            .json::<TokenResponse>()?
            .access_token
            .ok_or_else(|| SyncError::Decode("login response has no access_token".into()))?;

        self.start_session(&token).await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> SyncResult<Synced<RegisterOutcome>> {
        validate::username(username)?;
        validate::email(email)?;
        validate::new_password(password)?;

        let request = ApiRequest::post(
            paths::REGISTER,
            &RegisterRequest {
                username: username.trim().to_string(),
                email: email.trim().to_string(),
                password: password.to_string(),
            },
        )?;
        let response = self.api.public(request).await?;
        if !response.is_success() {
            return Err(SyncError::from_status(response.status, &response.body));
        }

        match response.json::<TokenResponse>()?.access_token {
            Some(token) => {
                let synced = self.start_session(&token).await?;
                Ok(Synced {
                    value: RegisterOutcome::LoggedIn,
                    stale: synced.stale,
                })
            }
            None => {
                self.set_view(View::Login);
                Ok(Synced {
                    value: RegisterOutcome::LoginRequired,
                    stale: None,
                })
            }
        }
    }

    async fn start_session(&self, token: &str) -> SyncResult<Synced> {
        self.session.set_token(token)?;
        info!("Session established");
        self.set_view(View::Home);
        let synced = self.synced(()).await?;

        // Only seed on a complete load: a failed categories fetch also
        // leaves the list empty.
        if synced.stale.is_none()
            && self.config.seed_default_categories
            && self.store.snapshot().categories.is_empty()
        {
            let seeded = self.seed_default_categories().await?;
            return Ok(Synced {
                value: (),
                stale: seeded.stale,
            });
        }
        Ok(synced)
    }

    /// Reload after a successful write. Only a lost session is an error
    /// here; anything else leaves the previous cache in place and comes
    /// back as a warning for the user.
    async fn refresh_after_write(&self) -> SyncResult<Option<String>> {
        match self.load_all().await {
            Ok(report) => Ok(report.stale_message()),
            Err(SyncError::Superseded) => Ok(None),
            Err(SyncError::Unauthenticated) => Err(SyncError::Unauthenticated),
            Err(e) => {
                warn!(error = %e, "Reload after write failed");
                Ok(Some(format!(
                    "Could not reload data ({}). Showing the last loaded data.",
                    e.user_message().trim_end_matches('.')
                )))
            }
        }
    }

    async fn synced<V>(&self, value: V) -> SyncResult<Synced<V>> {
        let stale = self.refresh_after_write().await?;
        Ok(Synced { value, stale })
    }

    /// Create a category unless one with the same name (ignoring case and
    /// padding) is already cached. The value is the new category id.
    pub async fn create_category(
        &self,
        name: &str,
        description: Option<String>,
    ) -> SyncResult<Synced<i64>> {
        let id = self.post_category(name, description).await?;
        self.synced(id).await
    }

    async fn post_category(&self, name: &str, description: Option<String>) -> SyncResult<i64> {
        validate::category_name(name)?;
        let name = name.trim();

        if let Some(existing) = self.store.snapshot().find_category_by_name(name) {
            debug!(name = %name, existing_id = existing.id, "Category already cached");
            return Err(SyncError::AlreadyExists(existing.name.clone()));
        }

        let request = ApiRequest::post(
            paths::CATEGORIES,
            &NewCategory {
                name: name.to_string(),
                description: description.filter(|d| !d.trim().is_empty()),
            },
        )?;
        let created: CategoryCreated = self.authorized(request).await?.json()?;
        info!(category_id = created.category_id, name = %name, "Category created");
        Ok(created.category_id)
    }

    /// Create whichever of [`DEFAULT_CATEGORIES`] are missing. Individual
    /// failures are logged and skipped; a lost session stops the run.
    pub async fn seed_default_categories(&self) -> SyncResult<Synced<usize>> {
        let mut created = 0;
        for name in DEFAULT_CATEGORIES {
            match self.post_category(name, None).await {
                Ok(_) => created += 1,
                Err(SyncError::AlreadyExists(_)) => {}
                Err(SyncError::Unauthenticated) => return Err(SyncError::Unauthenticated),
                Err(e) => warn!(name = %name, error = %e, "Failed to create default category"),
            }
        }
        self.synced(created).await
    }

    pub async fn create_plan(&self, form: PlanForm) -> SyncResult<Synced> {
        validate::positive_amount(form.amount)?;
        validate::date_range(form.start_date, form.end_date)?;

        let request = ApiRequest::post(
            paths::BUDGET_PLANS,
            &NewBudgetPlan {
                category_id: form.category_id,
                amount: form.amount,
                start_date: form.start_date,
                end_date: form.end_date,
            },
        )?;
        self.authorized(request).await?;
        info!(category_id = form.category_id, amount = form.amount, "Budget plan created");
        self.synced(()).await
    }

    pub async fn delete_plan(&self, plan_id: i64) -> SyncResult<Synced> {
        self.authorized(ApiRequest::delete(paths::budget_plan(plan_id)))
            .await?;
        info!(plan_id, "Budget plan deleted");
        self.synced(()).await
    }

    pub async fn add_expense(&self, form: ExpenseForm) -> SyncResult<Synced> {
        validate::positive_amount(form.amount)?;

        let cache = self.store.snapshot();
        let plan_id = match (form.plan_id, views::active_plan(&cache.plans)) {
            (_, None) => return Err(SyncError::NoActivePlan),
            (Some(id), Some(_)) => id,
            (None, Some(active)) => active.id,
        };

        let (category_id, category_name) = match form.category {
            CategoryChoice::Existing(id) => {
                let name = cache
                    .categories
                    .iter()
                    .find(|c| c.id == id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| views::UNKNOWN_CATEGORY.to_string());
                (id, name)
            }
            // Created without its own reload; the one after the expense
            // picks it up.
            CategoryChoice::New(name) => {
                let id = self.post_category(&name, None).await?;
                (id, name.trim().to_string())
            }
        };

        let description = form
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Expense for {}", category_name));

        let request = ApiRequest::post(
            paths::EXPENSES,
            &NewExpense {
                plan_id,
                category_id,
                amount: form.amount,
                description,
                expense_date: form.expense_date,
            },
        )?;
        self.authorized(request).await?;
        info!(plan_id, category_id, amount = form.amount, "Expense added");
        self.synced(()).await
    }

    pub async fn delete_expense(&self, expense_id: i64) -> SyncResult<Synced> {
        self.authorized(ApiRequest::delete(paths::expense(expense_id)))
            .await?;
        info!(expense_id, "Expense deleted");
        self.synced(()).await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> SyncResult<Synced> {
        if update.is_empty() {
            return Err(SyncError::InvalidInput("Nothing to update".into()));
        }
        if let Some(username) = &update.username {
            validate::username(username)?;
        }
        match (&update.old_password, &update.new_password) {
            (Some(old), Some(new)) => {
                validate::login_password(old)?;
                validate::new_password(new)?;
            }
            (None, None) => {}
            _ => {
                return Err(SyncError::InvalidInput(
                    "Both the current and the new password are required".into(),
                ))
            }
        }

        self.authorized(ApiRequest::put(paths::UPDATE_PROFILE, &update)?)
            .await?;
        info!("Profile updated");
        self.synced(()).await
    }

    pub async fn update_currency(&self, code: &str) -> SyncResult<Synced> {
        if !money::is_supported_currency(code) {
            return Err(SyncError::InvalidInput(format!(
                "Unsupported currency '{}'. Choose one of: {}",
                code,
                money::SUPPORTED_CURRENCIES.join(", ")
            )));
        }

        let request = ApiRequest::put(
            paths::UPDATE_CURRENCY,
            &CurrencyUpdate {
                currency: code.to_uppercase(),
            },
        )?;
        self.authorized(request).await?;
        self.synced(()).await
    }

    pub async fn update_picture(&self, url: &str) -> SyncResult<Synced> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SyncError::InvalidInput("Picture URL is required".into()));
        }

        let request = ApiRequest::put(
            paths::UPDATE_PICTURE,
            &PictureUpdate {
                profile_picture_url: url.to_string(),
            },
        )?;
        self.authorized(request).await?;
        self.synced(()).await
    }

    /// Quote of the day. Unauthenticated and infallible: any failure turns
    /// into a canned quote and never touches the session.
    pub async fn quote(&self) -> Quote {
        match self.api.public(ApiRequest::get(paths::QUOTE)).await {
            Ok(response) if response.is_success() => response.json().unwrap_or_else(|e| {
                warn!(error = %e, "Malformed quote response");
                Quote::fallback(QUOTE_UNAVAILABLE)
            }),
            Ok(response) => {
                debug!(status = response.status, "Quote endpoint unavailable");
                Quote::fallback(QUOTE_UNAVAILABLE)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch quote");
                Quote::fallback(QUOTE_OFFLINE)
            }
        }
    }
}
