//! Request helper and the endpoint catalogue of the budgeting backend.

use crate::error::SyncError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Outcome of an authenticated call. A rejected session is reported as
/// its own case so the caller decides what logging out means.
#[derive(Debug)]
pub enum Reply {
    Ok(ApiResponse),
    Unauthorized,
    Failure(SyncError),
}

pub struct ApiClient<T> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` with `Authorization: Bearer <token>`. Without a token
    /// nothing is sent and the reply is `Failure(Unauthenticated)`.
    pub async fn authorized(&self, token: Option<&str>, request: ApiRequest) -> Reply {
        let Some(token) = token else {
            return Reply::Failure(SyncError::Unauthenticated);
        };

        match self.transport.send(request.with_bearer(token)).await {
            Ok(response) if response.status == 401 => Reply::Unauthorized,
            Ok(response) if response.is_success() => Reply::Ok(response),
            Ok(response) => Reply::Failure(SyncError::from_status(response.status, &response.body)),
            Err(e) => Reply::Failure(e),
        }
    }

    /// Send `request` without credentials and return the response whatever
    /// its status.
    pub async fn public(&self, request: ApiRequest) -> Result<ApiResponse, SyncError> {
        self.transport.send(request).await
    }
}

pub mod paths {
    pub const REGISTER: &str = "/auth/register";
    pub const LOGIN: &str = "/auth/login";
    pub const PROFILE: &str = "/auth/profile";
    pub const UPDATE_PROFILE: &str = "/auth/update_profile";
    pub const UPDATE_CURRENCY: &str = "/auth/update_currency";
    pub const UPDATE_PICTURE: &str = "/auth/update_picture";
    pub const CATEGORIES: &str = "/categories/categories";
    pub const BUDGET_PLANS: &str = "/budget_plans/budget_plans";
    pub const EXPENSES: &str = "/expenses/expenses";
    pub const QUOTE: &str = "/quotes/quote";

    pub fn budget_plan(id: i64) -> String {
        format!("{}/{}", BUDGET_PLANS, id)
    }

    pub fn expense(id: i64) -> String {
        format!("{}/{}", EXPENSES, id)
    }
}
