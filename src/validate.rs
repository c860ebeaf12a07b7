//! Client-side checks run before a form is submitted. They mirror the
//! backend's request schemas so obvious mistakes never cost a round trip.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{SyncError, SyncResult};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 255;
const PASSWORD_MIN: usize = 6;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

pub fn username(value: &str) -> SyncResult<()> {
    let len = value.trim().chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(SyncError::InvalidInput(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN, USERNAME_MAX
        )));
    }
    Ok(())
}

pub fn email(value: &str) -> SyncResult<()> {
    if !email_regex().is_match(value.trim()) {
        return Err(SyncError::InvalidInput(format!(
            "'{}' is not a valid e-mail address",
            value.trim()
        )));
    }
    Ok(())
}

/// Password rules for registration and password changes.
pub fn new_password(value: &str) -> SyncResult<()> {
    if value.chars().count() < PASSWORD_MIN {
        return Err(SyncError::InvalidInput(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN
        )));
    }
    Ok(())
}

pub fn login_password(value: &str) -> SyncResult<()> {
    if value.is_empty() {
        return Err(SyncError::InvalidInput("Password is required".into()));
    }
    Ok(())
}

pub fn positive_amount(cents: i64) -> SyncResult<()> {
    if cents <= 0 {
        return Err(SyncError::InvalidInput(
            "Amount must be greater than zero".into(),
        ));
    }
    Ok(())
}

pub fn date_range(start: NaiveDate, end: NaiveDate) -> SyncResult<()> {
    if end < start {
        return Err(SyncError::InvalidInput(
            "End date must not be before start date".into(),
        ));
    }
    Ok(())
}

pub fn category_name(value: &str) -> SyncResult<()> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidInput(
            "Please enter a category name".into(),
        ));
    }
    Ok(())
}
