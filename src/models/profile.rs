use serde::{Deserialize, Serialize};

use crate::money::DEFAULT_CURRENCY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default = "default_currency", deserialize_with = "nullable_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn nullable_currency<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(default_currency))
}

/// Settings-panel update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.old_password.is_none() && self.new_password.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyUpdate {
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PictureUpdate {
    pub profile_picture_url: String,
}
