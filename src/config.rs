use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-request deadline applied by the HTTP transport.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub token_path: PathBuf,
    pub request_timeout: Duration,
    pub seed_default_categories: bool,
}

impl Config {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token_path: PathBuf::from("data/token"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            seed_default_categories: false,
        }
    }

    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_base =
            env::var("BUDGET_API_BASE").unwrap_or_else(|_| "http://localhost:5000/api".into());

        Self {
            token_path: env::var("BUDGET_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/token")),
            request_timeout: Duration::from_secs(
                env::var("BUDGET_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            seed_default_categories: env::var("BUDGET_SEED_CATEGORIES")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            ..Self::new(api_base)
        }
    }

    /// Join an API path onto the configured base.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = Config::new("http://api.local/api/");
        assert_eq!(
            config.url("/auth/login"),
            "http://api.local/api/auth/login"
        );
        assert_eq!(
            config.url("categories/categories"),
            "http://api.local/api/categories/categories"
        );
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" YES "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
