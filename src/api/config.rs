//! Where the prediction service lives.

/// Base URL used when neither the command line nor the environment sets one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable (also read from `.env`) holding the base URL.
pub const API_URL_ENV: &str = "MODEL_API_URL";

/// Resolved service location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Use `base_url` as given (after normalization), or the default when blank.
    pub fn new(base_url: &str) -> Self {
        Self::resolve(Some(base_url), None)
    }

    /// Resolve from a command-line override, then `MODEL_API_URL`, then the default.
    pub fn from_env(cli_override: Option<&str>) -> Self {
        dotenvy::dotenv().ok();
        let env_value = std::env::var(API_URL_ENV).ok();
        Self::resolve(cli_override, env_value.as_deref())
    }

    fn resolve(cli_override: Option<&str>, env_value: Option<&str>) -> Self {
        let base_url = cli_override
            .and_then(normalize_base_url)
            .or_else(|| env_value.and_then(normalize_base_url))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a service path such as `/predict`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Trim whitespace and a single trailing slash; blank input counts as unset.
fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    Some(trimmed.to_string())
}
