use crate::error::ClientError;

/// Client configuration loaded from environment variables.
///
/// Built once at application start and passed to [`ApiClient::new`]
/// (see [`crate::http`]); nothing in this crate reads the environment on
/// its own.
///
/// [`ApiClient::new`]: crate::http::ApiClient::new
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://admin.example.com` (no trailing slash).
    pub api_base_url: String,
    /// Public base URL of the object-storage bucket. Object keys are
    /// appended to it to build public URLs.
    pub storage_public_base_url: String,
    /// Optional bearer token sent to the backend (never to storage).
    pub api_token: Option<String>,
    /// Overall timeout of a backend request in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// TCP connect timeout in seconds (default: `10`).
    pub connect_timeout_secs: u64,
    /// Operator name recorded by `confirm-replace` (default: `admin`).
    pub operator: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".into(),
            storage_public_base_url: String::new(),
            api_token: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            operator: "admin".into(),
        }
    }
}

impl ClientConfig {
    /// Load a `.env` file if one exists, then read the environment.
    pub fn load() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `API_BASE_URL`            | `http://localhost:3000` |
    /// | `STORAGE_PUBLIC_BASE_URL` | (empty)                 |
    /// | `API_TOKEN`               | (unset)                 |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `CONNECT_TIMEOUT_SECS`    | `10`                    |
    /// | `IMPORT_OPERATOR`         | `admin`                 |
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let defaults = Self::default();

        let api_base_url = lookup("API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_base_url);
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "API_BASE_URL must start with http:// or https://, got '{api_base_url}'"
            )));
        }

        let storage_public_base_url = lookup("STORAGE_PUBLIC_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.storage_public_base_url);

        let api_token = lookup("API_TOKEN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let request_timeout_secs =
            parse_secs(&lookup, "REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;
        let connect_timeout_secs =
            parse_secs(&lookup, "CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs)?;

        let operator = lookup("IMPORT_OPERATOR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.operator);

        Ok(Self {
            api_base_url,
            storage_public_base_url,
            api_token,
            request_timeout_secs,
            connect_timeout_secs,
            operator,
        })
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ClientError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ClientError::Config(format!(
                "{key} must be a positive integer, got '{raw}'"
            ))),
            Ok(secs) => Ok(secs),
        },
    }
}
