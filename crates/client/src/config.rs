use std::str::FromStr;

use leadconsole_core::error::CoreError;
use leadconsole_core::filter::{is_valid_page_size, SourceMode, DEFAULT_PAGE_SIZE, PAGE_SIZES};

use crate::auth::AuthContext;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the lead API, without a trailing slash.
    pub api_url: String,
    /// Bearer token; `None` runs unauthenticated (every request fails).
    pub api_token: Option<String>,
    /// Where filtering and pagination happen.
    pub source_mode: SourceMode,
    /// Initial page size of the lead list.
    pub page_size: u32,
    /// Page size used to walk the full lead set in client mode.
    pub snapshot_page_size: u32,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".to_string(),
            api_token: None,
            source_mode: SourceMode::Server,
            page_size: DEFAULT_PAGE_SIZE,
            snapshot_page_size: 500,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                     |
    /// |---------------------------|-----------------------------|
    /// | `LEAD_API_URL`            | `http://localhost:8000/api` |
    /// | `LEAD_API_TOKEN`          | none                        |
    /// | `LEAD_SOURCE_MODE`        | `server`                    |
    /// | `LEAD_PAGE_SIZE`          | `10`                        |
    /// | `LEAD_SNAPSHOT_PAGE_SIZE` | `500`                       |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                        |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = get("LEAD_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(CoreError::Configuration(format!(
                "LEAD_API_URL must be an http(s) URL, got '{api_url}'"
            )));
        }

        let source_mode = match get("LEAD_SOURCE_MODE") {
            Some(raw) => SourceMode::from_str(&raw)?,
            None => defaults.source_mode,
        };

        let page_size = parse_or(get("LEAD_PAGE_SIZE"), "LEAD_PAGE_SIZE", defaults.page_size)?;
        if !is_valid_page_size(page_size) {
            return Err(CoreError::Configuration(format!(
                "LEAD_PAGE_SIZE must be one of {PAGE_SIZES:?}, got {page_size}"
            )));
        }

        let snapshot_page_size = parse_or(
            get("LEAD_SNAPSHOT_PAGE_SIZE"),
            "LEAD_SNAPSHOT_PAGE_SIZE",
            defaults.snapshot_page_size,
        )?;
        if snapshot_page_size == 0 {
            return Err(CoreError::Configuration(
                "LEAD_SNAPSHOT_PAGE_SIZE must be greater than zero".to_string(),
            ));
        }

        let request_timeout_secs = parse_or(
            get("REQUEST_TIMEOUT_SECS"),
            "REQUEST_TIMEOUT_SECS",
            defaults.request_timeout_secs,
        )?;

        Ok(Self {
            api_url,
            api_token: get("LEAD_API_TOKEN"),
            source_mode,
            page_size,
            snapshot_page_size,
            request_timeout_secs,
        })
    }

    pub fn auth_context(&self) -> AuthContext {
        match &self.api_token {
            Some(token) => AuthContext::bearer(token.clone()),
            None => AuthContext::anonymous(),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, CoreError> {
    match raw {
        Some(raw) => raw.parse().map_err(|_| {
            CoreError::Configuration(format!("{key} must be a valid number, got '{raw}'"))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ClientConfig, CoreError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(config(&[]).unwrap(), ClientConfig::default());
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let cfg = config(&[
            ("LEAD_API_URL", "https://crm.example.com/api/"),
            ("LEAD_API_TOKEN", " tok "),
            ("LEAD_SOURCE_MODE", "client"),
            ("LEAD_PAGE_SIZE", "25"),
            ("LEAD_SNAPSHOT_PAGE_SIZE", "200"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(cfg.api_url, "https://crm.example.com/api");
        assert_eq!(cfg.api_token.as_deref(), Some("tok"));
        assert_eq!(cfg.source_mode, SourceMode::Client);
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.snapshot_page_size, 200);
        assert_eq!(cfg.request_timeout_secs, 5);
        assert!(cfg.auth_context().is_authenticated());
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        assert_matches!(config(&[("LEAD_PAGE_SIZE", "30")]), Err(CoreError::Configuration(_)));
        assert_matches!(config(&[("LEAD_PAGE_SIZE", "ten")]), Err(CoreError::Configuration(_)));
        assert_matches!(
            config(&[("LEAD_SOURCE_MODE", "hybrid")]),
            Err(CoreError::Configuration(_))
        );
        assert_matches!(config(&[("LEAD_API_URL", "ftp://x")]), Err(CoreError::Configuration(_)));
        assert_matches!(
            config(&[("LEAD_SNAPSHOT_PAGE_SIZE", "0")]),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn missing_token_is_anonymous() {
        assert!(!config(&[]).unwrap().auth_context().is_authenticated());
    }
}
