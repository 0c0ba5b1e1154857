//! Configuration for the Rally client.
//!
//! Settings load through a `ConfigProvider`, with an environment-variable
//! implementation used by the service bootstrap. Credentials are an API key
//! (preferred) or a username/password pair for Basic auth.

use std::env;

use crate::error::{RallyError, Result};

/// Default WSAPI v2.0 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://rally1.rallydev.com/slm/webservice/v2.0";

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Source of string configuration values.
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value, if present.
    fn get_string(&self, key: &str) -> Option<String>;
}

/// Typed getters with defaults, available on every provider.
pub trait ConfigProviderExt: ConfigProvider {
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn get_u64_or(&self, key: &str, default: u64) -> u64 {
        self.get_string(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    fn get_u32_or(&self, key: &str, default: u32) -> u32 {
        self.get_string(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment-variable backed provider. Keys are uppercased and joined to
/// the namespace with `_`: `("RALLY", "api-key")` reads `RALLY_API_KEY`.
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    namespace: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }

    fn format_key(&self, key: &str) -> String {
        let normalized = key
            .to_uppercase()
            .replace(|c: char| !c.is_ascii_alphanumeric(), "_");
        match &self.namespace {
            Some(namespace) => format!("{namespace}_{normalized}"),
            None => normalized,
        }
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Option<String> {
        env::var(self.format_key(key)).ok().filter(|v| !v.is_empty())
    }
}

/// Connection settings for the Rally client.
#[derive(Debug, Clone)]
pub struct RallyConfig {
    /// WSAPI base URL, without a trailing slash.
    pub base_url: String,
    /// API key sent as the `ZSESSIONID` header.
    pub api_key: Option<String>,
    /// Username for Basic auth when no API key is configured.
    pub username: Option<String>,
    /// Password for Basic auth when no API key is configured.
    pub password: Option<String>,
    /// Default workspace ref attached to every request, when set.
    pub workspace: Option<String>,
    /// Default project ref attached to query requests, when set.
    pub project: Option<String>,
    /// Request timeout.
    pub timeout_seconds: u64,
    /// Default query page size.
    pub page_size: u32,
}

impl Default for RallyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            username: None,
            password: None,
            workspace: None,
            project: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl RallyConfig {
    /// Load settings from a provider, applying defaults for anything unset.
    pub fn from_provider(provider: &dyn ConfigProvider) -> Self {
        Self {
            base_url: provider
                .get_string_or("base-url", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: provider.get_string("api-key"),
            username: provider.get_string("username"),
            password: provider.get_string("password"),
            workspace: provider.get_string("workspace"),
            project: provider.get_string("project"),
            timeout_seconds: provider.get_u64_or("timeout-seconds", DEFAULT_TIMEOUT_SECONDS),
            page_size: provider.get_u32_or("page-size", DEFAULT_PAGE_SIZE),
        }
    }

    /// Load settings from `RALLY_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_provider(&EnvConfigProvider::with_namespace("RALLY"))
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| {
            RallyError::Configuration(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        let has_basic = self.username.is_some() && self.password.is_some();
        if self.api_key.is_none() && !has_basic {
            return Err(RallyError::Configuration(
                "either an API key or a username/password pair is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapProvider(HashMap<&'static str, &'static str>);

    impl ConfigProvider for MapProvider {
        fn get_string(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn provider_values_override_defaults() {
        let provider = MapProvider(HashMap::from([
            ("base-url", "https://rally.example.com/slm/webservice/v2.0/"),
            ("api-key", "_abc"),
            ("page-size", "50"),
        ]));
        let config = RallyConfig::from_provider(&provider);
        assert_eq!(config.base_url, "https://rally.example.com/slm/webservice/v2.0");
        assert_eq!(config.api_key.as_deref(), Some("_abc"));
        assert_eq!(config.page_size, 50);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let provider = MapProvider(HashMap::from([("timeout-seconds", "soon"), ("api-key", "_k")]));
        let config = RallyConfig::from_provider(&provider);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn credentials_are_required() {
        let config = RallyConfig::default();
        assert!(config.validate().is_err());

        let with_basic = RallyConfig {
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            ..RallyConfig::default()
        };
        assert!(with_basic.validate().is_ok());
    }

    #[test]
    fn env_keys_are_namespaced() {
        let provider = EnvConfigProvider::with_namespace("RALLY");
        assert_eq!(provider.format_key("api-key"), "RALLY_API_KEY");
        assert_eq!(provider.format_key("timeout-seconds"), "RALLY_TIMEOUT_SECONDS");
    }
}
