//! Provider configuration.
//!
//! Configuration is fixed at construction time. It can be built in code
//! with [`ProviderConfig::builder`] or loaded from `SIMPLE_AUTH_*`
//! environment variables with [`ProviderConfig::from_env`].

use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use simple_auth_core::AuthError;
use simple_auth_transport::RetryPolicy;
use std::time::Duration;

/// Configuration for the simple auth provider.
///
/// Zero values for `timeout_ms`, `retries`, and `backoff_ms` mean "use the
/// default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Endpoint for credential-based login.
    auth_url: String,
    /// Endpoint for token-based session checks. Defaults to `auth_url`.
    #[serde(default)]
    check_url: Option<String>,
    /// Response key holding the user record.
    #[serde(default = "default_user_key")]
    user_key: String,
    /// Response key holding the session token.
    #[serde(default = "default_token_key")]
    token_key: String,
    /// Storage key for the cached token.
    #[serde(default = "default_token_cache_key")]
    token_cache_key: String,
    /// Per-attempt request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    /// Total attempts per request.
    #[serde(default = "default_retries")]
    retries: u32,
    /// Delay before the first retry in milliseconds; doubles per retry.
    #[serde(default = "default_backoff_ms")]
    backoff_ms: u64,
}

fn default_user_key() -> String {
    "user".to_string()
}

fn default_token_key() -> String {
    "token".to_string()
}

fn default_token_cache_key() -> String {
    "rb-auth-token".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_retries() -> u32 {
    RetryPolicy::DEFAULT_RETRIES
}

fn default_backoff_ms() -> u64 {
    300
}

impl ProviderConfig {
    /// Creates a configuration with defaults for every optional field.
    #[must_use]
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            check_url: None,
            user_key: default_user_key(),
            token_key: default_token_key(),
            token_cache_key: default_token_cache_key(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(auth_url: impl Into<String>) -> ProviderConfigBuilder {
        ProviderConfigBuilder::new(auth_url)
    }

    /// Loads configuration from `SIMPLE_AUTH_*` environment variables,
    /// e.g. `SIMPLE_AUTH_AUTH_URL`, `SIMPLE_AUTH_RETRIES`.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("SIMPLE_AUTH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Checks that the configuration can drive a provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if a URL or key is empty.
    pub fn validate(&self) -> Result<(), Report<AuthError>> {
        let required = [
            ("auth_url", self.auth_url.as_str()),
            ("user_key", self.user_key.as_str()),
            ("token_key", self.token_key.as_str()),
            ("token_cache_key", self.token_cache_key.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AuthError::Configuration {
                    reason: format!("{name} must not be empty"),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Returns the login endpoint.
    #[must_use]
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Returns the session-check endpoint, falling back to the login endpoint.
    #[must_use]
    pub fn check_url(&self) -> &str {
        self.check_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(self.auth_url.as_str())
    }

    /// Returns the response key holding the user record.
    #[must_use]
    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    /// Returns the response key holding the session token.
    #[must_use]
    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    /// Returns the storage key for the cached token.
    #[must_use]
    pub fn token_cache_key(&self) -> &str {
        &self.token_cache_key
    }

    /// Returns the per-attempt request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(non_zero_or(self.timeout_ms, default_timeout_ms()))
    }

    /// Returns the total number of attempts per request.
    #[must_use]
    pub fn retries(&self) -> u32 {
        if self.retries == 0 {
            default_retries()
        } else {
            self.retries
        }
    }

    /// Returns the delay before the first retry.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(non_zero_or(self.backoff_ms, default_backoff_ms()))
    }

    /// Returns the retry policy for auth requests.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries(), self.backoff())
    }
}

fn non_zero_or(value: u64, default: u64) -> u64 {
    if value == 0 { default } else { value }
}

/// Builder for `ProviderConfig`.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    /// Creates a builder with defaults for every optional field.
    #[must_use]
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            config: ProviderConfig::new(auth_url),
        }
    }

    /// Sets the session-check endpoint.
    #[must_use]
    pub fn check_url(mut self, check_url: impl Into<String>) -> Self {
        self.config.check_url = Some(check_url.into());
        self
    }

    /// Sets the response key holding the user record.
    #[must_use]
    pub fn user_key(mut self, user_key: impl Into<String>) -> Self {
        self.config.user_key = user_key.into();
        self
    }

    /// Sets the response key holding the session token.
    #[must_use]
    pub fn token_key(mut self, token_key: impl Into<String>) -> Self {
        self.config.token_key = token_key.into();
        self
    }

    /// Sets the storage key for the cached token.
    #[must_use]
    pub fn token_cache_key(mut self, token_cache_key: impl Into<String>) -> Self {
        self.config.token_cache_key = token_cache_key.into();
        self
    }

    /// Sets the per-attempt request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the total number of attempts per request.
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.config.backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ProviderConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProviderConfig::new("https://api.example.com/auth");
        assert_eq!(config.check_url(), "https://api.example.com/auth");
        assert_eq!(config.user_key(), "user");
        assert_eq!(config.token_key(), "token");
        assert_eq!(config.token_cache_key(), "rb-auth-token");
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(config.retries(), 3);
        assert_eq!(config.backoff(), Duration::from_millis(300));
    }

    #[test]
    fn builder_overrides() {
        let config = ProviderConfig::builder("https://api.example.com/login")
            .check_url("https://api.example.com/me")
            .token_key("access_token")
            .retries(5)
            .backoff(Duration::from_millis(100))
            .timeout(Duration::from_secs(2))
            .build();

        assert_eq!(config.check_url(), "https://api.example.com/me");
        assert_eq!(config.token_key(), "access_token");
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(5, Duration::from_millis(100))
        );
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let config = ProviderConfig::builder("https://api.example.com/auth")
            .retries(0)
            .backoff(Duration::ZERO)
            .timeout(Duration::ZERO)
            .build();

        assert_eq!(config.retries(), 3);
        assert_eq!(config.backoff(), Duration::from_millis(300));
        assert_eq!(config.timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn empty_check_url_falls_back() {
        let config = ProviderConfig::builder("https://api.example.com/auth")
            .check_url("")
            .build();
        assert_eq!(config.check_url(), "https://api.example.com/auth");
    }

    #[test]
    fn deserialize_applies_defaults() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"auth_url": "https://api.example.com/auth", "retries": 4}"#)
                .expect("deserialize");
        assert_eq!(config.retries(), 4);
        assert_eq!(config.token_cache_key(), "rb-auth-token");
        assert_eq!(config.check_url(), "https://api.example.com/auth");
    }

    #[test]
    fn config_crate_source_deserializes() {
        let config: ProviderConfig = config::Config::builder()
            .set_override("auth_url", "https://api.example.com/auth")
            .expect("override")
            .set_override("check_url", "https://api.example.com/check")
            .expect("override")
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize");

        assert_eq!(config.check_url(), "https://api.example.com/check");
        assert_eq!(config.retries(), 3);
    }

    #[test]
    fn validate_rejects_empty_urls_and_keys() {
        assert!(ProviderConfig::new("https://api.example.com/auth").validate().is_ok());

        let err = ProviderConfig::new("  ").validate().expect_err("empty url");
        assert!(matches!(
            err.current_context(),
            AuthError::Configuration { reason } if reason.contains("auth_url")
        ));

        let err = ProviderConfig::builder("https://api.example.com/auth")
            .token_cache_key("")
            .build()
            .validate()
            .expect_err("empty key");
        assert!(matches!(err.current_context(), AuthError::Configuration { .. }));
    }
}
