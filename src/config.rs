//! Editor configuration resolved from the process environment.

use std::time::Duration;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "API_KEY";
/// Fallback environment variable for the API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Overrides the model identifier.
pub const MODEL_ENV: &str = "PRODUCTLENS_MODEL";
/// Overrides the API base URL.
pub const BASE_URL_ENV: &str = "PRODUCTLENS_BASE_URL";
/// Overrides the request timeout, in whole seconds.
pub const TIMEOUT_ENV: &str = "PRODUCTLENS_TIMEOUT_SECS";

/// Default Gemini model used for edits.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
/// Default Generative Language API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for the edit adapter.
///
/// A missing API key is not an error here: it is reported when the first edit
/// is attempted.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Static API key, if one was found.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// API base URL, without trailing slash.
    pub base_url: String,
    /// Upper bound on a single request.
    pub timeout: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl EditorConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = non_empty(API_KEY_ENV).or_else(|| non_empty(GOOGLE_API_KEY_ENV));
        if api_key.is_none() {
            tracing::warn!(
                "{API_KEY_ENV} is missing from environment variables; edits will fail until one is provided"
            );
        }

        let mut config = Self {
            api_key,
            ..Self::default()
        };

        if let Some(model) = non_empty(MODEL_ENV) {
            config.model = model;
        }
        if let Some(url) = non_empty(BASE_URL_ENV) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = non_empty(TIMEOUT_ENV) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "ignoring invalid {TIMEOUT_ENV}"),
            }
        }

        config
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// True if an API key is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = EditorConfig::from_lookup(lookup(&[]));
        assert!(config.api_key.is_none());
        assert!(!config.has_credential());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_api_key_takes_precedence() {
        let config = EditorConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "primary"),
            (GOOGLE_API_KEY_ENV, "fallback"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_google_api_key_fallback_and_blank_values() {
        let config = EditorConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "   "),
            (GOOGLE_API_KEY_ENV, "fallback"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_overrides() {
        let config = EditorConfig::from_lookup(lookup(&[
            (MODEL_ENV, "nano-banana-pro-preview"),
            (BASE_URL_ENV, "http://localhost:8080/"),
            (TIMEOUT_ENV, "30"),
        ]));
        assert_eq!(config.model, "nano-banana-pro-preview");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        for raw in ["0", "soon", "-5"] {
            let config = EditorConfig::from_lookup(lookup(&[(TIMEOUT_ENV, raw)]));
            assert_eq!(config.timeout, DEFAULT_TIMEOUT, "{raw}");
        }
    }

    #[test]
    fn test_builder_methods() {
        let config = EditorConfig::default()
            .with_api_key("k")
            .with_model("m")
            .with_base_url("https://example.test/")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.model, "m");
        assert_eq!(config.base_url, "https://example.test");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
