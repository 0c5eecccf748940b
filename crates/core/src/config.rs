//! TOML-based configuration for MergeSense.
//!
//! The webhook API key is never stored in the file: `api_key_env` names an
//! environment variable and the secret is resolved at runtime via
//! [`AppConfig::resolve_env_vars`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::response::{NormalizerOptions, ResponseNormalizer, DEFAULT_HIGH_CONFIDENCE_THRESHOLD};

/// Commented starter configuration written by `mergesense init`.
pub const CONFIG_TEMPLATE: &str = r#"# MergeSense configuration

[webhook]
# Workflow endpoint that resolves conflicts. When empty, the URL is read
# from the environment variable named by url_env.
url = "http://localhost:5678/webhook/git/conflict/resolve"
url_env = "N8N_WEBHOOK_URL"
# Environment variable holding an optional bearer API key.
api_key_env = "MERGESENSE_API_KEY"
timeout_ms = 30000

[resolver]
# Confidence at or above which a merge is reported as success.
high_confidence_threshold = 0.8
# Apply high-confidence merges without asking.
auto_apply = false

[web]
listen = "127.0.0.1:3000"

[logging]
level = "info"
"#;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// AI workflow endpoint settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Status determination and apply behaviour.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Web API settings.
    #[serde(default)]
    pub web: WebConfig,

    /// Log filter settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

/// AI workflow endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL. Falls back to the `url_env` variable when empty.
    #[serde(default)]
    pub url: String,

    /// Environment variable consulted when `url` is empty.
    #[serde(default = "default_url_env")]
    pub url_env: String,

    /// Environment variable holding the bearer API key.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Resolved API key (populated by `resolve_env_vars` or an override).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_url_env() -> String {
    "N8N_WEBHOOK_URL".into()
}
fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            url_env: default_url_env(),
            api_key_env: None,
            timeout_ms: default_timeout_ms(),
            api_key: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Status determination and apply behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Boundary between `low_confidence` and `success`.
    #[serde(default = "default_threshold")]
    pub high_confidence_threshold: f64,

    /// Apply merges that pass the auto-apply gate without prompting.
    #[serde(default)]
    pub auto_apply: bool,
}

fn default_threshold() -> f64 {
    DEFAULT_HIGH_CONFIDENCE_THRESHOLD
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            high_confidence_threshold: default_threshold(),
            auto_apply: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Web & logging
// ---------------------------------------------------------------------------

/// Web API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Listen address (default `127.0.0.1:3000`).
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "127.0.0.1:3000".into()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub webhook_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Like [`load_from_file`](Self::load_from_file), but a missing file
    /// yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load_from_file(path) {
            Err(ConfigError::FileNotFound(path)) => {
                debug!(path, "no configuration file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Resolve the webhook URL and API key from the environment.
    ///
    /// Missing variables log a warning but do not fail; [`validate`](Self::validate)
    /// decides what is required.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");

        if self.webhook.url.trim().is_empty() && !self.webhook.url_env.is_empty() {
            if let Some(url) = resolve_optional_env(&self.webhook.url_env, "webhook.url_env") {
                self.webhook.url = url;
            }
        }

        if self.webhook.api_key.is_none() {
            if let Some(ref env_name) = self.webhook.api_key_env {
                self.webhook.api_key = resolve_optional_env(env_name, "webhook.api_key_env");
            }
        }

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Apply command-line overrides on top of the file values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref url) = overrides.webhook_url {
            debug!("webhook url overridden");
            self.webhook.url = url.clone();
        }
        if let Some(ref key) = overrides.api_key {
            debug!("webhook api key overridden");
            self.webhook.api_key = Some(key.clone());
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            debug!(timeout_ms, "webhook timeout overridden");
            self.webhook.timeout_ms = timeout_ms;
        }
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.webhook.url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "webhook.url".into(),
                detail: format!(
                    "webhook URL is not configured; set webhook.url or the {} environment variable",
                    self.webhook.url_env
                ),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "webhook.url".into(),
                detail: "webhook URL must start with http:// or https://".into(),
            });
        }
        if self.webhook.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "webhook.timeout_ms".into(),
                detail: "timeout must be > 0".into(),
            });
        }
        let threshold = self.resolver.high_confidence_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "resolver.high_confidence_threshold".into(),
                detail: format!("threshold must be in (0, 1], got {}", threshold),
            });
        }
        if self.web.listen.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "web.listen".into(),
                detail: "listen address must not be empty".into(),
            });
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Normalizer configured with this file's threshold.
    pub fn normalizer(&self) -> ResponseNormalizer {
        ResponseNormalizer::new(NormalizerOptions {
            high_confidence_threshold: self.resolver.high_confidence_threshold,
        })
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.trim().is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val.trim().to_string())
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[webhook]
url = "https://n8n.example.com/webhook/merge"
api_key_env = "MS_TEST_KEY_UNUSED"
timeout_ms = 5000

[resolver]
high_confidence_threshold = 0.75
auto_apply = true

[web]
listen = "0.0.0.0:8080"

[logging]
level = "debug"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.webhook.url, "https://n8n.example.com/webhook/merge");
        assert_eq!(config.webhook.timeout_ms, 5000);
        assert_eq!(config.resolver.high_confidence_threshold, 0.75);
        assert!(config.resolver.auto_apply);
        assert_eq!(config.web.listen, "0.0.0.0:8080");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.normalizer().options().high_confidence_threshold, 0.75);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

        let config = AppConfig::load_or_default("/nonexistent/config.toml").unwrap();
        assert_eq!(config.webhook.timeout_ms, 30_000);
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[webhook\nurl = ").unwrap();
        let result = AppConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_template_parses_and_validates() {
        let config: AppConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.webhook.url_env, "N8N_WEBHOOK_URL");
        assert_eq!(
            config.webhook.api_key_env.as_deref(),
            Some("MERGESENSE_API_KEY")
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let config = AppConfig::default();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "webhook.url"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.webhook.url = "ftp://example.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            config.resolver.high_confidence_threshold = bad;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { ref field, .. })
                    if field == "resolver.high_confidence_threshold"
            ));
        }
        config.resolver.high_confidence_threshold = 1.0;
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.webhook.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("MS_TEST_WEBHOOK_URL", "http://localhost:9999/hook");
        std::env::set_var("MS_TEST_API_KEY", "  sk-abc  ");

        let toml_str = r#"
[webhook]
url_env = "MS_TEST_WEBHOOK_URL"
api_key_env = "MS_TEST_API_KEY"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();

        assert_eq!(config.webhook.url, "http://localhost:9999/hook");
        assert_eq!(config.webhook.api_key.as_deref(), Some("sk-abc"));
        config.validate().unwrap();

        // Clean up
        std::env::remove_var("MS_TEST_WEBHOOK_URL");
        std::env::remove_var("MS_TEST_API_KEY");
    }

    #[test]
    fn test_file_url_wins_over_env() {
        std::env::set_var("MS_TEST_SHADOWED_URL", "http://env.example.com");
        let toml_str = r#"
[webhook]
url = "http://file.example.com"
url_env = "MS_TEST_SHADOWED_URL"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();
        assert_eq!(config.webhook.url, "http://file.example.com");
        std::env::remove_var("MS_TEST_SHADOWED_URL");
    }

    #[test]
    fn test_overrides() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.apply_overrides(&ConfigOverrides {
            webhook_url: Some("http://127.0.0.1:1/x".into()),
            api_key: Some("k".into()),
            timeout_ms: Some(10),
        });
        assert_eq!(config.webhook.url, "http://127.0.0.1:1/x");
        assert_eq!(config.webhook.api_key.as_deref(), Some("k"));
        assert_eq!(config.webhook.timeout_ms, 10);
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.webhook.url, "");
        assert_eq!(config.webhook.url_env, "N8N_WEBHOOK_URL");
        assert_eq!(config.webhook.timeout_ms, 30_000);
        assert_eq!(config.resolver.high_confidence_threshold, 0.8);
        assert!(!config.resolver.auto_apply);
        assert_eq!(config.web.listen, "127.0.0.1:3000");
        assert_eq!(config.logging.level, "info");
    }
}
