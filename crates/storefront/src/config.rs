//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_ADMIN_EMAILS` - Comma-separated emails allowed to administer the store
//! - `OPENAI_API_KEY` - Chat completion API key (chat assistant disabled when unset)
//! - `OPENAI_API_BASE_URL` - Chat completion API origin (default: <https://api.openai.com>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use harbor_core::Email;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default origin of the chat completion API.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Accounts that pass the admin check
    pub admin_emails: Vec<Email>,
    /// Chat completion API configuration (`None` disables the assistant)
    pub openai: Option<OpenAIConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Chat completion API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OpenAIConfig {
    /// API key sent as a bearer token
    pub api_key: SecretString,
    /// API origin; the completion path is appended to it
    pub base_url: String,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env
            .or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string()))?;
        let base_url = Url::parse(&env.required("STOREFRONT_BASE_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let admin_emails = parse_admin_emails(env.optional("STOREFRONT_ADMIN_EMAILS").as_deref())?;
        let openai = OpenAIConfig::from_env(&env)?;

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            admin_emails,
            openai,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl OpenAIConfig {
    /// Returns `None` if `OPENAI_API_KEY` is not set (chat assistant disabled).
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(key) = env.optional("OPENAI_API_KEY") else {
            return Ok(None);
        };
        if let Err(e) = validate_secret_strength(&key, "OPENAI_API_KEY") {
            tracing::warn!("OPENAI_API_KEY validation warning: {e}");
        }

        let base_url = env.or_default("OPENAI_API_BASE_URL", DEFAULT_OPENAI_BASE_URL);
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("OPENAI_API_BASE_URL".to_string(), e.to_string())
        })?;

        Ok(Some(Self {
            api_key: SecretString::from(key),
            base_url: base_url.trim_end_matches('/').to_string(),
        }))
    }
}

/// Environment lookup with the error conventions used above.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse the comma-separated admin allowlist.
fn parse_admin_emails(raw: Option<&str>) -> Result<Vec<Email>, ConfigError> {
    raw.unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            Email::parse(s).map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_ADMIN_EMAILS".to_string(), e.to_string())
            })
        })
        .collect()
}

fn insecure(var_name: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InsecureSecret(var_name.to_string(), reason.into())
}

/// Shannon entropy of `s`, in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    s.chars().for_each(|c| *counts.entry(c).or_default() += 1);

    let total = counts.values().sum::<u32>();
    if total == 0 {
        return 0.0;
    }

    counts
        .values()
        .map(|&n| f64::from(n) / f64::from(total))
        .map(|p| -p * p.log2())
        .sum()
}

/// Reject placeholder values and low-entropy strings.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(insecure(
            var_name,
            format!("looks like a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(insecure(
            var_name,
            format!(
                "entropy is {entropy:.2} bits/char, at least {MIN_ENTROPY_BITS_PER_CHAR:.1} required; generate it randomly"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![("STOREFRONT_BASE_URL", "http://localhost:3000")]
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load(&minimal()).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.admin_emails.is_empty());
        assert!(config.openai.is_none());
        assert!(config.sentry_dsn.is_none());
        assert!(!config.is_secure());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[("STOREFRONT_PORT", "3000")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "STOREFRONT_BASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = minimal();
        vars.push(("STOREFRONT_PORT", "not-a-port"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_base_url_is_the_only_required_variable() {
        let config = load(&[("STOREFRONT_BASE_URL", "https://shop.test")]).unwrap();
        assert!(config.is_secure());
    }

    #[test]
    fn test_weak_openai_key_still_loads() {
        let mut vars = minimal();
        vars.push(("OPENAI_API_KEY", "changeme"));
        assert!(load(&vars).unwrap().openai.is_some());
    }

    #[test]
    fn test_secret_strength_checks() {
        assert!(matches!(
            validate_secret_strength("changeme-changeme-changeme", "KEY"),
            Err(ConfigError::InsecureSecret(key, _)) if key == "KEY"
        ));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaa", "KEY").is_err());
        assert!(validate_secret_strength("sk-9fQ2mZ7xL1pV4kR8tW3yB6nC0dH5jG", "KEY").is_ok());
    }

    #[test]
    fn test_openai_config_loaded_when_key_present() {
        let mut vars = minimal();
        vars.push(("OPENAI_API_KEY", "sk-9fQ2mZ7xL1pV4kR8tW3yB6nC0dH5jG"));
        vars.push(("OPENAI_API_BASE_URL", "http://127.0.0.1:9999/"));
        let config = load(&vars).unwrap();

        let openai = config.openai.unwrap();
        assert_eq!(openai.base_url, "http://127.0.0.1:9999");
        assert_eq!(
            openai.api_key.expose_secret(),
            "sk-9fQ2mZ7xL1pV4kR8tW3yB6nC0dH5jG"
        );
    }

    #[test]
    fn test_blank_openai_key_disables_chat() {
        let mut vars = minimal();
        vars.push(("OPENAI_API_KEY", "   "));
        assert!(load(&vars).unwrap().openai.is_none());
    }

    #[test]
    fn test_openai_debug_redacts_key() {
        let config = OpenAIConfig {
            api_key: SecretString::from("sk-super-secret-value"),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("api.openai.com"));
        assert!(!debug_output.contains("sk-super-secret-value"));
    }

    #[test]
    fn test_admin_emails_parsed() {
        let mut vars = minimal();
        vars.push(("STOREFRONT_ADMIN_EMAILS", "owner@shop.test, ops@shop.test,"));
        let config = load(&vars).unwrap();
        let emails: Vec<&str> = config.admin_emails.iter().map(Email::as_str).collect();
        assert_eq!(emails, ["owner@shop.test", "ops@shop.test"]);
    }

    #[test]
    fn test_admin_emails_invalid_entry() {
        let mut vars = minimal();
        vars.push(("STOREFRONT_ADMIN_EMAILS", "owner@shop.test,nobody"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }
}
