//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BRANA_SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//! - `BRANA_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; not needed when `BRANA_STORAGE=memory`)
//!
//! ## Optional
//! - `BRANA_HOST` - Bind address (default: 127.0.0.1)
//! - `BRANA_PORT` - Listen port (default: 3000)
//! - `BRANA_BASE_URL` - Public URL (default: `http://{host}:{port}`)
//! - `BRANA_STORAGE` - `postgres` (default) or `memory`
//! - `BRANA_DEFAULT_LOCALE` - `en` (default) or `am`
//! - `BRANA_CURRENCY` - ISO code (default: ETB)
//! - `BRANA_TAX_RATE` - Fraction of subtotal (default: 0.15)
//! - `BRANA_SHIPPING_FLAT` - Flat shipping fee (default: 150)
//! - `BRANA_FREE_SHIPPING_OVER` - Free-shipping threshold, `none` to disable (default: 2000)
//! - `BRANA_RATE_LIMIT` - Rate limit auth and form routes (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use brana_core::{CurrencyCode, Locale, PricingPolicy};

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Where carts, accounts and orders are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process memory; everything is lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Storage backend
    pub storage: StorageBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session secret
    pub session_secret: SecretString,
    /// Locale used when neither `lang` nor `Accept-Language` decide
    pub default_locale: Locale,
    /// Checkout pricing rules
    pub pricing: PricingPolicy,
    /// Whether auth and form routes are rate limited
    pub rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
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
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage: StorageBackend = parse_env_or_default("BRANA_STORAGE", "postgres")?;
        let database_url = get_database_url("BRANA_DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("BRANA_DATABASE_URL".to_string()));
        }

        let host: IpAddr = parse_env_or_default("BRANA_HOST", "127.0.0.1")?;
        let port: u16 = parse_env_or_default("BRANA_PORT", "3000")?;
        let base_url = get_optional_env("BRANA_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        let base_url = validate_base_url(base_url)?;

        let session_secret = get_validated_secret("BRANA_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "BRANA_SESSION_SECRET")?;

        let default_locale: Locale = parse_env_or_default("BRANA_DEFAULT_LOCALE", "en")?;
        let pricing = pricing_from_env()?;
        let rate_limit: bool = parse_env_or_default("BRANA_RATE_LIMIT", "true")?;

        Ok(Self {
            database_url,
            storage,
            host,
            port,
            base_url,
            session_secret,
            default_locale,
            pricing,
            rate_limit,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for in-process use (tests, local tooling): memory
    /// storage, no rate limiting, default pricing.
    #[must_use]
    pub fn in_memory(session_secret: SecretString) -> Self {
        Self {
            database_url: None,
            storage: StorageBackend::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            session_secret,
            default_locale: Locale::En,
            pricing: PricingPolicy::default(),
            rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn pricing_from_env() -> Result<PricingPolicy, ConfigError> {
    let defaults = PricingPolicy::default();

    let currency = get_optional_env("BRANA_CURRENCY")
        .map(|raw| {
            raw.parse::<CurrencyCode>()
                .map_err(|e| ConfigError::InvalidEnvVar("BRANA_CURRENCY".to_string(), e))
        })
        .transpose()?
        .unwrap_or(defaults.currency);
    let tax_rate = parse_decimal("BRANA_TAX_RATE")?.unwrap_or(defaults.tax_rate);
    if tax_rate.is_sign_negative() || tax_rate >= Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "BRANA_TAX_RATE".to_string(),
            "must be a fraction in [0, 1)".to_string(),
        ));
    }
    let shipping_flat = parse_decimal("BRANA_SHIPPING_FLAT")?.unwrap_or(defaults.shipping_flat);
    let free_shipping_over = match get_optional_env("BRANA_FREE_SHIPPING_OVER") {
        Some(raw) if raw.eq_ignore_ascii_case("none") => None,
        Some(_) => parse_decimal("BRANA_FREE_SHIPPING_OVER")?,
        None => defaults.free_shipping_over,
    };

    Ok(PricingPolicy {
        currency,
        tax_rate,
        shipping_flat,
        free_shipping_over,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to a default string.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .as_deref()
        .unwrap_or(default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_decimal(key: &str) -> Result<Option<Decimal>, ConfigError> {
    get_optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<Decimal>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

fn validate_base_url(raw: String) -> Result<String, ConfigError> {
    url::Url::parse(&raw)
        .map_err(|e| ConfigError::InvalidEnvVar("BRANA_BASE_URL".to_string(), e.to_string()))?;
    Ok(raw.trim_end_matches('/').to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
