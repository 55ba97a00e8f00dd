//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORIGAMI_DATABASE_URL` - `PostgreSQL` connection string for the session
//!   store (falls back to `DATABASE_URL`)
//! - `ORIGAMI_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `ORIGAMI_HOST` - Bind address (default: 127.0.0.1)
//! - `ORIGAMI_PORT` - Listen port (default: 3000)
//! - `ORIGAMI_API_URL` - Shop REST API base URL (default: <http://localhost:8000/api>)
//! - `API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `LOYALTY_DISCOUNT_RATE` - Discount for loyalty members, 0..=1 (default: 0.10)
//! - `SEARCH_DEBOUNCE_MS` - Search box debounce (default: 300)
//! - `PRODUCTS_PER_PAGE` - Catalogue page size, 1..=50 (default: 12)
//! - `NEQUI_ACCOUNT_NAME`, `NEQUI_ACCOUNT_NUMBER`, `NEQUI_WHATSAPP` - Nequi
//!   transfer instructions shown at checkout
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use origami_core::DiscountRate;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Largest page the backend will serve.
pub const MAX_PRODUCTS_PER_PAGE: u32 = 50;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shop REST API configuration
    pub api: ApiConfig,
    /// Catalogue and cart behaviour
    pub shop: ShopConfig,
    /// Payment instructions shown at checkout
    pub payment: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Shop REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to, e.g. `http://localhost:8000/api`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Catalogue and cart behaviour.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Discount applied to loyalty members' carts
    pub loyalty_discount: DiscountRate,
    /// Delay after the last keystroke before the search box fires
    pub search_debounce_ms: u32,
    /// Products per catalogue page
    pub products_per_page: u32,
}

/// Nequi transfer instructions.
#[derive(Debug, Clone, Default)]
pub struct PaymentConfig {
    pub nequi_account_name: Option<String>,
    pub nequi_account_number: Option<String>,
    pub nequi_whatsapp: Option<String>,
}

impl PaymentConfig {
    fn from_env() -> Self {
        Self {
            nequi_account_name: get_optional_env("NEQUI_ACCOUNT_NAME"),
            nequi_account_number: get_optional_env("NEQUI_ACCOUNT_NUMBER"),
            nequi_whatsapp: get_optional_env("NEQUI_WHATSAPP"),
        }
    }

    /// Whether any Nequi detail is configured.
    #[must_use]
    pub const fn has_nequi_details(&self) -> bool {
        self.nequi_account_name.is_some()
            || self.nequi_account_number.is_some()
            || self.nequi_whatsapp.is_some()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ORIGAMI_DATABASE_URL")?;
        let host = parse_env("ORIGAMI_HOST", "127.0.0.1")?;
        let port = parse_env("ORIGAMI_PORT", "3000")?;
        let base_url = get_required_env("ORIGAMI_BASE_URL")?;

        let api = ApiConfig::from_env()?;
        let shop = ShopConfig::from_env()?;
        let payment = PaymentConfig::from_env();

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            api,
            shop,
            payment,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn uses_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ApiConfig {
    /// Load the backend settings on their own, for tools that only talk to the API.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL or timeout cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_env_or_default("ORIGAMI_API_URL", "http://localhost:8000/api");
        let base_url = parse_base_url(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ORIGAMI_API_URL".to_string(), e))?;
        let timeout_secs: u64 = parse_env("API_TIMEOUT_SECS", "10")?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl ShopConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let loyalty_discount = parse_env("LOYALTY_DISCOUNT_RATE", "0.10")?;
        let search_debounce_ms = parse_env("SEARCH_DEBOUNCE_MS", "300")?;
        let products_per_page: u32 = parse_env("PRODUCTS_PER_PAGE", "12")?;

        if !(1..=MAX_PRODUCTS_PER_PAGE).contains(&products_per_page) {
            return Err(ConfigError::InvalidEnvVar(
                "PRODUCTS_PER_PAGE".to_string(),
                format!("must be between 1 and {MAX_PRODUCTS_PER_PAGE}"),
            ));
        }

        Ok(Self {
            loyalty_discount,
            search_debounce_ms,
            products_per_page,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an API base URL, making sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("must be an absolute http(s) URL".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
