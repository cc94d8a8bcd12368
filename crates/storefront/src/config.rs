//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VENDORCART_TAX_RATES` - Per-vendor tax rates, e.g. `1=0.08,2=7.25%`
//!
//! ## Optional
//! - `VENDORCART_HOST` - Bind address (default: 127.0.0.1)
//! - `VENDORCART_PORT` - Listen port (default: 3000)
//! - `VENDORCART_DATA_DIR` - Local guest cart storage (default: ./data/carts)
//! - `VENDORCART_API_URL` - Server cart API base URL (default: <http://127.0.0.1:3000>)
//! - `VENDORCART_REQUEST_TIMEOUT_SECS` - Server cart request timeout (default: 10)
//! - `VENDORCART_CATALOG_PATH` - JSON product catalog served by the cart API
//! - `VENDORCART_CUSTOMER_TOKENS` - Access tokens accepted by the cart API, e.g. `tok_a=1,tok_b=2`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;
use vendorcart_core::{PricingCalculator, TaxRate, UserId, VendorId};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("No tax rate configured for vendor {0}")]
    TaxRateUnset(VendorId),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the cart API to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding guest cart snapshots
    pub data_dir: PathBuf,
    /// Per-vendor tax rates
    pub tax_rates: TaxTable,
    /// Server cart API client settings
    pub api: ServerApiConfig,
    /// Product catalog served by the cart API
    pub catalog_path: Option<PathBuf>,
    /// Access tokens the cart API accepts
    pub customer_tokens: CustomerTokens,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Server cart API client settings.
#[derive(Debug, Clone)]
pub struct ServerApiConfig {
    /// Base URL of the cart API
    pub base_url: Url,
    /// Per-request timeout; a timed-out request is reported, never retried
    pub request_timeout: Duration,
}

/// Tax rate per vendor.
///
/// This is the single authoritative tax source. A vendor without an entry has
/// no rate, and pricing its carts is a configuration error.
#[derive(Debug, Clone, Default)]
pub struct TaxTable {
    rates: HashMap<VendorId, TaxRate>,
}

impl TaxTable {
    /// Build from explicit entries.
    #[must_use]
    pub fn new(rates: impl IntoIterator<Item = (VendorId, TaxRate)>) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }

    /// Parse `vendor=rate` pairs separated by commas.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnvVar` naming `var_name` if a pair is malformed.
    pub fn parse(raw: &str, var_name: &str) -> Result<Self, ConfigError> {
        let invalid = |msg: String| ConfigError::InvalidEnvVar(var_name.to_string(), msg);
        let mut rates = HashMap::new();
        for (vendor, rate) in parse_pairs(raw).map_err(&invalid)? {
            let vendor = vendor
                .parse::<VendorId>()
                .map_err(|e| invalid(format!("vendor id '{vendor}': {e}")))?;
            let rate = rate
                .parse::<TaxRate>()
                .map_err(|e| invalid(format!("vendor {vendor}: {e}")))?;
            rates.insert(vendor, rate);
        }
        Ok(Self { rates })
    }

    /// Rate configured for `vendor_id`.
    #[must_use]
    pub fn rate(&self, vendor_id: VendorId) -> Option<TaxRate> {
        self.rates.get(&vendor_id).copied()
    }

    /// Pricing calculator for `vendor_id`.
    ///
    /// # Errors
    ///
    /// Returns `TaxRateUnset` if the vendor has no configured rate.
    pub fn calculator(&self, vendor_id: VendorId) -> Result<PricingCalculator, ConfigError> {
        self.rate(vendor_id)
            .map(PricingCalculator::new)
            .ok_or(ConfigError::TaxRateUnset(vendor_id))
    }
}

/// Access tokens accepted by the cart API, mapped to customers.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone, Default)]
pub struct CustomerTokens {
    tokens: Vec<(SecretString, UserId)>,
}

impl CustomerTokens {
    /// Build from explicit entries. A repeated token keeps its last customer.
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = (SecretString, UserId)>) -> Self {
        let mut this = Self::default();
        for (token, user) in tokens {
            this.insert(token, user);
        }
        this
    }

    /// Parse `token=user_id` pairs separated by commas.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnvVar` naming `var_name` if a pair is malformed.
    pub fn parse(raw: &str, var_name: &str) -> Result<Self, ConfigError> {
        let invalid = |msg: String| ConfigError::InvalidEnvVar(var_name.to_string(), msg);
        let mut tokens = Self::default();
        for (token, user) in parse_pairs(raw).map_err(&invalid)? {
            let user = user
                .parse::<UserId>()
                .map_err(|e| invalid(format!("user id '{user}': {e}")))?;
            tokens.insert(SecretString::from(token.to_string()), user);
        }
        Ok(tokens)
    }

    /// Customer the token was issued to.
    #[must_use]
    pub fn user_for(&self, token: &str) -> Option<UserId> {
        self.tokens
            .iter()
            .find(|(secret, _)| secret.expose_secret() == token)
            .map(|(_, user)| *user)
    }

    fn insert(&mut self, token: SecretString, user: UserId) {
        self.tokens
            .retain(|(secret, _)| secret.expose_secret() != token.expose_secret());
        self.tokens.push((token, user));
    }

    /// Number of configured tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if no tokens are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl std::fmt::Debug for CustomerTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerTokens")
            .field("count", &self.tokens.len())
            .field("tokens", &"[REDACTED]")
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
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("VENDORCART_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("VENDORCART_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("VENDORCART_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("VENDORCART_PORT".to_string(), e.to_string())
            })?;
        let data_dir = PathBuf::from(get_env_or_default("VENDORCART_DATA_DIR", "./data/carts"));
        let tax_rates = TaxTable::parse(
            &get_required_env("VENDORCART_TAX_RATES")?,
            "VENDORCART_TAX_RATES",
        )?;
        let api = ServerApiConfig::from_env()?;
        let catalog_path = get_optional_env("VENDORCART_CATALOG_PATH").map(PathBuf::from);
        let customer_tokens = get_optional_env("VENDORCART_CUSTOMER_TOKENS")
            .map(|raw| CustomerTokens::parse(&raw, "VENDORCART_CUSTOMER_TOKENS"))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            data_dir,
            tax_rates,
            api,
            catalog_path,
            customer_tokens,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ServerApiConfig {
    /// Load the server API settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_env_or_default("VENDORCART_API_URL", "http://127.0.0.1:3000")
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("VENDORCART_API_URL".to_string(), e.to_string())
            })?;
        let timeout_secs = get_env_or_default("VENDORCART_REQUEST_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "VENDORCART_REQUEST_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?;
        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Split `a=b,c=d` into trimmed pairs. Empty segments are skipped.
fn parse_pairs(raw: &str) -> Result<Vec<(&str, &str)>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .filter(|(k, v)| !k.is_empty() && !v.is_empty())
                .ok_or_else(|| format!("expected key=value, got '{segment}'"))
        })
        .collect()
}
