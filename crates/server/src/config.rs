//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COD_DATABASE_URL` - `PostgreSQL` connection string (or `DATABASE_URL`;
//!   not needed with `COD_CREDENTIAL_STORE=memory`)
//! - `SHOPIFY_API_KEY` - Shopify app client ID
//! - `SHOPIFY_API_SECRET` - Shopify app client secret (HIGH PRIVILEGE)
//! - `SHOPIFY_REDIRECT_URI` - OAuth callback URL registered with the app
//!
//! ## Optional
//! - `COD_HOST` - Bind address (default: 0.0.0.0)
//! - `COD_PORT` - Listen port (default: 5000)
//! - `COD_CREDENTIAL_STORE` - `postgres` (default) or `memory`
//! - `COD_ORDER_API` - `rest` (default) or `graphql` order-creation path
//! - `COD_EMAIL_DOMAIN` - Domain for synthesized placeholder emails
//!   (default: codorder.local)
//! - `COD_COUNTRY` - Merchant operating country for order addresses
//!   (default: India)
//! - `SHOPIFY_SCOPES` - OAuth scopes (default: write_orders,write_customers,write_draft_orders)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2024-04)
//! - `SHOPIFY_API_BASE` - Override for the per-shop `https://{shop}` base URL
//! - `LOCATIONIQ_API_KEY` - Geocoder key (address autocomplete disabled if unset)
//! - `LOCATIONIQ_BASE_URL` - Geocoder base URL (default: https://api.locationiq.com/v1)
//! - `ADDRESS_API_ACCESS_TOKEN` - Shared key guarding the address endpoint
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

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

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// `PostgreSQL` connection URL (absent with the in-memory store)
    pub database_url: Option<SecretString>,
    /// Which credential store backend to run
    pub credential_store: CredentialStoreKind,
    /// Shopify app configuration
    pub shopify: ShopifyAppConfig,
    /// COD order workflow configuration
    pub cod: CodConfig,
    /// Geocoder configuration (optional - disables address autocomplete)
    pub geocoder: Option<GeocoderConfig>,
    /// Shared key required in `x-access-token` on the address endpoint
    pub address_api_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Credential store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStoreKind {
    /// `PostgreSQL`-backed store (production default).
    Postgres,
    /// In-process map, lost on restart. Local runs and tests only.
    Memory,
}

/// Which upstream API the order workflow drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderApiMode {
    /// Draft-order REST flow with completion and reconciliation.
    #[default]
    Rest,
    /// Direct `orderCreate` GraphQL mutation.
    Graphql,
}

/// Shopify app (OAuth + Admin API) configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client ID (public)
    pub api_key: String,
    /// App client secret (HIGH PRIVILEGE - signs OAuth callbacks)
    pub api_secret: SecretString,
    /// Comma-separated OAuth scopes requested at install
    pub scopes: String,
    /// OAuth redirect URI registered with the app
    pub redirect_uri: String,
    /// Admin API version (e.g., 2024-04)
    pub api_version: String,
    /// Optional override for the per-shop `https://{shop}` base URL
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("redirect_uri", &self.redirect_uri)
            .field("api_version", &self.api_version)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// COD order workflow configuration.
#[derive(Debug, Clone)]
pub struct CodConfig {
    /// REST draft-order flow or GraphQL direct creation
    pub order_api: OrderApiMode,
    /// Domain for synthesized `cod-<digits>@...` placeholder emails
    pub email_domain: String,
    /// Merchant operating country, fixed on every order address
    pub country: String,
}

/// Geocoder (LocationIQ) configuration for address autocomplete.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeocoderConfig {
    /// LocationIQ API key
    pub api_key: SecretString,
    /// API base URL
    pub base_url: String,
}

impl std::fmt::Debug for GeocoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AppConfig {
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

        let host = get_env_or_default("COD_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("COD_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("COD_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("COD_PORT".to_string(), e.to_string()))?;

        let credential_store = match get_env_or_default("COD_CREDENTIAL_STORE", "postgres").as_str()
        {
            "postgres" => CredentialStoreKind::Postgres,
            "memory" => CredentialStoreKind::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "COD_CREDENTIAL_STORE".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        let database_url = match credential_store {
            CredentialStoreKind::Postgres => Some(get_database_url("COD_DATABASE_URL")?),
            CredentialStoreKind::Memory => None,
        };

        let shopify = ShopifyAppConfig::from_env()?;
        let cod = CodConfig::from_env()?;
        let geocoder = GeocoderConfig::from_env();
        let address_api_token = get_optional_env("ADDRESS_API_ACCESS_TOKEN").map(|token| {
            if let Err(e) = validate_secret_strength(&token, "ADDRESS_API_ACCESS_TOKEN") {
                tracing::warn!("ADDRESS_API_ACCESS_TOKEN validation warning: {e}");
            }
            SecretString::from(token)
        });
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            host,
            port,
            database_url,
            credential_store,
            shopify,
            cod,
            geocoder,
            address_api_token,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyAppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            scopes: get_env_or_default(
                "SHOPIFY_SCOPES",
                "write_orders,write_customers,write_draft_orders",
            ),
            redirect_uri: get_required_env("SHOPIFY_REDIRECT_URI")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2024-04"),
            api_base: get_optional_env("SHOPIFY_API_BASE"),
        })
    }
}

impl CodConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let order_api = match get_env_or_default("COD_ORDER_API", "rest").as_str() {
            "rest" => OrderApiMode::Rest,
            "graphql" => OrderApiMode::Graphql,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "COD_ORDER_API".to_string(),
                    format!("expected 'rest' or 'graphql', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            order_api,
            email_domain: get_env_or_default("COD_EMAIL_DOMAIN", "codorder.local"),
            country: get_env_or_default("COD_COUNTRY", "India"),
        })
    }
}

impl GeocoderConfig {
    /// Load geocoder configuration from environment.
    ///
    /// Returns `None` if `LOCATIONIQ_API_KEY` is not set (address
    /// autocomplete disabled).
    fn from_env() -> Option<Self> {
        get_optional_env("LOCATIONIQ_API_KEY").map(|key| {
            if let Err(e) = validate_secret_strength(&key, "LOCATIONIQ_API_KEY") {
                tracing::warn!("LOCATIONIQ_API_KEY validation warning: {e}");
            }
            Self {
                api_key: SecretString::from(key),
                base_url: get_env_or_default("LOCATIONIQ_BASE_URL", "https://api.locationiq.com/v1"),
            }
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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
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
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            database_url: None,
            credential_store: CredentialStoreKind::Memory,
            shopify: ShopifyAppConfig {
                api_key: "test_api_key".to_string(),
                api_secret: SecretString::from("shpss_9f8e7d6c5b4a3210"),
                scopes: "write_orders".to_string(),
                redirect_uri: "https://app.test/auth/callback".to_string(),
                api_version: "2024-04".to_string(),
                api_base: None,
            },
            cod: CodConfig {
                order_api: OrderApiMode::Rest,
                email_domain: "codorder.local".to_string(),
                country: "India".to_string(),
            },
            geocoder: None,
            address_api_token: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_shopify_config_debug_redacts_secret() {
        let config = test_config();
        let debug_output = format!("{:?}", config.shopify);

        assert!(debug_output.contains("test_api_key"));
        assert!(debug_output.contains("2024-04"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("shpss_9f8e7d6c5b4a3210"));
    }

    #[test]
    fn test_geocoder_config_debug_redacts_key() {
        let config = GeocoderConfig {
            api_key: SecretString::from("pk.live.1a2b3c4d5e6f"),
            base_url: "https://api.locationiq.com/v1".to_string(),
        };
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("https://api.locationiq.com/v1"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("pk.live.1a2b3c4d5e6f"));
    }

    #[test]
    fn test_order_api_mode_default_is_rest() {
        assert_eq!(OrderApiMode::default(), OrderApiMode::Rest);
    }
}
