//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_BASE_URL` - Base URL of the catalog API (serves `stock/{id}` and `products/{id}`)
//!
//! ## Optional
//! - `CATALOG_API_TOKEN` - Bearer token sent with catalog requests
//! - `CATALOG_PRODUCT_CACHE_TTL_SECS` - Product cache lifetime (default: 300, 0 disables)
//! - `CART_STORAGE_PATH` - File backing the persistence slot (default: .rocketshoes/storage.json)
//! - `CART_STORAGE_KEY` - Key the cart is stored under (default: @RocketShoes:cart)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::manager::DEFAULT_STORAGE_KEY;

const DEFAULT_STORAGE_PATH: &str = ".rocketshoes/storage.json";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog API configuration
    pub catalog: CatalogConfig,
    /// Persistence slot configuration
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Catalog API configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL, always ending in `/` so relative joins keep its path
    pub base_url: Url,
    /// Bearer token for the catalog API
    pub api_token: Option<SecretString>,
    /// How long product lookups stay cached (zero disables caching)
    pub product_cache_ttl: Duration,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("product_cache_ttl", &self.product_cache_ttl)
            .finish()
    }
}

impl CatalogConfig {
    /// Build a catalog configuration for `base_url` with no token and the
    /// default cache lifetime.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("CATALOG_BASE_URL", base_url)?,
            api_token: None,
            product_cache_ttl: Duration::from_secs(300),
        })
    }
}

/// Persistence slot configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// File backing the slot
    pub path: PathBuf,
    /// Key the cart blob is stored under
    pub key: String,
}

impl CartConfig {
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

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let base_url = vars.required("CATALOG_BASE_URL")?;
        let ttl_secs = vars
            .or_default("CATALOG_PRODUCT_CACHE_TTL_SECS", DEFAULT_PRODUCT_CACHE_TTL_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "CATALOG_PRODUCT_CACHE_TTL_SECS".to_string(),
                    e.to_string(),
                )
            })?;

        let catalog = CatalogConfig {
            base_url: parse_base_url("CATALOG_BASE_URL", &base_url)?,
            api_token: vars
                .optional("CATALOG_API_TOKEN")
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
            product_cache_ttl: Duration::from_secs(ttl_secs),
        };

        let key = vars.or_default("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if key.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let storage = StorageConfig {
            path: PathBuf::from(vars.or_default("CART_STORAGE_PATH", DEFAULT_STORAGE_PATH)),
            key,
        };

        Ok(Self {
            catalog,
            storage,
            sentry_dsn: vars.optional("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        (self.0)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse a base URL and make sure its path ends in `/`.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be a hierarchical URL such as http://host/api".to_string(),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<CartConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CartConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "CATALOG_BASE_URL"));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("CATALOG_BASE_URL", "http://localhost:3333")]).unwrap();

        assert_eq!(config.catalog.base_url.as_str(), "http://localhost:3333/");
        assert!(config.catalog.api_token.is_none());
        assert_eq!(config.catalog.product_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.storage.key, "@RocketShoes:cart");
        assert_eq!(
            config.storage.path,
            PathBuf::from(".rocketshoes/storage.json")
        );
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_base_url_path_gets_trailing_slash() {
        let config = load(&[("CATALOG_BASE_URL", "https://api.example.com/v1")]).unwrap();
        assert_eq!(config.catalog.base_url.as_str(), "https://api.example.com/v1/");
        assert_eq!(
            config.catalog.base_url.join("stock/1").unwrap().as_str(),
            "https://api.example.com/v1/stock/1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = load(&[("CATALOG_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = load(&[("CATALOG_BASE_URL", "mailto:shop@example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_ttl() {
        let err = load(&[
            ("CATALOG_BASE_URL", "http://localhost:3333"),
            ("CATALOG_PRODUCT_CACHE_TTL_SECS", "soon"),
        ])
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "CATALOG_PRODUCT_CACHE_TTL_SECS")
        );
    }

    #[test]
    fn test_empty_storage_key_rejected() {
        let err = load(&[
            ("CATALOG_BASE_URL", "http://localhost:3333"),
            ("CART_STORAGE_KEY", ""),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "CART_STORAGE_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CATALOG_BASE_URL", "http://localhost:3333"),
            ("CATALOG_API_TOKEN", "tok_9f8e7d6c"),
            ("CATALOG_PRODUCT_CACHE_TTL_SECS", "0"),
            ("CART_STORAGE_PATH", "/tmp/cart.json"),
            ("CART_STORAGE_KEY", "cart:guest"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ])
        .unwrap();

        assert_eq!(
            config.catalog.api_token.as_ref().unwrap().expose_secret(),
            "tok_9f8e7d6c"
        );
        assert_eq!(config.catalog.product_cache_ttl, Duration::ZERO);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/cart.json"));
        assert_eq!(config.storage.key, "cart:guest");
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_catalog_config_debug_redacts_token() {
        let mut config = CatalogConfig::new("http://localhost:3333").unwrap();
        config.api_token = Some(SecretString::from("super_secret_catalog_token"));

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("localhost:3333"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_catalog_token"));
    }
}
