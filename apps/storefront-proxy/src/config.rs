//! Storefront proxy configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                   | Default             |
//! |----------------------------|---------------------|
//! | `PROXY_BIND_ADDR`          | `0.0.0.0`           |
//! | `PROXY_PORT`               | `8080`              |
//! | `DATABASE_PATH`            | `./tierline.db`     |
//! | `SHOPIFY_API_SECRET`       | none                |
//! | `PROXY_SIGNATURE_REQUIRED` | `true`              |
//! | `PROXY_PATH`               | `/proxy/discounts`  |
//! | `PROXY_SIGNATURE_MAX_AGE`  | `300` (seconds, `0` = no limit) |

use std::env;

/// Storefront proxy configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Bind address
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// App secret that signs app proxy requests
    pub api_secret: Option<String>,

    /// Reject unsigned or badly signed requests
    pub signature_required: bool,

    /// Route the app proxy forwards to
    pub proxy_path: String,

    /// Largest accepted distance between the signed `timestamp` and now
    pub signature_max_age_secs: Option<u64>,
}

impl ProxyConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ProxyConfig {
            bind_addr: lookup("PROXY_BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("PROXY_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PROXY_PORT".to_string()))?,

            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "./tierline.db".to_string()),

            api_secret: lookup("SHOPIFY_API_SECRET").filter(|s| !s.is_empty()),

            signature_required: lookup("PROXY_SIGNATURE_REQUIRED")
                .unwrap_or_else(|| "true".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PROXY_SIGNATURE_REQUIRED".to_string()))?,

            proxy_path: lookup("PROXY_PATH").unwrap_or_else(|| "/proxy/discounts".to_string()),

            signature_max_age_secs: match lookup("PROXY_SIGNATURE_MAX_AGE")
                .unwrap_or_else(|| "300".to_string())
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue("PROXY_SIGNATURE_MAX_AGE".to_string()))?
            {
                0 => None,
                secs => Some(secs),
            },
        };

        if config.signature_required && config.api_secret.is_none() {
            return Err(ConfigError::MissingRequired("SHOPIFY_API_SECRET".to_string()));
        }

        if !config.proxy_path.starts_with('/') {
            return Err(ConfigError::InvalidValue("PROXY_PATH".to_string()));
        }

        Ok(config)
    }

    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
