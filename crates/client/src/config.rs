//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RETAILCLOUD_API_URL` - Base URL of the RetailCloud API gateway
//!
//! ## Optional
//! - `RETAILCLOUD_DEMO_USER` - Cart/order user id when no account is used
//!   (default: `demo-user`)
//! - `RETAILCLOUD_FALLBACK_EMAIL` - Order-confirmation address used when the
//!   identity carries no email claim (default: `orders@retailcloud.dev`)
//! - `RETAILCLOUD_SESSION_FILE` - Path of the persisted session file
//!   (default: `.retailcloud-session.json`)

use std::path::PathBuf;

use thiserror::Error;

use retailcloud_core::{Email, UserId};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the RetailCloud API gateway.
    pub api_url: String,
    /// User id for cart and order calls in the demo flow.
    pub demo_user: UserId,
    /// Confirmation email used when the identity carries no email claim.
    pub fallback_email: Email,
    /// Where the persisted session lives on disk.
    pub session_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_env("RETAILCLOUD_API_URL")?;
        let demo_user = UserId::new(get_env_or_default("RETAILCLOUD_DEMO_USER", "demo-user"));

        let fallback_email_raw =
            get_env_or_default("RETAILCLOUD_FALLBACK_EMAIL", "orders@retailcloud.dev");
        let fallback_email = Email::parse(&fallback_email_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("RETAILCLOUD_FALLBACK_EMAIL".to_owned(), e.to_string())
        })?;

        let session_file = PathBuf::from(get_env_or_default(
            "RETAILCLOUD_SESSION_FILE",
            ".retailcloud-session.json",
        ));

        Ok(Self {
            api_url,
            demo_user,
            fallback_email,
            session_file,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fallback_email_is_valid() {
        assert!(Email::parse("orders@retailcloud.dev").is_ok());
    }

    #[test]
    fn test_get_env_or_default_uses_default_when_unset() {
        let value = get_env_or_default("RETAILCLOUD_TEST_UNSET_VARIABLE", "fallback");
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_missing_required_env_reports_variable_name() {
        let err = get_required_env("RETAILCLOUD_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name.contains("UNSET")));
    }

    #[test]
    fn test_config_construction() {
        let config = Config {
            api_url: "https://api.retailcloud.dev/dev".to_owned(),
            demo_user: UserId::new("demo-user"),
            fallback_email: Email::parse("orders@retailcloud.dev").unwrap(),
            session_file: PathBuf::from(".retailcloud-session.json"),
        };
        assert_eq!(config.demo_user.as_str(), "demo-user");
    }
}
