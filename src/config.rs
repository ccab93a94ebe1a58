// ABOUTME: Environment-sourced configuration for the WHOOP OAuth integration
// ABOUTME: Single configuration provider; the core only sees client_id/client_secret accessors
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration management
//!
//! Secrets load from the environment exactly once, at construction; the core
//! components receive this struct by value and never touch the environment
//! themselves.

use crate::errors::{AppError, AppResult};
use std::env;

/// Default WHOOP OAuth token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/token";

/// OAuth client configuration for the WHOOP integration
#[derive(Debug, Clone)]
pub struct WhoopOAuthConfig {
    /// OAuth client ID issued by WHOOP
    pub client_id: String,
    /// OAuth client secret issued by WHOOP
    pub client_secret: String,
    /// Redirect URI registered for the authorization-code flow
    pub redirect_uri: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl WhoopOAuthConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `WHOOP_CLIENT_ID`, `WHOOP_CLIENT_SECRET`,
    /// `WHOOP_REDIRECT_URI`. Optional override: `WHOOP_TOKEN_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first missing variable.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            client_id: require_env("WHOOP_CLIENT_ID")?,
            client_secret: require_env("WHOOP_CLIENT_SECRET")?,
            redirect_uri: require_env("WHOOP_REDIRECT_URI")?,
            token_url: env::var("WHOOP_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.into()),
        })
    }
}

fn require_env(name: &str) -> AppResult<String> {
    env::var(name)
        .map_err(|_| AppError::config(format!("missing required environment variable {name}")))
        .and_then(|value| {
            if value.is_empty() {
                Err(AppError::config(format!(
                    "environment variable {name} must not be empty"
                )))
            } else {
                Ok(value)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_names_the_variable() {
        let err = require_env("MACROLOG_TEST_UNSET_VARIABLE")
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("MACROLOG_TEST_UNSET_VARIABLE"));
    }
}
