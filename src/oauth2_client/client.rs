// ABOUTME: OAuth2 token-endpoint client for the WHOOP integration
// ABOUTME: Implements authorization-code and refresh-token grants via form POSTs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::config::WhoopOAuthConfig;
use crate::constants::network;
use crate::constants::oauth_providers;
use crate::providers::errors::{ProviderError, ProviderResult};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

/// Token set as returned by the OAuth token endpoint.
///
/// `expires_in` stays relative here; the lifecycle manager converts it to an
/// absolute epoch-millisecond expiry when persisting.
#[derive(Debug, Clone)]
pub struct OAuth2Token {
    /// The access token string
    pub access_token: String,
    /// Refresh token, absent when the provider chooses not to rotate or issue one
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds, if the endpoint reported one
    pub expires_in: Option<i64>,
}

/// OAuth token endpoint operations the lifecycle manager depends on
#[async_trait]
pub trait AuthorizationEndpoint: Send + Sync {
    /// Authorization-code grant
    async fn exchange_code(&self, code: &str) -> ProviderResult<OAuth2Token>;

    /// Refresh-token grant
    async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<OAuth2Token>;
}

/// OAuth 2.0 token response from the provider
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Token-endpoint client for WHOOP
pub struct WhoopAuthClient {
    config: WhoopOAuthConfig,
    client: Client,
}

impl WhoopAuthClient {
    /// Create a client with OAuth-tuned timeouts (token grants should be fast)
    #[must_use]
    pub fn new(config: WhoopOAuthConfig) -> Self {
        Self {
            config,
            client: ClientBuilder::new()
                .timeout(Duration::from_secs(network::OAUTH_TIMEOUT_SECS))
                .connect_timeout(Duration::from_secs(network::OAUTH_CONNECT_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    async fn post_grant(&self, params: &[(&str, &str)], grant: &str) -> ProviderResult<OAuth2Token> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: oauth_providers::WHOOP.to_owned(),
                source: e,
            })?;

        let status = response.status();
        debug!("WHOOP {grant} grant response status: {status}");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("WHOOP {grant} grant failed with status {status}: {body}");
            return Err(ProviderError::AuthenticationFailed {
                provider: oauth_providers::WHOOP.to_owned(),
                reason: format!("{grant} grant failed with status {status}"),
            });
        }

        let token: TokenResponse =
            response.json().await.map_err(|e| ProviderError::InvalidData {
                provider: oauth_providers::WHOOP.to_owned(),
                field: "token response".to_owned(),
                reason: e.to_string(),
            })?;

        Ok(OAuth2Token {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
        })
    }
}

#[async_trait]
impl AuthorizationEndpoint for WhoopAuthClient {
    async fn exchange_code(&self, code: &str) -> ProviderResult<OAuth2Token> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        self.post_grant(&params, "authorization_code").await
    }

    async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<OAuth2Token> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        self.post_grant(&params, "refresh_token").await
    }
}
