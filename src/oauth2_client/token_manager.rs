// ABOUTME: OAuth token lifecycle manager deciding reuse vs refresh vs re-authorization per user
// ABOUTME: Refresh grants are single-flight per user; losers re-read the freshly persisted token
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token Lifecycle Manager
//!
//! Owns the stored [`IntegrationTokenSet`] for each user's WHOOP integration.
//! A stored access token is trusted while `now < expires_at - 60s`; past that
//! margin a refresh-token grant runs under a per-user lock so concurrent
//! callers cannot race refresh-token rotation at the provider. Any refresh
//! failure is terminal (`reauth_required`) rather than retried, which keeps a
//! dead refresh token from looping forever.

use crate::constants::oauth_providers;
use crate::constants::time::DEFAULT_TOKEN_EXPIRY_SECONDS;
use crate::errors::{AppError, AppResult};
use crate::models::{validate_user_id, IntegrationTokenSet};
use crate::oauth2_client::client::{AuthorizationEndpoint, OAuth2Token};
use crate::store::{DocKey, DocumentStore};
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Stored-token state as observed at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenState {
    /// Access token usable as-is
    Valid,
    /// Past the expiry margin but a refresh token is available
    Expiring,
    /// Past the expiry margin with no refresh token stored
    NeedsReauth,
}

fn classify(tokens: &IntegrationTokenSet, now_millis: i64) -> TokenState {
    if tokens.is_fresh_at(now_millis) {
        TokenState::Valid
    } else if tokens.refresh_token.is_some() {
        TokenState::Expiring
    } else {
        TokenState::NeedsReauth
    }
}

/// Outcome of an authorization-code exchange, echoed back to the caller
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ExchangeSummary {
    /// Whether the provider issued a refresh token
    pub has_refresh: bool,
    /// Access-token lifetime in seconds (endpoint value or the 3600s default)
    pub expires_in: i64,
}

/// Manages the stored OAuth token set for each user's WHOOP integration
pub struct TokenManager {
    store: Arc<dyn DocumentStore>,
    endpoint: Arc<dyn AuthorizationEndpoint>,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TokenManager {
    /// Create a manager over the given store and token endpoint
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, endpoint: Arc<dyn AuthorizationEndpoint>) -> Self {
        Self {
            store,
            endpoint,
            refresh_locks: DashMap::new(),
        }
    }

    /// Return an access token that is safe to use right now.
    ///
    /// Reuses the stored token while it is at least 60s from expiry;
    /// otherwise performs a refresh-token grant and persists the result.
    /// Concurrent callers for one user serialize on a per-user lock, and
    /// whoever loses the race re-reads the token the winner persisted
    /// instead of issuing a second grant.
    ///
    /// # Errors
    ///
    /// `FailedPrecondition("no tokens")` when the user never authorized the
    /// integration; `FailedPrecondition("reauth_required")` when the token is
    /// past its margin and no refresh token is stored, or when the refresh
    /// grant fails for any reason.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_fresh_access_token(&self, user_id: &str) -> AppResult<String> {
        validate_user_id(user_id)?;

        let tokens = self.read_tokens(user_id).await?.ok_or_else(AppError::no_tokens)?;
        let now = Utc::now().timestamp_millis();
        if classify(&tokens, now) == TokenState::Valid {
            debug!("stored access token still fresh, reusing");
            return Ok(tokens.access_token);
        }

        let lock = self.refresh_lock(user_id);
        let _guard = lock.lock().await;

        // Re-read under the lock: a concurrent caller may have already
        // refreshed while we waited.
        let tokens = self.read_tokens(user_id).await?.ok_or_else(AppError::no_tokens)?;
        let now = Utc::now().timestamp_millis();
        match classify(&tokens, now) {
            TokenState::Valid => {
                debug!("token refreshed by a concurrent caller, reusing");
                Ok(tokens.access_token)
            }
            TokenState::NeedsReauth => Err(AppError::reauth_required()),
            TokenState::Expiring => self.refresh_locked(user_id, &tokens).await,
        }
    }

    /// Refresh the stored token unconditionally, bypassing the freshness
    /// check. Used by the bounded 401 recovery path when a token the margin
    /// still considered valid was rejected upstream.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::get_fresh_access_token`].
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn force_refresh(&self, user_id: &str) -> AppResult<String> {
        validate_user_id(user_id)?;

        let lock = self.refresh_lock(user_id);
        let _guard = lock.lock().await;

        let tokens = self.read_tokens(user_id).await?.ok_or_else(AppError::no_tokens)?;
        if tokens.refresh_token.is_none() {
            return Err(AppError::reauth_required());
        }
        self.refresh_locked(user_id, &tokens).await
    }

    /// Perform an authorization-code grant and persist the resulting token
    /// set (creating it if absent, merging otherwise).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty user id or code; `Internal` on any
    /// transport or non-2xx response from the token endpoint (the upstream
    /// error body is logged by the endpoint client).
    #[instrument(skip(self, code), fields(user_id = %user_id))]
    pub async fn exchange_authorization_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> AppResult<ExchangeSummary> {
        validate_user_id(user_id)?;
        if code.is_empty() {
            return Err(AppError::invalid_argument(
                "authorization code must not be empty",
            ));
        }

        let token = self.endpoint.exchange_code(code).await.map_err(|e| {
            AppError::internal("authorization code exchange failed").with_source(e)
        })?;

        let has_refresh = token.refresh_token.is_some();
        let expires_in = token.expires_in.unwrap_or(DEFAULT_TOKEN_EXPIRY_SECONDS);
        self.persist_token_set(user_id, &token).await?;

        info!(has_refresh, expires_in, "authorization code exchanged");
        Ok(ExchangeSummary {
            has_refresh,
            expires_in,
        })
    }

    /// Refresh grant against the token endpoint; must be called with the
    /// user's refresh lock held.
    async fn refresh_locked(
        &self,
        user_id: &str,
        tokens: &IntegrationTokenSet,
    ) -> AppResult<String> {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .ok_or_else(AppError::reauth_required)?;

        info!("refreshing WHOOP access token");
        let refreshed = match self.endpoint.refresh_token(refresh_token).await {
            Ok(token) => token,
            Err(e) => {
                // Deliberate policy: any refresh failure demands full
                // re-authorization instead of open-ended refresh retries
                // against a possibly dead refresh token.
                warn!("token refresh failed, flagging re-authorization: {e}");
                return Err(AppError::reauth_required());
            }
        };

        self.persist_token_set(user_id, &refreshed).await?;
        Ok(refreshed.access_token)
    }

    /// Merge-write the token set. Omitting `refresh_token` when the endpoint
    /// did not rotate one keeps the previously stored value intact.
    async fn persist_token_set(&self, user_id: &str, token: &OAuth2Token) -> AppResult<()> {
        let now = Utc::now().timestamp_millis();
        let expires_in = token.expires_in.unwrap_or(DEFAULT_TOKEN_EXPIRY_SECONDS);

        let mut fields = Map::new();
        fields.insert(
            "access_token".to_owned(),
            Value::from(token.access_token.clone()),
        );
        if let Some(refresh) = &token.refresh_token {
            fields.insert("refresh_token".to_owned(), Value::from(refresh.clone()));
        }
        fields.insert("expires_at".to_owned(), Value::from(now + expires_in * 1000));
        fields.insert("updated_at".to_owned(), Value::from(now));

        let key = DocKey::integration(user_id, oauth_providers::WHOOP);
        self.store.merge(&key, fields).await
    }

    async fn read_tokens(&self, user_id: &str) -> AppResult<Option<IntegrationTokenSet>> {
        let key = DocKey::integration(user_id, oauth_providers::WHOOP);
        match self.store.get(&key).await? {
            Some(doc) => serde_json::from_value(doc)
                .map(Some)
                .map_err(|e| {
                    AppError::storage("stored token set is malformed").with_source(e)
                }),
            None => Ok(None),
        }
    }

    fn refresh_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry(user_id.to_owned())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::time::TOKEN_EXPIRY_MARGIN_MILLIS;

    fn tokens(expires_at: Option<i64>, refresh: Option<&str>) -> IntegrationTokenSet {
        IntegrationTokenSet {
            access_token: "at".into(),
            refresh_token: refresh.map(str::to_owned),
            expires_at,
            updated_at: 0,
        }
    }

    #[test]
    fn test_classify_respects_expiry_margin() {
        let set = tokens(Some(100_000 + TOKEN_EXPIRY_MARGIN_MILLIS), Some("rt"));
        assert_eq!(classify(&set, 99_999), TokenState::Valid);
        assert_eq!(classify(&set, 100_000), TokenState::Expiring);
    }

    #[test]
    fn test_classify_without_refresh_token() {
        let set = tokens(Some(0), None);
        assert_eq!(classify(&set, 1), TokenState::NeedsReauth);
        // Missing expiry is never trusted as valid
        let set = tokens(None, Some("rt"));
        assert_eq!(classify(&set, 0), TokenState::Expiring);
    }
}
