// ABOUTME: Shared test utilities: in-memory store setup, stub token endpoint, scripted feed
// ABOUTME: Provides seed helpers for token sets and quiet tracing initialization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

//! Shared test utilities for `macrolog`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use macrolog::oauth2_client::client::{AuthorizationEndpoint, OAuth2Token};
use macrolog::providers::errors::{ProviderError, ProviderResult};
use macrolog::providers::whoop::{ActivityFeed, CycleRecord};
use macrolog::store::memory::MemoryStore;
use macrolog::store::{DocKey, DocumentStore};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Fresh in-memory store behind the trait object the core expects
pub fn create_test_store() -> Arc<dyn DocumentStore> {
    init_test_logging();
    Arc::new(MemoryStore::new())
}

/// Seed a stored token set for `user_id`'s WHOOP integration
pub async fn seed_tokens(
    store: &Arc<dyn DocumentStore>,
    user_id: &str,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: i64,
) {
    let mut fields = Map::new();
    fields.insert("access_token".to_owned(), Value::from(access_token));
    if let Some(refresh) = refresh_token {
        fields.insert("refresh_token".to_owned(), Value::from(refresh));
    }
    fields.insert("expires_at".to_owned(), Value::from(expires_at));
    fields.insert("updated_at".to_owned(), Value::from(0));
    store
        .merge(&DocKey::integration(user_id, "whoop"), fields)
        .await
        .unwrap();
}

/// Read one document as JSON, panicking when absent
pub async fn read_doc(store: &Arc<dyn DocumentStore>, key: &DocKey) -> Value {
    store.get(key).await.unwrap().expect("document should exist")
}

/// Scripted outcome for one stub token grant
#[derive(Clone)]
pub enum GrantOutcome {
    /// Successful grant with the given token fields
    Token {
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    },
    /// Grant rejected by the endpoint
    Failure,
}

impl GrantOutcome {
    pub fn token(access: &str, refresh: Option<&str>, expires_in: Option<i64>) -> Self {
        Self::Token {
            access_token: access.to_owned(),
            refresh_token: refresh.map(str::to_owned),
            expires_in,
        }
    }

    fn resolve(&self, grant: &str) -> ProviderResult<OAuth2Token> {
        match self {
            Self::Token {
                access_token,
                refresh_token,
                expires_in,
            } => Ok(OAuth2Token {
                access_token: access_token.clone(),
                refresh_token: refresh_token.clone(),
                expires_in: *expires_in,
            }),
            Self::Failure => Err(ProviderError::AuthenticationFailed {
                provider: "whoop".to_owned(),
                reason: format!("{grant} grant failed with status 400"),
            }),
        }
    }
}

/// Stub token endpoint with call counters and an optional artificial delay
pub struct StubEndpoint {
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    exchange_outcome: GrantOutcome,
    refresh_outcome: GrantOutcome,
    refresh_delay: Option<Duration>,
}

impl StubEndpoint {
    pub fn new(exchange_outcome: GrantOutcome, refresh_outcome: GrantOutcome) -> Self {
        Self {
            exchange_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            exchange_outcome,
            refresh_outcome,
            refresh_delay: None,
        }
    }

    /// Delay refresh grants, widening the race window for single-flight tests
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }
}

#[async_trait]
impl AuthorizationEndpoint for StubEndpoint {
    async fn exchange_code(&self, _code: &str) -> ProviderResult<OAuth2Token> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.exchange_outcome.resolve("authorization_code")
    }

    async fn refresh_token(&self, _refresh_token: &str) -> ProviderResult<OAuth2Token> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        self.refresh_outcome.resolve("refresh_token")
    }
}

/// Scripted outcome for one stub activity fetch
pub enum FeedOutcome {
    /// Successful fetch returning the given cycle records
    Records(Vec<CycleRecord>),
    /// HTTP 401 from the activity API
    Unauthorized,
    /// Non-auth upstream failure
    ApiError(u16),
}

/// Stub activity feed replaying a scripted sequence of outcomes and
/// recording the bearer token used for each call
pub struct StubFeed {
    script: Mutex<Vec<FeedOutcome>>,
    pub tokens_seen: Mutex<Vec<String>>,
}

impl StubFeed {
    pub fn new(script: Vec<FeedOutcome>) -> Self {
        Self {
            script: Mutex::new(script),
            tokens_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.tokens_seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ActivityFeed for StubFeed {
    async fn fetch_cycles(
        &self,
        access_token: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> ProviderResult<Vec<CycleRecord>> {
        self.tokens_seen
            .lock()
            .unwrap()
            .push(access_token.to_owned());

        let next = {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                FeedOutcome::Records(Vec::new())
            } else {
                script.remove(0)
            }
        };

        match next {
            FeedOutcome::Records(records) => Ok(records),
            FeedOutcome::Unauthorized => Err(ProviderError::Unauthorized {
                provider: "whoop".to_owned(),
                reason: "access token expired or invalid".to_owned(),
            }),
            FeedOutcome::ApiError(status_code) => Err(ProviderError::ApiError {
                provider: "whoop".to_owned(),
                status_code,
                message: format!("cycle request failed with status {status_code}"),
            }),
        }
    }
}

/// Cycle record at the given RFC 3339 timestamp
pub fn cycle(ts: &str, kilojoule: f64) -> CycleRecord {
    CycleRecord {
        start: DateTime::parse_from_rfc3339(ts)
            .expect("valid timestamp")
            .with_timezone(&Utc),
        kilojoule,
    }
}
