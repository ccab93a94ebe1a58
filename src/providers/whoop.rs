// ABOUTME: WHOOP cycle-data client fetching daily energy expenditure over the developer API
// ABOUTME: Typed URL building with encoded query params; 401 surfaces as Unauthorized for retry
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::errors::{ProviderError, ProviderResult};
use crate::constants::network;
use crate::constants::oauth_providers;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Default WHOOP developer API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.prod.whoop.com/developer/v1";

/// One physiological-cycle record relevant to expenditure aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    /// Cycle start timestamp
    pub start: DateTime<Utc>,
    /// Energy expended during the cycle, kilojoules
    pub kilojoule: f64,
}

/// Source of daily activity-cycle records for one user's integration.
///
/// The upstream window filter is not trusted to be exact; callers re-filter
/// returned records by calendar date.
#[async_trait]
pub trait ActivityFeed: Send + Sync {
    /// Fetch all cycle records in the `[start, end)` window using the given
    /// bearer token.
    async fn fetch_cycles(
        &self,
        access_token: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ProviderResult<Vec<CycleRecord>>;
}

// ============================================================================
// WHOOP API Response Structures
// ============================================================================

/// WHOOP pagination wrapper for API responses
#[derive(Debug, Deserialize)]
struct WhoopPaginatedResponse<T> {
    records: Vec<T>,
    next_token: Option<String>,
}

/// WHOOP cycle (daily physiological cycle) response
#[derive(Debug, Deserialize)]
struct WhoopCycle {
    /// Start time of cycle (ISO 8601)
    start: String,
    /// Cycle score details
    score: Option<WhoopCycleScore>,
}

/// WHOOP cycle score containing the expenditure figure
#[derive(Debug, Deserialize)]
struct WhoopCycleScore {
    /// Kilojoules expended during the cycle
    kilojoule: Option<f64>,
}

// ============================================================================
// WHOOP Client Implementation
// ============================================================================

/// HTTP client for the WHOOP developer API
pub struct WhoopClient {
    api_base_url: String,
    client: Client,
}

impl WhoopClient {
    /// Create a client against the production WHOOP API
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL.to_owned())
    }

    /// Create a client against a custom base URL (staging, test server)
    #[must_use]
    pub fn with_base_url(api_base_url: String) -> Self {
        Self {
            api_base_url,
            client: ClientBuilder::new()
                .timeout(Duration::from_secs(network::API_TIMEOUT_SECS))
                .connect_timeout(Duration::from_secs(network::API_CONNECT_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Build the cycle-collection URL with properly encoded query parameters
    fn cycle_url(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        next_token: Option<&str>,
    ) -> ProviderResult<Url> {
        let mut url = Url::parse(&format!("{}/cycle", self.api_base_url)).map_err(|e| {
            ProviderError::InvalidData {
                provider: oauth_providers::WHOOP.to_owned(),
                field: "api_base_url".to_owned(),
                reason: e.to_string(),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("limit", "25")
            .append_pair("start", &start.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
            .append_pair("end", &end.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string());
        if let Some(token) = next_token {
            url.query_pairs_mut().append_pair("nextToken", token);
        }
        Ok(url)
    }

    async fn fetch_page(
        &self,
        access_token: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        next_token: Option<&str>,
    ) -> ProviderResult<WhoopPaginatedResponse<WhoopCycle>> {
        let url = self.cycle_url(start, end, next_token)?;

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: oauth_providers::WHOOP.to_owned(),
                source: e,
            })?;

        let status = response.status();
        debug!("WHOOP cycle response status: {status}");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status.as_u16() == 401 {
                return Err(ProviderError::Unauthorized {
                    provider: oauth_providers::WHOOP.to_owned(),
                    reason: "access token expired or invalid".to_owned(),
                });
            }
            return Err(ProviderError::ApiError {
                provider: oauth_providers::WHOOP.to_owned(),
                status_code: status.as_u16(),
                message: format!("cycle request failed with status {status}: {text}"),
            });
        }

        response.json().await.map_err(|e| ProviderError::InvalidData {
            provider: oauth_providers::WHOOP.to_owned(),
            field: "cycle response".to_owned(),
            reason: e.to_string(),
        })
    }
}

impl Default for WhoopClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityFeed for WhoopClient {
    #[instrument(skip(self, access_token), fields(provider = "whoop", api_call = "get_cycles"))]
    async fn fetch_cycles(
        &self,
        access_token: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ProviderResult<Vec<CycleRecord>> {
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .fetch_page(access_token, start, end, next_token.as_deref())
                .await?;

            for cycle in page.records {
                let Ok(start_time) = DateTime::parse_from_rfc3339(&cycle.start) else {
                    warn!("skipping WHOOP cycle with unparseable start: {}", cycle.start);
                    continue;
                };
                records.push(CycleRecord {
                    start: start_time.with_timezone(&Utc),
                    kilojoule: cycle.score.and_then(|s| s.kilojoule).unwrap_or(0.0),
                });
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(records)
    }
}
