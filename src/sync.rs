// ABOUTME: Expenditure sync orchestration: token, cycle fetch with bounded 401 recovery, ledger write
// ABOUTME: Filters cycles to the requested calendar date and converts kilojoules to kilocalories
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expenditure sync orchestration
//!
//! The entry point the (out of scope) request layer calls to pull a day's
//! energy expenditure from WHOOP into the daily ledger. A 401 from the
//! activity API is recovered locally with exactly one forced token refresh
//! and one retry; everything past that surfaces as a typed failure.

use crate::constants::energy::KILOJOULES_PER_KILOCALORIE;
use crate::errors::{AppError, AppResult};
use crate::ledger::{LedgerAggregator, SyncedExpenditure};
use crate::models::validate_user_id;
use crate::oauth2_client::TokenManager;
use crate::providers::{ActivityFeed, CycleRecord, ProviderError};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Sum the kilojoules of the records that start on `date` and convert to
/// whole kilocalories. The upstream window filter is not trusted to be
/// exact, so records outside the date are dropped here.
#[must_use]
pub fn kilocalories_for_date(records: &[CycleRecord], date: NaiveDate) -> i64 {
    let total_kilojoules: f64 = records
        .iter()
        .filter(|record| record.start.date_naive() == date)
        .map(|record| record.kilojoule)
        .sum();
    (total_kilojoules / KILOJOULES_PER_KILOCALORIE).round() as i64
}

/// Pulls expenditure data from the activity service into daily ledgers
pub struct ExpenditureSync {
    tokens: Arc<TokenManager>,
    feed: Arc<dyn ActivityFeed>,
    ledger: Arc<LedgerAggregator>,
}

impl ExpenditureSync {
    /// Create the orchestrator from its three collaborators
    #[must_use]
    pub fn new(
        tokens: Arc<TokenManager>,
        feed: Arc<dyn ActivityFeed>,
        ledger: Arc<LedgerAggregator>,
    ) -> Self {
        Self {
            tokens,
            feed,
            ledger,
        }
    }

    /// Fetch the `[start, end)` activity window and write the expenditure for
    /// the calendar date of `start` into that date's ledger.
    ///
    /// # Errors
    ///
    /// `FailedPrecondition` from the token lifecycle surfaces unchanged (the
    /// caller interprets `reauth_required` as "show re-auth UI"); any
    /// activity-API failure after the bounded one-retry policy is `Internal`.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn fetch_external_expenditure(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<SyncedExpenditure> {
        validate_user_id(user_id)?;
        if end <= start {
            return Err(AppError::invalid_argument(
                "window end must be after window start",
            ));
        }

        let access_token = self.tokens.get_fresh_access_token(user_id).await?;

        let records = match self.feed.fetch_cycles(&access_token, start, end).await {
            Ok(records) => records,
            Err(ProviderError::Unauthorized { .. }) => {
                // The provider rejected a token the expiry margin still
                // considered valid. One forced refresh, one retry, no more.
                warn!("activity API returned 401, forcing one token refresh");
                let refreshed = self.tokens.force_refresh(user_id).await?;
                self.feed
                    .fetch_cycles(&refreshed, start, end)
                    .await
                    .map_err(|e| {
                        AppError::internal("activity fetch failed after forced refresh")
                            .with_source(e)
                    })?
            }
            Err(e) => {
                return Err(AppError::internal("activity fetch failed").with_source(e));
            }
        };

        let target_date = start.date_naive();
        let kilocalories = kilocalories_for_date(&records, target_date);
        debug!(
            records = records.len(),
            kilocalories,
            %target_date,
            "converted cycle records"
        );

        let date_key = target_date.format("%Y-%m-%d").to_string();
        let synced = self
            .ledger
            .sync_external_expenditure(user_id, &date_key, kilocalories)
            .await?;

        info!(
            whoop_cals = synced.whoop_cals,
            calories_out = synced.calories_out,
            "expenditure synced"
        );
        Ok(synced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(ts: &str, kilojoule: f64) -> CycleRecord {
        CycleRecord {
            start: DateTime::parse_from_rfc3339(ts)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).single().unwrap_or_default()),
            kilojoule,
        }
    }

    #[test]
    fn test_kilojoule_to_kilocalorie_rounding() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let records = vec![
            record("2024-01-01T06:00:00Z", 100.0),
            record("2024-01-01T12:00:00Z", 250.0),
            record("2024-01-01T20:00:00Z", 50.0),
        ];
        // round(400 / 4.184) = 96
        assert_eq!(kilocalories_for_date(&records, date), 96);
    }

    #[test]
    fn test_records_off_the_target_date_are_dropped() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let records = vec![
            record("2024-01-01T23:00:00Z", 418.4),
            record("2024-01-02T01:00:00Z", 9999.0),
            record("2023-12-31T23:59:59Z", 9999.0),
        ];
        assert_eq!(kilocalories_for_date(&records, date), 100);
    }

    #[test]
    fn test_empty_window_is_zero() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        assert_eq!(kilocalories_for_date(&[], date), 0);
    }
}
