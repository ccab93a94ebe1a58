// ABOUTME: Weight ledger writer enforcing at most one measurement per user per day
// ABOUTME: Creation-only semantics; an existing record rejects the write, no update path
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weight Ledger Writer
//!
//! Weight is treated as a single ground-truth measurement per day. A second
//! write for the same date fails with `AlreadyExists` regardless of the value
//! supplied; correction requires an explicit out-of-scope deletion.

use crate::errors::{AppError, AppResult};
use crate::models::{parse_date_key, validate_user_id, WeightRecord};
use crate::store::{DocKey, DocumentStore};
use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

/// Writes at-most-once daily weight records
pub struct WeightLog {
    store: Arc<dyn DocumentStore>,
}

impl WeightLog {
    /// Create a weight log backed by the given document store
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record a weight measurement for `(user_id, date_key)`.
    ///
    /// Runs inside one atomic store transaction; the record's `date` is the
    /// midnight UTC timestamp derived from the date key.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty user id, malformed date key, or a
    /// non-positive/non-finite weight; `AlreadyExists` (naming the date) when
    /// a record for the key is already stored.
    #[instrument(skip(self), fields(user_id = %user_id, date_key = %date_key))]
    pub async fn record_weight(&self, user_id: &str, date_key: &str, weight: f64) -> AppResult<()> {
        validate_user_id(user_id)?;
        let date = parse_date_key(date_key)?;
        if !weight.is_finite() || weight <= 0.0 {
            return Err(AppError::invalid_argument(format!(
                "weight must be a positive number, got {weight}"
            )));
        }

        let timestamp: DateTime<Utc> = date.and_time(NaiveTime::MIN).and_utc();

        let key = DocKey::weight_log(user_id, date_key);
        self.store
            .transact(&key, &mut |current| {
                if current.is_some() {
                    return Err(AppError::already_exists(format!(
                        "weight already recorded for {date_key}"
                    )));
                }
                let record = WeightRecord {
                    date: timestamp,
                    weight,
                };
                serde_json::to_value(&record).map_err(|e| {
                    AppError::internal("failed to serialize weight record").with_source(e)
                })
            })
            .await?;

        info!(weight, "recorded weight");
        Ok(())
    }
}
