// ABOUTME: Daily ledger aggregator merging nutrition entries and synced expenditure per user/day
// ABOUTME: Additive totals accumulate inside store transactions; expenditure is an overwrite merge
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily Ledger Aggregator
//!
//! One ledger document per user per day. Nutrition entries accumulate
//! additively and append to the raw `meals` log inside a single store
//! transaction, so two concurrent entries for the same key both land in the
//! final totals. Entries are NOT deduplicated; resubmitting the same entry
//! double-counts. Exactly-once accumulation would need a per-entry
//! idempotency key, which callers do not currently supply.

use crate::errors::{AppError, AppResult};
use crate::models::{parse_date_key, validate_user_id, DailyLedger, NutritionEntry};
use crate::store::{DocKey, DocumentStore};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Result of one expenditure sync, echoed back to the caller
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SyncedExpenditure {
    /// Externally sourced estimate written to the ledger
    pub whoop_cals: i64,
    /// `whoop_cals` plus the ledger's locally tracked `extra_cals`
    pub calories_out: i64,
}

/// Aggregates nutrition and expenditure data into per-day ledger documents
pub struct LedgerAggregator {
    store: Arc<dyn DocumentStore>,
}

impl LedgerAggregator {
    /// Create an aggregator backed by the given document store
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record one nutrition entry against the `(user_id, date_key)` ledger.
    ///
    /// Runs inside one atomic store transaction: the current document is
    /// re-read inside the transactional scope, each macro total is bumped by
    /// the entry's field (missing treated as zero on both sides), and the
    /// raw entry is appended to `meals`. The ledger is created lazily on the
    /// first entry for a date.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty user id or malformed date key;
    /// `StorageError` if the store exhausts its conflict retries.
    #[instrument(skip(self, entry), fields(user_id = %user_id, date_key = %date_key))]
    pub async fn record_nutrition_entry(
        &self,
        user_id: &str,
        date_key: &str,
        entry: NutritionEntry,
    ) -> AppResult<()> {
        validate_user_id(user_id)?;
        parse_date_key(date_key)?;

        let key = DocKey::daily_log(user_id, date_key);
        self.store
            .transact(&key, &mut |current| {
                let updated = match current {
                    Some(doc) => {
                        let mut ledger: DailyLedger = parse_ledger(doc)?;
                        if ledger.date.is_empty() {
                            // Document was merge-created by an expenditure
                            // sync before any entry landed
                            ledger.date = date_key.to_owned();
                        }
                        ledger.calories_in += entry.calories_or_zero();
                        ledger.protein += entry.protein_or_zero();
                        ledger.carbs += entry.carbs_or_zero();
                        ledger.fat += entry.fat_or_zero();
                        ledger.meals.push(entry.clone());
                        ledger
                    }
                    None => DailyLedger {
                        date: date_key.to_owned(),
                        calories_in: entry.calories_or_zero(),
                        protein: entry.protein_or_zero(),
                        carbs: entry.carbs_or_zero(),
                        fat: entry.fat_or_zero(),
                        meals: vec![entry.clone()],
                        whoop_cals: 0.0,
                        extra_cals: 0.0,
                        calories_out: 0.0,
                        net_calories: 0.0,
                    },
                };
                serde_json::to_value(&updated).map_err(|e| {
                    AppError::internal("failed to serialize ledger").with_source(e)
                })
            })
            .await?;

        info!("recorded nutrition entry");
        Ok(())
    }

    /// Write an externally synced expenditure figure into the ledger.
    ///
    /// Reads the ledger's current `extra_cals` (absent ledger reads as zero),
    /// recomputes `calories_out = whoop_cals + extra_cals`, and merge-writes
    /// `{whoop_cals, calories_out}` without disturbing unrelated fields,
    /// creating the document if absent. `whoop_cals` is an overwrite, not an
    /// accumulation, so this path uses a plain read-then-merge; two
    /// concurrent syncs for one key could observe a stale `extra_cals`.
    /// Callers are expected to serialize syncs per user/date.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty user id or malformed date key.
    #[instrument(skip(self), fields(user_id = %user_id, date_key = %date_key))]
    pub async fn sync_external_expenditure(
        &self,
        user_id: &str,
        date_key: &str,
        whoop_cals: i64,
    ) -> AppResult<SyncedExpenditure> {
        validate_user_id(user_id)?;
        parse_date_key(date_key)?;

        let key = DocKey::daily_log(user_id, date_key);
        let extra_cals = match self.store.get(&key).await? {
            Some(doc) => parse_ledger(&doc)?.extra_cals,
            None => 0.0,
        };
        let calories_out = whoop_cals as f64 + extra_cals;
        debug!(whoop_cals, extra_cals, calories_out, "syncing expenditure");

        let mut fields = Map::new();
        fields.insert("whoop_cals".to_owned(), Value::from(whoop_cals as f64));
        fields.insert("calories_out".to_owned(), Value::from(calories_out));
        self.store.merge(&key, fields).await?;

        Ok(SyncedExpenditure {
            whoop_cals,
            calories_out: calories_out.round() as i64,
        })
    }
}

fn parse_ledger(doc: &Value) -> AppResult<DailyLedger> {
    serde_json::from_value(doc.clone())
        .map_err(|e| AppError::storage("stored ledger document is malformed").with_source(e))
}
