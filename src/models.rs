// ABOUTME: Persisted document types for daily ledgers, weight records, and OAuth token sets
// ABOUTME: Field names match the stored JSON layout exactly; numeric fields default to zero
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common data models for the daily ledger core
//!
//! All three document kinds are exclusively owned by the document store; the
//! core holds no in-process durable state. Numeric ledger fields carry
//! `#[serde(default)]` so partially merge-created documents (an expenditure
//! sync can create a ledger before any nutrition entry lands) deserialize
//! cleanly with zeroed totals.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parse and validate a `yyyy-MM-dd` calendar date key.
///
/// # Errors
///
/// Returns `InvalidArgument` when the key is empty or not a valid calendar date.
pub fn parse_date_key(date_key: &str) -> AppResult<NaiveDate> {
    if date_key.is_empty() {
        return Err(AppError::invalid_argument("date key must not be empty"));
    }
    NaiveDate::parse_from_str(date_key, "%Y-%m-%d").map_err(|e| {
        AppError::invalid_argument(format!("invalid date key '{date_key}'")).with_source(e)
    })
}

/// Validate a user identifier supplied by the (out of scope) request layer.
///
/// # Errors
///
/// Returns `InvalidArgument` when the identifier is empty.
pub fn validate_user_id(user_id: &str) -> AppResult<()> {
    if user_id.is_empty() {
        return Err(AppError::invalid_argument("user id must not be empty"));
    }
    Ok(())
}

/// A single nutrition entry as submitted by the client.
///
/// The four macro fields may each be absent (treated as zero when
/// accumulating); everything else the client attached rides along in
/// `metadata` and is preserved verbatim in the ledger's `meals` log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionEntry {
    /// Energy content in kilocalories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Protein in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    /// Carbohydrates in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    /// Fat in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    /// Arbitrary descriptive fields (name, portion, timestamps, ...)
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, Value>,
}

impl NutritionEntry {
    /// Entry with only a calorie figure
    #[must_use]
    pub fn with_calories(calories: f64) -> Self {
        Self {
            calories: Some(calories),
            protein: None,
            carbs: None,
            fat: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub(crate) fn calories_or_zero(&self) -> f64 {
        self.calories.unwrap_or(0.0)
    }

    pub(crate) fn protein_or_zero(&self) -> f64 {
        self.protein.unwrap_or(0.0)
    }

    pub(crate) fn carbs_or_zero(&self) -> f64 {
        self.carbs.unwrap_or(0.0)
    }

    pub(crate) fn fat_or_zero(&self) -> f64 {
        self.fat.unwrap_or(0.0)
    }
}

/// One ledger document per user per day, created lazily on first nutrition
/// entry (or partially by an expenditure sync merge).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DailyLedger {
    /// Calendar date key (`yyyy-MM-dd`)
    #[serde(default)]
    pub date: String,
    /// Running total of consumed kilocalories
    #[serde(default)]
    pub calories_in: f64,
    /// Running total of protein grams
    #[serde(default)]
    pub protein: f64,
    /// Running total of carbohydrate grams
    #[serde(default)]
    pub carbs: f64,
    /// Running total of fat grams
    #[serde(default)]
    pub fat: f64,
    /// Append-only, order-preserving log of raw entries (not deduplicated)
    #[serde(default)]
    pub meals: Vec<NutritionEntry>,
    /// Externally sourced expenditure estimate, overwritten on each sync
    #[serde(default)]
    pub whoop_cals: f64,
    /// Locally tracked additive expenditure adjustment
    #[serde(default)]
    pub extra_cals: f64,
    /// `whoop_cals + extra_cals`, recomputed on every sync
    #[serde(default)]
    pub calories_out: f64,
    /// Reserved; persisted but not recomputed by this core
    #[serde(default)]
    pub net_calories: f64,
}

/// At most one weight measurement per user per day. There is no update path;
/// correction requires an explicit out-of-scope deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRecord {
    /// Midnight UTC timestamp derived from the calendar date key
    pub date: DateTime<Utc>,
    /// Measured weight, positive and finite
    pub weight: f64,
}

/// Stored OAuth token set for a user's external-service integration.
///
/// Created on successful authorization-code exchange, mutated in place on
/// every refresh, never deleted by this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationTokenSet {
    /// Opaque bearer credential
    pub access_token: String,
    /// Opaque credential used to mint a new access token; the provider may
    /// choose not to rotate it on refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Absolute epoch-millisecond expiry of `access_token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Last-write timestamp, epoch milliseconds
    #[serde(default)]
    pub updated_at: i64,
}

impl IntegrationTokenSet {
    /// Whether the stored access token can still be used at `now_millis`,
    /// honoring the expiry safety margin.
    #[must_use]
    pub fn is_fresh_at(&self, now_millis: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            now_millis < expires_at - crate::constants::time::TOKEN_EXPIRY_MARGIN_MILLIS
        })
    }
}
