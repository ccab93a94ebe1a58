// ABOUTME: Library entry point for the macrolog daily-ledger core
// ABOUTME: Transactional nutrition/weight ledgers plus OAuth2 WHOOP expenditure sync
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![deny(unsafe_code)]

//! # Macrolog Core
//!
//! Backend core of a personal health-tracking application. Records nutrition
//! entries and body-weight measurements per user per day, and synchronizes
//! daily energy-expenditure data from WHOOP via OAuth2.
//!
//! Request entry points, credential UI, and client-side caching live outside
//! this crate; they call in with already-validated primitive arguments and
//! receive an [`errors::AppResult`] back.
//!
//! ## Architecture
//!
//! - **Store**: keyed document database seam with atomic transactions and
//!   merge writes ([`store::DocumentStore`])
//! - **Ledger**: per-user-per-day transactional aggregation
//!   ([`ledger::LedgerAggregator`], [`weight::WeightLog`])
//! - **`OAuth2`**: token lifecycle with per-user single-flight refresh
//!   ([`oauth2_client::TokenManager`])
//! - **Providers**: WHOOP cycle-data adapter ([`providers::WhoopClient`])
//! - **Sync**: orchestration with bounded 401 recovery
//!   ([`sync::ExpenditureSync`])

/// Environment-sourced OAuth configuration
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Unified error handling system with standard error codes
pub mod errors;

/// Daily ledger aggregation for nutrition entries and synced expenditure
pub mod ledger;

/// Production logging and structured output
pub mod logging;

/// Common data models for persisted documents
pub mod models;

/// OAuth 2.0 client and token lifecycle management
pub mod oauth2_client;

/// External activity-service adapters
pub mod providers;

/// Document store abstraction layer
pub mod store;

/// Expenditure sync orchestration
pub mod sync;

/// At-most-once daily weight records
pub mod weight;
