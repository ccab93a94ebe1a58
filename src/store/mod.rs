// ABOUTME: Document store abstraction: keyed documents with atomic transactions and merge writes
// ABOUTME: The core depends only on these semantics, never on a concrete database client
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document store abstraction layer
//!
//! The store is the only shared mutable resource in the system. It exposes
//! exactly the three semantics the core depends on: keyed reads, atomic
//! read-modify-write transactions, and partial merge writes. A production
//! deployment plugs in a real document database behind [`DocumentStore`];
//! [`memory::MemoryStore`] provides the reference semantics and the test
//! backend.

pub mod memory;

use crate::errors::AppResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// Hierarchical key addressing one document: `users/{user}/{collection}/{doc}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    user_id: String,
    collection: &'static str,
    doc_id: String,
}

impl DocKey {
    /// Key of the per-day nutrition/expenditure ledger document
    #[must_use]
    pub fn daily_log(user_id: &str, date_key: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            collection: "dailyLogs",
            doc_id: date_key.to_owned(),
        }
    }

    /// Key of the per-day weight record document
    #[must_use]
    pub fn weight_log(user_id: &str, date_key: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            collection: "weightLogs",
            doc_id: date_key.to_owned(),
        }
    }

    /// Key of the stored token set for one external-service integration
    #[must_use]
    pub fn integration(user_id: &str, service: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            collection: "integrations",
            doc_id: service.to_owned(),
        }
    }

    /// Full document path
    #[must_use]
    pub fn path(&self) -> String {
        format!("users/{}/{}/{}", self.user_id, self.collection, self.doc_id)
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Transaction body: receives the current document (or `None` when absent)
/// and returns the full replacement document to commit.
///
/// The store may run the body more than once when a concurrent writer wins
/// the commit race, so it must be free of side effects beyond its return
/// value. Returning an error aborts the transaction without writing.
pub type TxnFn<'a> = &'a mut (dyn FnMut(Option<&Value>) -> AppResult<Value> + Send);

/// Keyed, hierarchical document database with per-document atomic
/// transactions and partial merge writes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document, `None` when absent.
    async fn get(&self, key: &DocKey) -> AppResult<Option<Value>>;

    /// Run `apply` against a consistent snapshot of the document and commit
    /// its result atomically. Conflicting concurrent commits re-run `apply`
    /// against the new snapshot (bounded retries); a conflict is never
    /// reported as success.
    async fn transact(&self, key: &DocKey, apply: TxnFn<'_>) -> AppResult<()>;

    /// Shallow partial write: sets exactly `fields` on the document, creating
    /// it if absent and leaving unspecified fields untouched.
    async fn merge(&self, key: &DocKey, fields: Map<String, Value>) -> AppResult<()>;
}
