// ABOUTME: In-memory document store with versioned optimistic-concurrency commits
// ABOUTME: Reference implementation of the store semantics; backs all integration tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{DocKey, DocumentStore, TxnFn};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Upper bound on transaction re-runs before the conflict surfaces to the
/// caller as a storage error instead of being retried forever.
const MAX_TXN_ATTEMPTS: u32 = 16;

#[derive(Debug, Clone)]
struct VersionedDoc {
    version: u64,
    value: Value,
}

/// In-memory [`DocumentStore`] with compare-and-swap commits.
///
/// Every document carries a version counter; a transaction snapshots the
/// version, runs the body, and commits only if the version is unchanged,
/// otherwise the body re-runs against the new snapshot. This mirrors the
/// conflict-retry contract the core expects from a real document database.
#[derive(Default)]
pub struct MemoryStore {
    docs: DashMap<String, VersionedDoc>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one document with its version (`version` 0 = absent)
    fn snapshot(&self, path: &str) -> (u64, Option<Value>) {
        self.docs.get(path).map_or((0, None), |doc| {
            (doc.version, Some(doc.value.clone()))
        })
    }

    /// Commit `value` if the document version still matches `seen_version`.
    fn try_commit(&self, path: &str, seen_version: u64, value: Value) -> bool {
        match self.docs.entry(path.to_owned()) {
            Entry::Occupied(mut entry) => {
                if entry.get().version != seen_version {
                    return false;
                }
                let next = entry.get().version + 1;
                entry.insert(VersionedDoc {
                    version: next,
                    value,
                });
                true
            }
            Entry::Vacant(entry) => {
                if seen_version != 0 {
                    // Document was deleted under us; treat as conflict
                    return false;
                }
                entry.insert(VersionedDoc { version: 1, value });
                true
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &DocKey) -> AppResult<Option<Value>> {
        Ok(self.docs.get(&key.path()).map(|doc| doc.value.clone()))
    }

    async fn transact(&self, key: &DocKey, apply: TxnFn<'_>) -> AppResult<()> {
        let path = key.path();
        for attempt in 1..=MAX_TXN_ATTEMPTS {
            let (version, snapshot) = self.snapshot(&path);
            let updated = apply(snapshot.as_ref())?;
            if self.try_commit(&path, version, updated) {
                return Ok(());
            }
            debug!("transaction conflict on {path}, attempt {attempt}, retrying");
        }
        warn!("transaction on {path} exhausted {MAX_TXN_ATTEMPTS} attempts");
        Err(AppError::storage(format!(
            "transaction contention on {path}"
        )))
    }

    async fn merge(&self, key: &DocKey, fields: Map<String, Value>) -> AppResult<()> {
        let path = key.path();
        for attempt in 1..=MAX_TXN_ATTEMPTS {
            let (version, snapshot) = self.snapshot(&path);
            let mut merged = match snapshot {
                Some(Value::Object(map)) => map,
                Some(other) => {
                    return Err(AppError::storage(format!(
                        "cannot merge into non-object document {path}: {other}"
                    )))
                }
                None => Map::new(),
            };
            for (field, value) in fields.clone() {
                merged.insert(field, value);
            }
            if self.try_commit(&path, version, Value::Object(merged)) {
                return Ok(());
            }
            debug!("merge conflict on {path}, attempt {attempt}, retrying");
        }
        Err(AppError::storage(format!("merge contention on {path}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixture must be an object"),
        }
    }

    #[tokio::test]
    async fn test_merge_creates_and_preserves_unrelated_fields() {
        let store = MemoryStore::new();
        let key = DocKey::daily_log("u1", "2024-01-01");

        store
            .merge(&key, obj(json!({ "a": 1, "b": 2 })))
            .await
            .unwrap();
        store.merge(&key, obj(json!({ "b": 9, "c": 3 }))).await.unwrap();

        let doc = store.get(&key).await.unwrap().unwrap();
        assert_eq!(doc, json!({ "a": 1, "b": 9, "c": 3 }));
    }

    #[tokio::test]
    async fn test_transact_reruns_on_conflict() {
        let store = MemoryStore::new();
        let key = DocKey::daily_log("u1", "2024-01-01");
        let path = key.path();

        let mut runs = 0;
        store
            .transact(&key, &mut |current| {
                runs += 1;
                if runs == 1 {
                    // Simulate a concurrent writer landing between snapshot and commit
                    assert!(store.try_commit(&path, 0, json!({ "n": 1 })));
                    assert!(current.is_none());
                } else {
                    assert_eq!(current.unwrap()["n"], 1);
                }
                Ok(json!({ "n": 2 }))
            })
            .await
            .unwrap();

        assert_eq!(runs, 2);
        let doc = store.get(&key).await.unwrap().unwrap();
        assert_eq!(doc["n"], 2);
    }

    #[tokio::test]
    async fn test_transact_error_aborts_without_writing() {
        let store = MemoryStore::new();
        let key = DocKey::weight_log("u1", "2024-01-01");

        let result = store
            .transact(&key, &mut |_| Err(AppError::already_exists("nope")))
            .await;

        assert!(result.is_err());
        assert!(store.get(&key).await.unwrap().is_none());
    }
}
