//! Durable operation store.
//!
//! A local, transactional log of queued mutations that survives process
//! restarts. One sled tree holds the queue: keys are big-endian monotonic
//! u64 ids (so iteration order is enqueue order), values are JSON-encoded
//! operation records.
//!
//! Records are never mutated in place; an operation is deleted only after a
//! confirmed-successful replay.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, StoreError};
use crate::net::OutboundRequest;

/// Tree holding the queued mutations.
const QUEUE_TREE: &str = "cart-queue";

/// On-disk record; the id lives in the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct OperationRecord {
    method: String,
    url: String,
    headers: BTreeMap<String, String>,
    body: Option<String>,
    enqueued_at: DateTime<Utc>,
}

/// A queued mutation awaiting replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedOperation {
    /// Monotonic, store-assigned id; replay order is ascending id.
    pub id: u64,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedOperation {
    fn from_record(id: u64, record: OperationRecord) -> Self {
        Self {
            id,
            method: record.method,
            url: record.url,
            headers: record.headers,
            body: record.body,
            enqueued_at: record.enqueued_at,
        }
    }

    /// The exact request to replay for this operation.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidRequest`] if the stored method does not
    /// parse.
    pub fn outbound(&self) -> Result<OutboundRequest, NetworkError> {
        let method = self
            .method
            .parse::<http::Method>()
            .map_err(|_| NetworkError::InvalidRequest(format!("bad method: {}", self.method)))?;
        Ok(OutboundRequest {
            method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }
}

/// Durable FIFO store of queued mutations.
pub struct OperationStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl OperationStore {
    /// Open (or create) a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::Config::new().path(path).open()?;
        Self::with_db(db)
    }

    /// Open an in-memory store that vanishes on drop (tests).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the database cannot be created.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_db(db)
    }

    fn with_db(db: sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree(QUEUE_TREE)?;
        Ok(Self { db, tree })
    }

    /// Append a mutation to the queue, assigning the next monotonic id, and
    /// flush it to disk before returning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be written; the caller
    /// must treat the mutation as lost, never retry-blind (a duplicate would
    /// be worse than a loss).
    pub async fn append(
        &self,
        method: &http::Method,
        url: &str,
        headers: BTreeMap<String, String>,
        body: Option<String>,
    ) -> Result<QueuedOperation, StoreError> {
        let id = self.db.generate_id()?;
        let record = OperationRecord {
            method: method.to_string(),
            url: url.to_string(),
            headers,
            body,
            enqueued_at: Utc::now(),
        };
        self.tree
            .insert(id.to_be_bytes(), serde_json::to_vec(&record)?)?;
        self.tree.flush_async().await?;
        Ok(QueuedOperation::from_record(id, record))
    }

    /// All pending operations in enqueue (FIFO) order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on read or decode failure.
    pub fn pending(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        let mut operations = Vec::new();
        for entry in &self.tree {
            let (key, value) = entry?;
            let Ok(key_bytes) = <[u8; 8]>::try_from(key.as_ref()) else {
                tracing::warn!("skipping malformed queue key of {} bytes", key.len());
                continue;
            };
            let id = u64::from_be_bytes(key_bytes);
            let record: OperationRecord = serde_json::from_slice(&value)?;
            operations.push(QueuedOperation::from_record(id, record));
        }
        Ok(operations)
    }

    /// Delete one operation after a confirmed-successful replay and flush.
    /// Returns whether the operation was still present (a racing drain may
    /// have removed it already).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] on write failure.
    pub async fn remove(&self, id: u64) -> Result<bool, StoreError> {
        let removed = self.tree.remove(id.to_be_bytes())?.is_some();
        self.tree.flush_async().await?;
        Ok(removed)
    }

    /// Number of pending operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use http::Method;

    async fn append_simple(store: &OperationStore, url: &str) -> QueuedOperation {
        store
            .append(&Method::POST, url, BTreeMap::new(), Some("{}".to_string()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_append_assigns_monotonic_ids() {
        let store = OperationStore::temporary().unwrap();
        let a = append_simple(&store, "/api/cart/add").await;
        let b = append_simple(&store, "/api/cart/update/1").await;
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_pending_is_fifo() {
        let store = OperationStore::temporary().unwrap();
        append_simple(&store, "/api/cart/add").await;
        append_simple(&store, "/api/cart/update/1").await;
        append_simple(&store, "/api/cart/remove/1").await;

        let urls: Vec<String> = store
            .pending()
            .unwrap()
            .into_iter()
            .map(|op| op.url)
            .collect();
        assert_eq!(
            urls,
            vec!["/api/cart/add", "/api/cart/update/1", "/api/cart/remove/1"]
        );
    }

    #[tokio::test]
    async fn test_remove_deletes_exactly_one() {
        let store = OperationStore::temporary().unwrap();
        let a = append_simple(&store, "/api/cart/add").await;
        let b = append_simple(&store, "/api/cart/clear").await;

        assert!(store.remove(a.id).await.unwrap());
        assert!(!store.remove(a.id).await.unwrap());

        let remaining = store.pending().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.first().map(|op| op.id), Some(b.id));
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue");

        {
            let store = OperationStore::open(&path).unwrap();
            store
                .append(
                    &Method::PUT,
                    "/api/cart/update/3",
                    BTreeMap::from([("authorization".to_string(), "Bearer t".to_string())]),
                    Some(r#"{"quantity":3}"#.to_string()),
                )
                .await
                .unwrap();
        }

        let store = OperationStore::open(&path).unwrap();
        let pending = store.pending().unwrap();
        assert_eq!(pending.len(), 1);
        let op = pending.into_iter().next().unwrap();
        assert_eq!(op.method, "PUT");
        assert_eq!(op.url, "/api/cart/update/3");
        assert_eq!(op.body.as_deref(), Some(r#"{"quantity":3}"#));
        assert_eq!(
            op.headers.get("authorization").map(String::as_str),
            Some("Bearer t")
        );
    }

    #[tokio::test]
    async fn test_outbound_parses_method() {
        let store = OperationStore::temporary().unwrap();
        let op = store
            .append(&Method::DELETE, "/api/cart/clear", BTreeMap::new(), None)
            .await
            .unwrap();
        let outbound = op.outbound().unwrap();
        assert_eq!(outbound.method, Method::DELETE);
        assert!(outbound.body.is_none());
    }
}
