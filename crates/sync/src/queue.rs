//! Mutation queue manager.
//!
//! Mutations attempted while offline are persisted to the durable store and
//! replayed in enqueue order once a sync trigger fires. Two independent
//! events request a drain - the deferred-sync trigger registered at enqueue
//! time, and the connectivity-restored signal - and they may race; drains
//! from the same queue instance serialize on an internal lock, and the
//! per-item delete-before-advance rule keeps a drain from another process
//! (a second tab sharing the store) from double-applying an operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::Method;
use tokio::sync::{Mutex, Notify};
use tracing::{error, info, instrument, warn};

use crate::error::StoreError;
use crate::net::HttpBackend;
use crate::store::{OperationStore, QueuedOperation};

/// Outcome counts for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Operations replayed successfully and deleted from the store.
    pub replayed: usize,
    /// Operations left in the store for a future drain.
    pub failed: usize,
}

/// Queue of offline mutations with FIFO replay.
///
/// Service object: storage and network are constructor-injected; construct
/// fresh instances per test case.
pub struct MutationQueue<B> {
    store: Arc<OperationStore>,
    backend: Arc<B>,
    drain_lock: Mutex<()>,
    trigger: Notify,
}

impl<B: HttpBackend> MutationQueue<B> {
    /// Create a queue over a store and network backend.
    pub fn new(store: Arc<OperationStore>, backend: Arc<B>) -> Self {
        Self {
            store,
            backend,
            drain_lock: Mutex::new(()),
            trigger: Notify::new(),
        }
    }

    /// Persist a mutation for later replay and register a deferred sync.
    ///
    /// Non-blocking beyond the store append: the caller can immediately tell
    /// the user the action will apply when back online.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable; the mutation is
    /// lost (and logged), never silently duplicated.
    #[instrument(skip(self, headers, body))]
    pub async fn enqueue(
        &self,
        method: Method,
        url: &str,
        headers: BTreeMap<String, String>,
        body: Option<String>,
    ) -> Result<QueuedOperation, StoreError> {
        let operation = self.store.append(&method, url, headers, body).await?;
        info!(
            id = operation.id,
            "queued offline mutation; will apply when back online"
        );
        self.trigger.notify_one();
        Ok(operation)
    }

    /// Request a drain. Called by the deferred-sync trigger and by whoever
    /// observes connectivity returning; both collapse into one wakeup.
    pub fn request_sync(&self) {
        self.trigger.notify_one();
    }

    /// Wait until a sync has been requested (background worker use).
    pub async fn wait_for_sync_request(&self) {
        self.trigger.notified().await;
    }

    /// Replay all pending operations in enqueue order.
    ///
    /// Each operation replays with its exact method, URL, headers, and body.
    /// HTTP success deletes the operation from the store *before* advancing
    /// to the next one; any failure leaves it queued and moves on. Draining
    /// an empty queue touches neither the store beyond a read nor the
    /// network.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for store-level failures; network and
    /// HTTP failures are absorbed into the report.
    #[instrument(skip(self))]
    pub async fn drain(&self) -> Result<DrainReport, StoreError> {
        let _guard = self.drain_lock.lock().await;

        let pending = self.store.pending()?;
        let mut report = DrainReport::default();

        for operation in pending {
            let outbound = match operation.outbound() {
                Ok(outbound) => outbound,
                Err(e) => {
                    warn!(id = operation.id, error = %e, "operation cannot be replayed; leaving it queued");
                    report.failed += 1;
                    continue;
                }
            };

            match self.backend.execute(&outbound).await {
                Ok(response) if response.is_success() => {
                    // Delete before moving on, so a concurrent drain that
                    // re-reads the store never sees this operation again.
                    self.store.remove(operation.id).await?;
                    report.replayed += 1;
                }
                Ok(response) => {
                    warn!(
                        id = operation.id,
                        status = %response.status,
                        "replay rejected; keeping operation for a future drain"
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(
                        id = operation.id,
                        error = %e,
                        "replay failed; keeping operation for a future drain"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Number of operations awaiting replay.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.store.len()
    }
}

/// Spawn the background replay worker.
///
/// The worker lives for the life of the process (teardown never): it waits
/// for sync requests and drains, logging and continuing on failure.
pub fn spawn_worker<B>(queue: Arc<MutationQueue<B>>) -> tokio::task::JoinHandle<()>
where
    B: HttpBackend + 'static,
{
    tokio::spawn(async move {
        loop {
            queue.wait_for_sync_request().await;
            match queue.drain().await {
                Ok(report) if report.replayed > 0 || report.failed > 0 => {
                    info!(
                        replayed = report.replayed,
                        failed = report.failed,
                        "background drain finished"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "background drain failed"),
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::net::OutboundRequest;
    use crate::response::FetchResponse;
    use http::StatusCode;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Scripted backend: records calls, optionally offline, optionally
    /// rejecting specific URLs with a 503.
    #[derive(Default)]
    struct ScriptedBackend {
        online: AtomicBool,
        reject: StdMutex<Vec<String>>,
        calls: StdMutex<Vec<OutboundRequest>>,
        delay: Option<Duration>,
    }

    impl ScriptedBackend {
        fn online() -> Self {
            let backend = Self::default();
            backend.online.store(true, Ordering::SeqCst);
            backend
        }

        fn offline() -> Self {
            Self::default()
        }

        fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }

        fn reject_url(&self, url: &str) {
            self.reject.lock().unwrap().push(url.to_string());
        }

        fn calls(&self) -> Vec<OutboundRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl HttpBackend for ScriptedBackend {
        async fn execute(
            &self,
            request: &OutboundRequest,
        ) -> Result<FetchResponse, crate::error::NetworkError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if !self.online.load(Ordering::SeqCst) {
                return Err(crate::error::NetworkError::Unreachable(None));
            }
            self.calls.lock().unwrap().push(request.clone());
            if self.reject.lock().unwrap().contains(&request.url) {
                return Ok(FetchResponse::network(
                    StatusCode::SERVICE_UNAVAILABLE,
                    BTreeMap::new(),
                    Vec::new(),
                ));
            }
            Ok(FetchResponse::ok("application/json", "{}"))
        }
    }

    fn queue_with(backend: ScriptedBackend) -> MutationQueue<ScriptedBackend> {
        let store = Arc::new(OperationStore::temporary().unwrap());
        MutationQueue::new(store, Arc::new(backend))
    }

    async fn enqueue(queue: &MutationQueue<ScriptedBackend>, method: Method, url: &str) {
        queue
            .enqueue(method, url, BTreeMap::new(), Some("{}".to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_drain_replays_in_fifo_order() {
        let queue = queue_with(ScriptedBackend::online());
        enqueue(&queue, Method::POST, "/api/cart/add").await;
        enqueue(&queue, Method::PUT, "/api/cart/update/1").await;

        let report = queue.drain().await.unwrap();

        assert_eq!(report, DrainReport { replayed: 2, failed: 0 });
        assert_eq!(queue.pending_len(), 0);
        let urls: Vec<String> = queue
            .backend
            .calls()
            .into_iter()
            .map(|c| c.url)
            .collect();
        assert_eq!(urls, vec!["/api/cart/add", "/api/cart/update/1"]);
    }

    #[tokio::test]
    async fn test_drain_of_empty_queue_is_a_no_op() {
        let queue = queue_with(ScriptedBackend::online());

        let first = queue.drain().await.unwrap();
        let second = queue.drain().await.unwrap();

        assert_eq!(first, DrainReport::default());
        assert_eq!(second, DrainReport::default());
        assert!(queue.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_replay_stays_queued_and_retries_later() {
        let backend = ScriptedBackend::offline();
        let queue = queue_with(backend);
        enqueue(&queue, Method::POST, "/api/cart/add").await;

        let report = queue.drain().await.unwrap();
        assert_eq!(report, DrainReport { replayed: 0, failed: 1 });
        assert_eq!(queue.pending_len(), 1);

        queue.backend.set_online(true);
        let report = queue.drain().await.unwrap();
        assert_eq!(report, DrainReport { replayed: 1, failed: 0 });
        assert_eq!(queue.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_rejected_replay_is_kept_and_drain_continues() {
        let backend = ScriptedBackend::online();
        backend.reject_url("/api/cart/add");
        let queue = queue_with(backend);
        enqueue(&queue, Method::POST, "/api/cart/add").await;
        enqueue(&queue, Method::DELETE, "/api/cart/clear").await;

        let report = queue.drain().await.unwrap();

        assert_eq!(report, DrainReport { replayed: 1, failed: 1 });
        let remaining = queue.store.pending().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            remaining.first().map(|op| op.url.as_str()),
            Some("/api/cart/add")
        );
    }

    #[tokio::test]
    async fn test_overlapping_drains_apply_each_operation_once() {
        let backend = ScriptedBackend {
            delay: Some(Duration::from_millis(10)),
            ..ScriptedBackend::default()
        };
        backend.set_online(true);
        let queue = Arc::new(queue_with(backend));
        enqueue(&queue, Method::POST, "/api/cart/add").await;

        let (a, b) = tokio::join!(queue.drain(), queue.drain());

        let total = a.unwrap().replayed + b.unwrap().replayed;
        assert_eq!(total, 1);
        assert_eq!(queue.backend.calls().len(), 1);
        assert_eq!(queue.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_worker_drains_on_enqueue_trigger() {
        let queue = Arc::new(queue_with(ScriptedBackend::online()));
        let worker = spawn_worker(Arc::clone(&queue));

        enqueue(&queue, Method::POST, "/api/cart/add").await;

        // The enqueue trigger wakes the worker; wait for it to finish.
        for _ in 0..50 {
            if queue.pending_len() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(queue.pending_len(), 0);
        worker.abort();
    }
}
