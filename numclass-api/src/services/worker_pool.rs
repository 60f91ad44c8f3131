//! Bounded fetch worker pool
//!
//! A fixed number of async workers drain a bounded job queue. The pool size
//! caps concurrent outbound trivia calls; the queue caps pending work.
//!
//! **Back-pressure:** reject-new. When the queue is full, [`WorkerPool::submit`]
//! fails immediately and the caller decides what to show instead.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::enrichment::attempt;
use super::fact_store::FactStore;
use super::trivia_client::TriviaSource;

/// One deferred fetch
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub ticket: Uuid,
    pub number: i64,
    pub budget: Duration,
    pub retries: u32,
}

/// Job submission errors
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Queue is at capacity
    #[error("Worker pool saturated")]
    Saturated,

    /// Pool has been shut down
    #[error("Worker pool closed")]
    Closed,
}

/// Fixed-size pool of trivia fetch workers
pub struct WorkerPool {
    sender: mpsc::Sender<FetchJob>,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers sharing a queue of `capacity` jobs
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        size: usize,
        capacity: usize,
        source: Arc<dyn TriviaSource>,
        store: FactStore,
    ) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let cancel = CancellationToken::new();

        let workers = (0..size)
            .map(|worker_id| {
                tokio::spawn(Self::worker_loop(
                    worker_id,
                    Arc::clone(&receiver),
                    Arc::clone(&source),
                    store.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        info!(size, capacity, "Trivia worker pool started");

        Self {
            sender,
            cancel,
            workers,
        }
    }

    /// Queue a job without waiting
    pub fn submit(&self, job: FetchJob) -> Result<(), PoolError> {
        if self.cancel.is_cancelled() {
            return Err(PoolError::Closed);
        }
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PoolError::Saturated,
            mpsc::error::TrySendError::Closed(_) => PoolError::Closed,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Stop all workers; queued jobs are abandoned
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("Stopping trivia worker pool");
            self.cancel.cancel();
        }
    }

    async fn worker_loop(
        worker_id: usize,
        receiver: Arc<Mutex<mpsc::Receiver<FetchJob>>>,
        source: Arc<dyn TriviaSource>,
        store: FactStore,
        cancel: CancellationToken,
    ) {
        debug!(worker_id, "Trivia worker started");

        loop {
            let job = tokio::select! {
                _ = cancel.cancelled() => break,
                job = async { receiver.lock().await.recv().await } => job,
            };

            let Some(job) = job else { break };

            // Cancellation abandons an in-flight fetch as well
            let state = tokio::select! {
                _ = cancel.cancelled() => break,
                state = attempt(source.as_ref(), job.number, job.budget, job.retries) => state,
            };

            if !store.resolve(job.ticket, state).await {
                debug!(worker_id, ticket = %job.ticket, "Ticket expired before fetch completed");
            }
        }

        debug!(worker_id, "Trivia worker stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fact_store::FactStatus;
    use crate::services::trivia_client::TriviaError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Holds each fetch for `delay` and tracks peak concurrency
    struct GatedSource {
        delay: Duration,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl GatedSource {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TriviaSource for GatedSource {
        fn source_id(&self) -> &'static str {
            "gated"
        }

        async fn fetch(&self, number: i64) -> Result<String, TriviaError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("{} is a number.", number))
        }
    }

    fn job(ticket: Uuid, number: i64) -> FetchJob {
        FetchJob {
            ticket,
            number,
            budget: Duration::from_secs(2),
            retries: 0,
        }
    }

    #[tokio::test]
    async fn test_jobs_resolve_tickets() {
        let store = FactStore::new(Duration::from_secs(60));
        let source = Arc::new(GatedSource::new(Duration::from_millis(5)));
        let pool = WorkerPool::new(2, 8, source, store.clone());

        let ticket = store.insert_pending(9).await;
        pool.submit(job(ticket, 9)).unwrap();

        for _ in 0..100 {
            if store.get(ticket).await.unwrap().status == FactStatus::Ready {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.get(ticket).await.unwrap().fun_fact, "9 is a number.");
    }

    #[tokio::test]
    async fn test_pool_size_bounds_concurrency() {
        let store = FactStore::new(Duration::from_secs(60));
        let source = Arc::new(GatedSource::new(Duration::from_millis(30)));
        let pool = WorkerPool::new(2, 16, Arc::clone(&source) as Arc<dyn TriviaSource>, store.clone());
        assert_eq!(pool.size(), 2);

        let mut tickets = Vec::new();
        for n in 0..6 {
            let ticket = store.insert_pending(n).await;
            pool.submit(job(ticket, n)).unwrap();
            tickets.push(ticket);
        }

        for _ in 0..200 {
            let mut all_ready = true;
            for t in &tickets {
                if store.get(*t).await.unwrap().status != FactStatus::Ready {
                    all_ready = false;
                }
            }
            if all_ready {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(source.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_new_jobs() {
        let store = FactStore::new(Duration::from_secs(60));
        let source = Arc::new(GatedSource::new(Duration::from_secs(5)));
        let pool = WorkerPool::new(1, 1, source, store.clone());

        // First job occupies the worker, second fills the queue
        pool.submit(job(Uuid::new_v4(), 1)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        pool.submit(job(Uuid::new_v4(), 2)).unwrap();

        assert_eq!(pool.submit(job(Uuid::new_v4(), 3)), Err(PoolError::Saturated));
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_closed() {
        let store = FactStore::new(Duration::from_secs(60));
        let source = Arc::new(GatedSource::new(Duration::from_millis(1)));
        let pool = WorkerPool::new(1, 4, source, store);

        pool.shutdown();
        assert_eq!(pool.submit(job(Uuid::new_v4(), 1)), Err(PoolError::Closed));
    }
}
