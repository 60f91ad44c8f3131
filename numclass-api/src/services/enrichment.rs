//! Enrichment coordinator
//!
//! Attaches a fun fact to a classification without letting the trivia
//! source's failures become the caller's failures. Every fetch runs under an
//! explicit budget; timeouts and transport errors degrade to fixed fallback
//! text and are never surfaced as request errors.
//!
//! # Delivery policies
//!
//! - **Inline** (default): await the fetch, bounded by the budget.
//! - **FailFast**: same as inline with a very short budget; fallback text is
//!   an expected steady-state outcome.
//! - **Deferred**: respond with `"Fetching..."` and a ticket; a spawned task
//!   performs the bounded fetch and stores the outcome for polling.
//! - **Pool**: like deferred, but the fetch runs on the bounded
//!   [`WorkerPool`]. A saturated pool skips the fetch and the response
//!   carries the fallback text directly.
//!
//! # Attempt lifecycle
//!
//! `Idle → InFlight → {Succeeded, TimedOut, TransportFailed}`. Terminal
//! states are final; the only extension is a single optional retry after a
//! retryable transport failure, inside the same budget.

use numclass_common::{ClassificationResult, DeliveryPolicy, TriviaConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::fact_store::FactStore;
use super::trivia_client::{TriviaError, TriviaSource};
use super::worker_pool::{FetchJob, PoolError, WorkerPool};

/// Fallback after a transport failure, non-2xx status or unusable body
pub const FALLBACK_NOT_FOUND: &str = "No fun fact found.";

/// Fallback after the budget expires
pub const FALLBACK_TIMEOUT: &str = "No fun fact available (timeout).";

/// Placeholder while a background fetch is outstanding
pub const FETCHING_PLACEHOLDER: &str = "Fetching...";

/// State of a single enrichment attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    InFlight,
    Succeeded(String),
    TimedOut,
    TransportFailed(String),
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Succeeded(_) | AttemptState::TimedOut | AttemptState::TransportFailed(_)
        )
    }

    /// Caller-visible text for a terminal state
    pub fn fun_fact(&self) -> Option<&str> {
        match self {
            AttemptState::Succeeded(text) => Some(text),
            AttemptState::TimedOut => Some(FALLBACK_TIMEOUT),
            AttemptState::TransportFailed(_) => Some(FALLBACK_NOT_FOUND),
            AttemptState::Idle | AttemptState::InFlight => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttemptState::Idle => "idle",
            AttemptState::InFlight => "in_flight",
            AttemptState::Succeeded(_) => "succeeded",
            AttemptState::TimedOut => "timed_out",
            AttemptState::TransportFailed(_) => "transport_failed",
        }
    }
}

/// Result of enriching one classification
#[derive(Debug, Clone)]
pub struct EnrichedOutcome {
    /// Classification with `fun_fact` filled in (or the fetching placeholder)
    pub result: ClassificationResult,
    /// Attempt state as of the response; `InFlight` for background delivery
    pub state: AttemptState,
    /// Poll ticket when the fact is delivered later
    pub ticket: Option<Uuid>,
}

/// Run one bounded fetch to a terminal state
///
/// The fetch future is dropped when the budget expires, which cancels the
/// outbound request.
pub async fn attempt(
    source: &dyn TriviaSource,
    number: i64,
    budget: Duration,
    retries: u32,
) -> AttemptState {
    let started = Instant::now();

    let fetch = async {
        let mut retries_left = retries;
        loop {
            match source.fetch(number).await {
                Err(e) if retries_left > 0 && e.is_retryable() => {
                    retries_left -= 1;
                    debug!(number, error = %e, "Retrying trivia fetch");
                }
                other => break other,
            }
        }
    };

    let state = match tokio::time::timeout(budget, fetch).await {
        Ok(Ok(text)) => AttemptState::Succeeded(text),
        Ok(Err(TriviaError::Timeout)) | Err(_) => AttemptState::TimedOut,
        Ok(Err(e)) => AttemptState::TransportFailed(e.to_string()),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &state {
        AttemptState::Succeeded(_) => {
            debug!(number, source = source.source_id(), elapsed_ms, "Fun fact fetched");
        }
        AttemptState::TimedOut => {
            warn!(
                number,
                source = source.source_id(),
                budget_ms = budget.as_millis() as u64,
                elapsed_ms,
                "Fun fact fetch timed out"
            );
        }
        AttemptState::TransportFailed(reason) => {
            warn!(
                number,
                source = source.source_id(),
                reason = %reason,
                elapsed_ms,
                "Fun fact fetch failed"
            );
        }
        AttemptState::Idle | AttemptState::InFlight => {}
    }

    state
}

/// Coordinates fun fact delivery for classification requests
pub struct Enricher {
    source: Arc<dyn TriviaSource>,
    config: TriviaConfig,
    store: FactStore,
    pool: Option<WorkerPool>,
}

impl Enricher {
    /// Create a coordinator for the configured policy
    ///
    /// The worker pool is only started for [`DeliveryPolicy::Pool`], so this
    /// must run inside a Tokio runtime in that case.
    pub fn new(source: Arc<dyn TriviaSource>, config: TriviaConfig) -> Self {
        let store = FactStore::new(config.ticket_ttl());
        let pool = (config.policy == DeliveryPolicy::Pool).then(|| {
            WorkerPool::new(
                config.effective_pool_size(),
                config.effective_queue_capacity(),
                Arc::clone(&source),
                store.clone(),
            )
        });

        Self {
            source,
            config,
            store,
            pool,
        }
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.config.policy
    }

    /// Budget applied by the configured policy
    pub fn budget(&self) -> Duration {
        self.config.budget()
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Enrich using the configured policy and budget
    pub async fn enrich(&self, result: ClassificationResult) -> EnrichedOutcome {
        self.enrich_with(result, self.config.policy, self.config.budget())
            .await
    }

    /// Enrich with an explicit policy and budget
    ///
    /// `Pool` falls back to `Deferred` when no pool was started.
    pub async fn enrich_with(
        &self,
        result: ClassificationResult,
        policy: DeliveryPolicy,
        budget: Duration,
    ) -> EnrichedOutcome {
        let number = result.number;
        let retries = self.config.effective_retries();

        match policy {
            DeliveryPolicy::Inline | DeliveryPolicy::FailFast => {
                let state = attempt(self.source.as_ref(), number, budget, retries).await;
                Self::finished(result, state)
            }
            DeliveryPolicy::Pool if self.pool.is_some() => {
                self.enqueue(result, budget, retries).await
            }
            DeliveryPolicy::Deferred | DeliveryPolicy::Pool => {
                self.spawn_deferred(result, budget, retries).await
            }
        }
    }

    /// Stop background workers
    pub fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.shutdown();
        }
    }

    fn finished(result: ClassificationResult, state: AttemptState) -> EnrichedOutcome {
        let text = state.fun_fact().unwrap_or(FALLBACK_NOT_FOUND).to_string();
        EnrichedOutcome {
            result: result.with_fun_fact(text),
            state,
            ticket: None,
        }
    }

    fn pending(result: ClassificationResult, ticket: Uuid) -> EnrichedOutcome {
        EnrichedOutcome {
            result: result.with_fun_fact(FETCHING_PLACEHOLDER),
            state: AttemptState::InFlight,
            ticket: Some(ticket),
        }
    }

    async fn spawn_deferred(
        &self,
        result: ClassificationResult,
        budget: Duration,
        retries: u32,
    ) -> EnrichedOutcome {
        let number = result.number;
        let ticket = self.store.insert_pending(number).await;
        let source = Arc::clone(&self.source);
        let store = self.store.clone();

        tokio::spawn(async move {
            let state = attempt(source.as_ref(), number, budget, retries).await;
            if !store.resolve(ticket, state).await {
                debug!(ticket = %ticket, "Ticket expired before fetch completed");
            }
        });

        Self::pending(result, ticket)
    }

    async fn enqueue(
        &self,
        result: ClassificationResult,
        budget: Duration,
        retries: u32,
    ) -> EnrichedOutcome {
        let Some(pool) = &self.pool else {
            return self.spawn_deferred(result, budget, retries).await;
        };

        let number = result.number;
        let ticket = self.store.insert_pending(number).await;
        let job = FetchJob {
            ticket,
            number,
            budget,
            retries,
        };

        match pool.submit(job) {
            Ok(()) => Self::pending(result, ticket),
            Err(e) => {
                self.store.remove(ticket).await;
                match e {
                    PoolError::Saturated => {
                        warn!(number, "Trivia worker pool saturated, skipping fun fact")
                    }
                    PoolError::Closed => {
                        warn!(number, "Trivia worker pool closed, skipping fun fact")
                    }
                }
                Self::finished(result, AttemptState::TransportFailed(e.to_string()))
            }
        }
    }
}

impl Drop for Enricher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
