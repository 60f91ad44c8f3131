//! Fun fact enrichment services

pub mod enrichment;
pub mod fact_store;
pub mod trivia_client;
pub mod worker_pool;

pub use enrichment::{
    attempt, AttemptState, EnrichedOutcome, Enricher, FALLBACK_NOT_FOUND, FALLBACK_TIMEOUT,
    FETCHING_PLACEHOLDER,
};
pub use fact_store::{FactSnapshot, FactStatus, FactStore};
pub use trivia_client::{NumbersApiClient, TriviaError, TriviaSource};
pub use worker_pool::{FetchJob, PoolError, WorkerPool};
