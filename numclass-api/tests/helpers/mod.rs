//! Shared test helpers: stub trivia sources and request utilities

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use numclass_api::services::{Enricher, TriviaError, TriviaSource};
use numclass_api::{build_router, AppState};
use numclass_common::{DeliveryPolicy, TriviaConfig};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Answers every number with a fixed sentence after `delay`
pub struct StubSource {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl StubSource {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TriviaSource for StubSource {
    fn source_id(&self) -> &'static str {
        "stub"
    }

    async fn fetch(&self, number: i64) -> Result<String, TriviaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(format!("{} is a stub fact.", number))
    }
}

/// Always fails with an upstream status
pub struct FailingSource;

#[async_trait]
impl TriviaSource for FailingSource {
    fn source_id(&self) -> &'static str {
        "failing"
    }

    async fn fetch(&self, _number: i64) -> Result<String, TriviaError> {
        Err(TriviaError::Status(502))
    }
}

/// Trivia config for tests with a 200ms budget
pub fn test_config(policy: DeliveryPolicy) -> TriviaConfig {
    TriviaConfig {
        policy,
        timeout_ms: 200,
        fail_fast_timeout_ms: 20,
        pool_size: 2,
        queue_capacity: 8,
        ..Default::default()
    }
}

/// Router backed by `source` under `policy`
pub fn app_with(source: Arc<dyn TriviaSource>, policy: DeliveryPolicy) -> axum::Router {
    let enricher = Enricher::new(source, test_config(policy));
    build_router(AppState::new(enricher))
}

/// Router with an instant stub source under the inline policy
pub fn default_app() -> axum::Router {
    app_with(StubSource::new(Duration::ZERO), DeliveryPolicy::Inline)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
