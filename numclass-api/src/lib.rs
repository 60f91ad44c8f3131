//! numclass-api library interface
//!
//! Number classification service: classifies an integer and attaches a
//! best-effort fun fact from an external trivia source.

pub mod api;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::any::Any as PanicPayload;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::Enricher;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Fun fact enrichment coordinator
    pub enricher: Arc<Enricher>,
    /// Service startup time for uptime reporting
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(enricher: Enricher) -> Self {
        Self {
            enricher: Arc::new(enricher),
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let routes = Router::new()
        .route("/api/classify-number", get(api::classify_number))
        .route("/api/fun-fact/:ticket", get(api::get_fun_fact))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .with_state(state);

    with_service_layers(routes)
}

/// Wrap routes with panic recovery, request tracing and CORS
///
/// CORS is permissive for reads: any origin, GET only, any header. A handler
/// panic becomes the generic JSON 500 instead of a dropped connection.
pub fn with_service_layers(router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn panic_response(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}
