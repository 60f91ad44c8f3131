//! Number classification endpoint
//!
//! GET /api/classify-number?number=<token>
//!
//! A syntactically valid integer always yields a complete classification
//! with HTTP 200. The fun fact degrades to fallback text when the trivia
//! source is slow or unavailable; it never turns the request into an error.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use numclass_common::{classify, parse_number_token, ClassificationResult};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Header carrying the poll URL for background delivery
pub const FUN_FACT_LOCATION_HEADER: &str = "x-fun-fact-location";

/// Query parameter carrying the number token
pub const NUMBER_PARAM: &str = "number";

/// Pick the `number` token out of raw query pairs
///
/// A repeated key resolves to its last value. A missing key, or a query
/// string that cannot be decoded at all, yields an empty (invalid) token.
fn number_token(query: Result<Query<Vec<(String, String)>>, QueryRejection>) -> String {
    match query {
        Ok(Query(pairs)) => pairs
            .into_iter()
            .rev()
            .find(|(key, _)| key == NUMBER_PARAM)
            .map(|(_, value)| value)
            .unwrap_or_default(),
        Err(rejection) => {
            debug!(error = %rejection, "Undecodable query string");
            String::new()
        }
    }
}

/// Classification response
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    #[serde(flatten)]
    pub result: ClassificationResult,

    /// Poll URL for the fun fact, present only for background delivery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fun_fact_url: Option<String>,
}

/// Poll path for a deferred fun fact ticket
pub fn fun_fact_path(ticket: &uuid::Uuid) -> String {
    format!("/api/fun-fact/{}", ticket)
}

/// Run CPU-bound work on the blocking pool
///
/// A panic inside `work` becomes [`ApiError::Internal`].
pub(crate) async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("classification task failed: {}", e)))
}

/// GET /api/classify-number
pub async fn classify_number(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Response> {
    let raw = number_token(query);

    let number = parse_number_token(&raw).map_err(|e| {
        debug!(raw = %raw, error = %e, "Rejected number token");
        ApiError::InvalidNumber { raw: raw.clone() }
    })?;

    // Trial division on large inputs is CPU-bound
    let result = run_blocking(move || classify(number)).await?;

    let outcome = state.enricher.enrich(result).await;

    info!(
        number,
        policy = %state.enricher.policy(),
        fun_fact = outcome.state.label(),
        "Classified number"
    );

    let fun_fact_url = outcome.ticket.as_ref().map(fun_fact_path);
    let location = fun_fact_url
        .as_deref()
        .and_then(|url| HeaderValue::from_str(url).ok());

    let mut response = Json(ClassifyResponse {
        result: outcome.result,
        fun_fact_url,
    })
    .into_response();

    if let Some(value) = location {
        response
            .headers_mut()
            .insert(HeaderName::from_static(FUN_FACT_LOCATION_HEADER), value);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn pairs(items: &[(&str, &str)]) -> Result<Query<Vec<(String, String)>>, QueryRejection> {
        Ok(Query(
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn test_number_token_last_value_wins() {
        assert_eq!(number_token(pairs(&[("number", "1"), ("number", "2")])), "2");
        assert_eq!(number_token(pairs(&[("number", "7"), ("other", "x")])), "7");
    }

    #[test]
    fn test_number_token_missing_is_empty() {
        assert_eq!(number_token(pairs(&[])), "");
        assert_eq!(number_token(pairs(&[("num", "5")])), "");
    }

    #[tokio::test]
    async fn test_run_blocking_returns_value() {
        assert_eq!(run_blocking(|| 6 * 7).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_panicking_classification_is_generic_500() {
        let err = run_blocking(|| -> ClassificationResult { panic!("digit table corrupted") })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], true);
        assert!(body.get("number").is_none());
        assert!(body.get("is_prime").is_none());
        assert!(!body.to_string().contains("digit table"));
    }
}
