//! Deferred fun fact polling endpoint
//!
//! GET /api/fun-fact/{ticket}
//!
//! Only meaningful under the deferred and pool delivery policies. Unknown,
//! malformed and expired tickets all answer 404.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::FactSnapshot;
use crate::AppState;

/// GET /api/fun-fact/:ticket
pub async fn get_fun_fact(
    State(state): State<AppState>,
    Path(ticket): Path<String>,
) -> ApiResult<Json<FactSnapshot>> {
    let ticket = Uuid::parse_str(&ticket)
        .map_err(|_| ApiError::NotFound(format!("Unknown ticket: {}", ticket)))?;

    state
        .enricher
        .store()
        .get(ticket)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown ticket: {}", ticket)))
}
