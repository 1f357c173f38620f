//! POST /api/query: answers a student's question from the database.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use tracing::{error, info, instrument, warn};

use crate::{
    app::{app_state::AppState, http::response_envelope::now_iso},
    error_handler::{AppError, AppResult},
    routes::query::{
        query_request::QueryRequest,
        query_response::{QueryResponse, shape},
    },
};

/// Handler: POST /api/query
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/api/query \
///   -H 'content-type: application/json' \
///   -d '{"question":"我有哪些作业没交？","user_id":"202311081040"}'
/// ```
#[instrument(name = "query_route", skip_all)]
pub async fn query_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryRequest>,
) -> AppResult<(StatusCode, Json<QueryResponse>)> {
    if !state.ready {
        return Err(AppError::Unavailable);
    }

    let (question, user_id) = body.validated()?;

    // Unknown ids and lookup failures are treated alike
    match state.store.student_exists(&user_id).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(%user_id, "unknown student id");
            return Err(AppError::InvalidUserId);
        }
        Err(e) => {
            error!(%user_id, error = %e, "student lookup failed");
            return Err(AppError::InvalidUserId);
        }
    }

    info!(%user_id, %question, "processing query");
    let payload = state.pipeline.process_question(&question, &user_id).await;

    if payload.success {
        info!(rows = payload.row_count, "query succeeded");
    } else {
        warn!(error = payload.error.as_deref().unwrap_or(""), "query failed");
    }

    let (status, response) = shape(&question, &body, payload, now_iso());
    Ok((status, Json(response)))
}
