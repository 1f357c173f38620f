//! GET /health: live probe of both backends.

use std::sync::Arc;

use ai_llm_service::HealthStatus;
use axum::{Json, extract::State};
use serde::Serialize;
use tracing::warn;

use crate::app::{app_state::AppState, http::response_envelope::now_iso};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when every probe passes, `degraded` otherwise.
    pub status: &'static str,
    pub timestamp: String,
    pub ai_processor_ready: bool,
    pub llm: HealthStatus,
    pub database: bool,
}

pub async fn health_route(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let llm = state.health.check(&state.llm).await;
    let database = match state.store.check_connection().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "database health probe failed");
            false
        }
    };

    let status = if state.ready && llm.ok && database {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        timestamp: now_iso(),
        ai_processor_ready: state.ready,
        llm,
        database,
    })
}
