//! HTTP surface of the supervision gateway.
//!
//! Routes:
//! - `POST /api/query`: question → answer via [`nl_query::QueryPipeline`]
//! - `GET /health`: live LLM and database probes
//! - `GET /api/suggestions`: example-question catalog

use std::sync::Arc;

mod app;
mod error_handler;
mod middleware_layer;
mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

pub use crate::app::app_state::{ApiConfig, AppState};
pub use crate::error_handler::{AppError, AppResult};

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        health_route::health_route, query::query_route::query_route,
        suggestions_route::suggestions_route,
    },
};

/// Loads configuration, probes the backends and serves until Ctrl+C.
///
/// # Errors
/// Configuration errors and listener failures. Backend probe failures are
/// not errors: the server starts and `/api/query` answers 503.
pub async fn start() -> Result<(), AppError> {
    let cfg = ApiConfig::from_env()?;
    let state = Arc::new(AppState::from_env().await?);
    let ready = state.ready;

    let listener = tokio::net::TcpListener::bind(&cfg.address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %cfg.address, ready, "listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// All routes with the JSON rejection mapper applied.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/query", post(query_route))
        .route("/health", get(health_route))
        .route("/api/suggestions", get(suggestions_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Resolves on Ctrl+C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::{HealthService, LlmModelConfig, OpenAiService};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use nl_query::{GuardPolicy, QueryPipeline, SqlSynthesizer};
    use serde_json::Value;
    use study_store::{DbConfig, PgExecutor};
    use tower::ServiceExt;

    /// Both backends point at a closed local port, so every health check fails fast.
    fn offline_state(ready: bool) -> Arc<AppState> {
        let llm = LlmModelConfig {
            model: "gpt-4o".into(),
            endpoint: "http://127.0.0.1:9/v1".into(),
            api_key: Some("sk-test".into()),
            max_tokens: None,
            temperature: Some(0.1),
            timeout_secs: Some(1),
            max_retries: 0,
        };
        let db = DbConfig::from_lookup(|k| match k {
            "DB_HOST" => Some("127.0.0.1".into()),
            "DB_PORT" => Some("9".into()),
            "DB_CONNECT_TIMEOUT_SECS" => Some("1".into()),
            _ => None,
        })
        .unwrap();
        let store = Arc::new(PgExecutor::new(db));
        let client = Arc::new(OpenAiService::new(llm.clone()).unwrap());
        Arc::new(AppState {
            pipeline: QueryPipeline::new(SqlSynthesizer::new(client), store.clone(), GuardPolicy::default()),
            store,
            llm,
            health: HealthService::new(Some(1)).unwrap(),
            ready,
        })
    }

    async fn call(state: Arc<AppState>, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let res = router(state).oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_query(body: &str) -> Request<Body> {
        Request::post("/api/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_degraded_when_backends_are_down() {
        let req = Request::get("/health").body(Body::empty()).unwrap();
        let (status, _, body) = call(offline_state(true), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["ai_processor_ready"], true);
        assert_eq!(body["database"], false);
        assert_eq!(body["llm"]["ok"], false);
        assert_eq!(body["llm"]["model"], "gpt-4o");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn query_is_503_until_backends_are_ready() {
        let (status, _, body) = call(
            offline_state(false),
            post_query(r#"{"question":"我的成绩怎么样？","user_id":"202311081040"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn blank_question_and_missing_id_are_rejected_before_lookup() {
        let (status, _, body) = call(
            offline_state(true),
            post_query(r#"{"question":"   ","user_id":"202311081040"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "EMPTY_QUESTION");

        let (status, _, body) = call(offline_state(true), post_query(r#"{"question":"我的成绩"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "INVALID_USER_ID");
    }

    #[tokio::test]
    async fn malformed_body_becomes_flat_invalid_request() {
        let mut req = post_query("{");
        req.headers_mut()
            .insert("X-Request-Id", header::HeaderValue::from_static("trace-7"));
        let (status, headers, body) = call(offline_state(true), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "INVALID_REQUEST");
        assert_eq!(body["error"], "请求数据格式错误");
        assert!(body["detail"].is_string());
        assert_eq!(headers["X-Request-Id"], "trace-7");

        let req = Request::post("/api/query")
            .body(Body::from(r#"{"question":"q","user_id":"1"}"#))
            .unwrap();
        let (status, _, body) = call(offline_state(true), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn suggestions_catalog_is_served() {
        let req = Request::get("/api/suggestions").body(Body::empty()).unwrap();
        let (status, _, body) = call(offline_state(false), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["suggestions"]["experiment_report"][0], "我有哪些作业没交？");
    }
}
