use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use ai_llm_service::AiLlmError;
use nl_query::PipelineError;
use study_store::StoreError;

use crate::app::http::response_envelope::ErrorEnvelope;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("[API] invalid configuration {var}: {reason}")]
    Config { var: &'static str, reason: String },

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    // --- IO / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("请求数据格式错误")]
    InvalidRequest(String),

    #[error("问题不能为空")]
    EmptyQuestion,

    #[error("无效的学生ID")]
    InvalidUserId,

    #[error("AI查询服务暂时不可用")]
    Unavailable,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::InvalidRequest(_)
            | AppError::EmptyQuestion
            | AppError::InvalidUserId => StatusCode::BAD_REQUEST,

            AppError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 5xx; boot errors never reach a handler
            AppError::Config { .. }
            | AppError::Llm(_)
            | AppError::Store(_)
            | AppError::Pipeline(_)
            | AppError::Bind(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config { .. } | AppError::Llm(_) | AppError::Pipeline(_) => "CONFIG_ERROR",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::EmptyQuestion => "EMPTY_QUESTION",
            AppError::InvalidUserId => "INVALID_USER_ID",
            AppError::Unavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut envelope = ErrorEnvelope::new(self.error_code(), self.to_string());
        if let AppError::InvalidRequest(detail) = self {
            envelope = envelope.with_detail(detail);
        }
        envelope.into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn body_json(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn request_errors_are_flat_400s() {
        let res = AppError::EmptyQuestion.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "问题不能为空");
        assert_eq!(body["error_code"], "EMPTY_QUESTION");
        assert!(body["timestamp"].is_string());
        assert!(body.get("detail").is_none());
    }

    #[tokio::test]
    async fn unavailable_is_503() {
        let res = AppError::Unavailable.into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(res).await["error_code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn invalid_request_carries_detail() {
        let res = AppError::InvalidRequest("expected value at line 1".into()).into_response();
        let body = body_json(res).await;
        assert_eq!(body["error_code"], "INVALID_REQUEST");
        assert_eq!(body["detail"], "expected value at line 1");
    }

    #[test]
    fn config_errors_name_the_variable() {
        let err = AppError::Config {
            var: "API_ADDRESS",
            reason: "empty".into(),
        };
        assert!(err.to_string().contains("API_ADDRESS"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
