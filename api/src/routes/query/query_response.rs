use axum::http::StatusCode;
use nl_query::{QueryIntent, ResponsePayload};
use serde::Serialize;
use study_store::QueryResult;

use crate::routes::query::query_request::QueryRequest;

/// Response payload for POST /api/query, for both outcomes.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub timestamp: String,
    pub question: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_results: Option<QueryResult>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Answered {
        answer: String,
        query_type: Option<QueryIntent>,
        result_count: usize,
        suggestions: Vec<String>,
    },
    Failed {
        error: String,
        error_code: &'static str,
        suggestions: Vec<String>,
    },
}

/// Maps a pipeline payload onto the HTTP contract.
///
/// Failures become 400 `QUERY_FAILED`; the SQL is echoed on both paths
/// when requested.
pub fn shape(
    question: &str,
    req: &QueryRequest,
    payload: ResponsePayload,
    timestamp: String,
) -> (StatusCode, QueryResponse) {
    let sql = payload.sql.filter(|_| req.include_sql);

    if payload.success {
        let raw_results = payload.rows.filter(|_| req.include_raw_results);
        let body = QueryResponse {
            success: true,
            timestamp,
            question: question.to_string(),
            outcome: Outcome::Answered {
                answer: payload.answer.unwrap_or_default(),
                query_type: payload.intent,
                result_count: payload.row_count,
                suggestions: payload.suggestions,
            },
            sql,
            raw_results,
        };
        return (StatusCode::OK, body);
    }

    let body = QueryResponse {
        success: false,
        timestamp,
        question: question.to_string(),
        outcome: Outcome::Failed {
            error: payload.error.unwrap_or_default(),
            error_code: "QUERY_FAILED",
            suggestions: payload.suggestions,
        },
        sql,
        raw_results: None,
    };
    (StatusCode::BAD_REQUEST, body)
}
