//! GET /api/suggestions: example questions grouped by intent.

use axum::Json;
use nl_query::example_questions;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::app::http::response_envelope::now_iso;

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    /// `{intent_tag: [question, ...]}`
    pub suggestions: Map<String, Value>,
    pub timestamp: String,
}

pub async fn suggestions_route() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        success: true,
        suggestions: catalog(),
        timestamp: now_iso(),
    })
}

fn catalog() -> Map<String, Value> {
    example_questions()
        .into_iter()
        .map(|c| {
            let questions = c.questions.into_iter().map(Value::from).collect();
            (c.category.as_str().to_string(), Value::Array(questions))
        })
        .collect()
}
