//! SQL synthesis through the text-generation service.

use std::sync::Arc;

use ai_llm_service::JsonCompletion;
use serde::Deserialize;
use serde_json::Value;
use study_store::BindValue;
use tracing::{debug, info, warn};

use crate::error::GenerationError;
use crate::intent::QueryIntent;
use crate::prompt::{DEFAULT_SYSTEM, build_user_prompt};

/// A statement proposed by the generator, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuery {
    /// `None` when the generator's `query_type` is missing or unknown.
    pub intent: Option<QueryIntent>,
    pub sql: String,
    pub params: Vec<BindValue>,
    pub explanation: Option<String>,
}

/// Turns questions into parameterized SQL via a [`JsonCompletion`] client.
#[derive(Clone)]
pub struct SqlSynthesizer {
    llm: Arc<dyn JsonCompletion>,
}

impl SqlSynthesizer {
    pub fn new(llm: Arc<dyn JsonCompletion>) -> Self {
        Self { llm }
    }

    /// Asks the model for `{query_type, sql, params, explanation}`.
    ///
    /// # Errors
    /// [`GenerationError`] on upstream failure, malformed output or empty SQL.
    pub async fn synthesize(
        &self,
        question: &str,
        user_id: &str,
        hint: Option<QueryIntent>,
    ) -> Result<GeneratedQuery, GenerationError> {
        let prompt = build_user_prompt(question, user_id, hint);
        debug!(prompt_len = prompt.len(), hint = ?hint, "requesting sql generation");

        let raw = self.llm.complete_json(DEFAULT_SYSTEM, &prompt).await?;
        let generated = parse_generated(&raw)?;

        info!(
            intent = ?generated.intent,
            params = generated.params.len(),
            explanation = generated.explanation.as_deref().unwrap_or("无说明"),
            "sql generated"
        );
        Ok(generated)
    }
}

#[derive(Debug, Deserialize)]
struct RawGenerated {
    #[serde(default)]
    query_type: Option<Value>,
    #[serde(default)]
    sql: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Decodes the model's JSON content.
///
/// A surrounding Markdown code fence is tolerated. A missing or unknown
/// `query_type` is not an error. `params` may be an array or a single scalar.
pub fn parse_generated(raw: &str) -> Result<GeneratedQuery, GenerationError> {
    let body = strip_code_fence(raw);
    let parsed: RawGenerated =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    let sql = parsed.sql.unwrap_or_default().trim().to_string();
    if sql.is_empty() {
        return Err(GenerationError::EmptySql);
    }

    let intent = match parsed.query_type {
        Some(Value::String(tag)) => {
            let intent = QueryIntent::from_tag(&tag);
            if intent.is_none() {
                warn!(%tag, "unknown query_type from generator");
            }
            intent
        }
        _ => None,
    };

    let params = match parsed.params {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(BindValue::from_json).collect(),
        Some(scalar) => vec![BindValue::from_json(&scalar)],
    };

    Ok(GeneratedQuery {
        intent,
        sql,
        params,
        explanation: parsed.explanation.filter(|s| !s.trim().is_empty()),
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let t = raw.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
