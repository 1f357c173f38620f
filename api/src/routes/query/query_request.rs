use serde::Deserialize;
use serde_json::Value;

use crate::error_handler::AppError;

/// Request payload for POST /api/query.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// Natural language question.
    #[serde(default)]
    pub question: String,
    /// Student id; a JSON string or number.
    #[serde(default)]
    pub user_id: Option<Value>,
    /// Echo the executed SQL back.
    #[serde(default = "default_true")]
    pub include_sql: bool,
    /// Attach the decoded result set.
    #[serde(default)]
    pub include_raw_results: bool,
}

fn default_true() -> bool {
    true
}

impl QueryRequest {
    /// Trimmed `(question, user_id)`, or the matching request error.
    pub fn validated(&self) -> Result<(String, String), AppError> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(AppError::EmptyQuestion);
        }
        let user_id = self
            .user_id
            .as_ref()
            .and_then(user_id_text)
            .ok_or(AppError::InvalidUserId)?;
        Ok((question.to_string(), user_id))
    }
}

/// Normalizes a JSON student id; ids are stored as text.
pub(crate) fn user_id_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> QueryRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn flags_default_like_the_public_contract() {
        let req = parse(json!({"question": "q", "user_id": "s1"}));
        assert!(req.include_sql);
        assert!(!req.include_raw_results);
    }

    #[test]
    fn blank_question_is_rejected_first() {
        let req = parse(json!({"question": "  ", "user_id": null}));
        assert!(matches!(req.validated(), Err(AppError::EmptyQuestion)));
    }

    #[test]
    fn user_id_accepts_text_and_numbers() {
        let req = parse(json!({"question": " 我的成绩 ", "user_id": 202311081040u64}));
        let (q, id) = req.validated().unwrap();
        assert_eq!(q, "我的成绩");
        assert_eq!(id, "202311081040");

        for bad in [json!(null), json!(""), json!(["s1"]), json!(true)] {
            let req = parse(json!({"question": "q", "user_id": bad}));
            assert!(matches!(req.validated(), Err(AppError::InvalidUserId)));
        }
        let req = parse(json!({"question": "q"}));
        assert!(matches!(req.validated(), Err(AppError::InvalidUserId)));
    }
}
