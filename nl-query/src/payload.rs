//! The orchestrator's external contract.

use serde::Serialize;
use study_store::QueryResult;

use crate::intent::QueryIntent;
use crate::suggestions::general_suggestions;

/// Shown when generation or validation fails.
pub const MSG_NOT_UNDERSTOOD: &str = "抱歉，我无法理解您的问题。请尝试使用更具体的表达方式，比如\"我有哪些作业没交？\"、\"我的成绩怎么样？\"或\"老师有什么反馈？\"";

/// Shown when execution fails. The underlying error is only logged.
pub const MSG_TECHNICAL: &str =
    "查询过程中遇到了技术问题，请稍后重试。如果问题持续存在，请联系系统管理员。";

pub const MSG_EMPTY_QUESTION: &str = "问题不能为空";

/// Result of one `process_question` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponsePayload {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub intent: Option<QueryIntent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<QueryResult>,
    pub row_count: usize,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponsePayload {
    /// Failure with a user-facing message and the generic suggestions.
    pub fn failure(message: &str) -> Self {
        Self {
            success: false,
            error: Some(message.to_string()),
            suggestions: general_suggestions(),
            ..Self::default()
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}
