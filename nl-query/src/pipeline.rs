//! Question → answer orchestration.
//!
//! Stages run strictly in sequence: classify, synthesize, guard, execute,
//! format. Every failure is folded into a [`ResponsePayload`]; nothing
//! escapes to the caller.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use study_store::QueryExecutor;
use tracing::{debug, error, info, instrument, warn};

use crate::format::format_answer;
use crate::guard::{GuardPolicy, inspect};
use crate::intent::classify;
use crate::payload::{MSG_EMPTY_QUESTION, MSG_NOT_UNDERSTOOD, MSG_TECHNICAL, ResponsePayload};
use crate::suggestions::suggestions;
use crate::synth::SqlSynthesizer;

/// Wires the synthesizer, the guard and an executor together.
///
/// Built once at startup and shared read-only across requests.
#[derive(Clone)]
pub struct QueryPipeline {
    synth: SqlSynthesizer,
    executor: Arc<dyn QueryExecutor>,
    policy: GuardPolicy,
}

impl QueryPipeline {
    pub fn new(synth: SqlSynthesizer, executor: Arc<dyn QueryExecutor>, policy: GuardPolicy) -> Self {
        Self {
            synth,
            executor,
            policy,
        }
    }

    pub fn policy(&self) -> GuardPolicy {
        self.policy
    }

    /// Answers `question` for `user_id`, using the local date for relative labels.
    pub async fn process_question(&self, question: &str, user_id: &str) -> ResponsePayload {
        self.process_question_on(question, user_id, Local::now().date_naive())
            .await
    }

    /// Same as [`QueryPipeline::process_question`] with an explicit `today`.
    #[instrument(level = "info", skip_all, fields(user_id = %user_id))]
    pub async fn process_question_on(
        &self,
        question: &str,
        user_id: &str,
        today: NaiveDate,
    ) -> ResponsePayload {
        let question = question.trim();
        if question.is_empty() {
            return ResponsePayload::failure(MSG_EMPTY_QUESTION);
        }
        let started = Instant::now();

        // 1) Advisory intent hint
        let hint = classify(question);
        debug!(hint = ?hint, "intent classified");

        // 2) SQL synthesis
        let generated = match self.synth.synthesize(question, user_id, hint).await {
            Ok(g) => g,
            Err(e) => {
                warn!(error = %e, "sql generation failed");
                return ResponsePayload::failure(MSG_NOT_UNDERSTOOD);
            }
        };

        // 3) Safety gate; a rejected statement never reaches the executor
        if let Err(rejection) = inspect(&generated.sql, &generated.params, user_id, self.policy) {
            warn!(reason = %rejection, sql = %generated.sql, "generated sql rejected");
            return ResponsePayload::failure(MSG_NOT_UNDERSTOOD).with_sql(generated.sql);
        }

        // 4) Execution
        let result = match self.executor.execute(&generated.sql, &generated.params).await {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "query execution failed");
                return ResponsePayload::failure(MSG_TECHNICAL).with_sql(generated.sql);
            }
        };

        // 5) Answer
        let answer = format_answer(generated.intent, &result, today);
        let row_count = result.len();
        info!(
            intent = ?generated.intent,
            rows = row_count,
            latency_ms = started.elapsed().as_millis(),
            "question answered"
        );

        ResponsePayload {
            success: true,
            answer: Some(answer),
            intent: generated.intent,
            sql: Some(generated.sql),
            rows: Some(result),
            row_count,
            suggestions: suggestions(generated.intent),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::QueryIntent;
    use crate::schema::example_for;
    use ai_llm_service::{AiLlmError, CompletionFuture, JsonCompletion};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use study_store::{BindValue, CellValue, ExecFuture, QueryResult, StoreError};

    const STUDENT: &str = "202311081040";

    struct StubLlm {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl StubLlm {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl JsonCompletion for StubLlm {
        fn complete_json<'a>(&'a self, _system: &'a str, _prompt: &'a str) -> CompletionFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone();
            Box::pin(async move { reply.ok_or(AiLlmError::Timeout(Duration::from_secs(30))) })
        }
    }

    struct StubDb {
        rows: Vec<Vec<CellValue>>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubDb {
        fn with_rows(rows: Vec<Vec<CellValue>>) -> Arc<Self> {
            Arc::new(Self {
                rows,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                rows: Vec::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl QueryExecutor for StubDb {
        fn execute<'a>(&'a self, _sql: &'a str, _params: &'a [BindValue]) -> ExecFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let out = if self.fail {
                Err(StoreError::Config {
                    var: "DB_HOST",
                    reason: "connection refused: db-internal-7".into(),
                })
            } else {
                Ok(QueryResult {
                    columns: Vec::new(),
                    rows: self.rows.clone(),
                })
            };
            Box::pin(async move { out })
        }
    }

    fn pipeline(llm: Arc<StubLlm>, db: Arc<StubDb>) -> QueryPipeline {
        QueryPipeline::new(SqlSynthesizer::new(llm), db, GuardPolicy::default())
    }

    fn experiment_reply() -> String {
        let example = example_for(QueryIntent::ExperimentReport).unwrap();
        serde_json::json!({
            "query_type": "experiment_report",
            "sql": example.sql,
            "params": [STUDENT],
            "explanation": "查询未提交的实验报告"
        })
        .to_string()
    }

    fn experiment_row() -> Vec<CellValue> {
        vec![
            CellValue::Int(12),
            CellValue::Text("Database Basics".into()),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
            CellValue::Text("已逾期".into()),
            CellValue::Text("紧急".into()),
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
    }

    #[tokio::test]
    async fn unsubmitted_reports_scenario() {
        let question = "我有哪些作业没交？";
        assert_eq!(classify(question), Some(QueryIntent::ExperimentReport));

        let db = StubDb::with_rows(vec![experiment_row()]);
        let p = pipeline(StubLlm::replying(&experiment_reply()), db.clone());
        let out = p.process_question_on(question, STUDENT, today()).await;

        assert!(out.success);
        assert_eq!(out.intent, Some(QueryIntent::ExperimentReport));
        assert_eq!(out.row_count, 1);
        let answer = out.answer.unwrap();
        assert!(answer.contains("Database Basics"));
        assert!(answer.contains("2024-05-01"));
        assert!(answer.contains("紧急"));
        assert_eq!(out.suggestions.len(), 3);
        assert_eq!(db.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_sql_never_reaches_executor() {
        let db = StubDb::with_rows(Vec::new());
        let p = pipeline(
            StubLlm::replying(r#"{"query_type":"unit_test","sql":"","params":[]}"#),
            db.clone(),
        );
        let out = p.process_question_on("什么时候考试？", STUDENT, today()).await;

        assert!(!out.success);
        assert!(!out.error.unwrap_or_default().is_empty());
        assert_eq!(out.row_count, 0);
        assert_eq!(out.suggestions.len(), 5);
        assert_eq!(db.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mutating_sql_never_reaches_executor() {
        let db = StubDb::with_rows(Vec::new());
        let p = pipeline(
            StubLlm::replying(r#"{"query_type":"course_info","sql":"DELETE FROM students","params":[]}"#),
            db.clone(),
        );
        let out = p.process_question_on("课程内容", STUDENT, today()).await;

        assert!(!out.success);
        assert_eq!(out.error.as_deref(), Some(MSG_NOT_UNDERSTOOD));
        assert_eq!(db.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unscoped_personal_query_is_rejected() {
        let db = StubDb::with_rows(Vec::new());
        let p = pipeline(
            StubLlm::replying(
                r#"{"query_type":"grade_inquiry","sql":"SELECT grade FROM StudentGrades","params":[]}"#,
            ),
            db.clone(),
        );
        let out = p.process_question_on("我的成绩", STUDENT, today()).await;

        assert!(!out.success);
        assert_eq!(db.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn executor_fault_is_not_leaked() {
        let p = pipeline(StubLlm::replying(&experiment_reply()), StubDb::failing());
        let out = p.process_question_on("我有哪些作业没交？", STUDENT, today()).await;

        assert!(!out.success);
        assert_eq!(out.error.as_deref(), Some(MSG_TECHNICAL));
        assert_eq!(out.row_count, 0);
        let body = serde_json::to_string(&out).unwrap();
        assert!(!body.contains("db-internal-7"));
    }

    #[tokio::test]
    async fn generator_failure_gives_general_suggestions() {
        let llm = Arc::new(StubLlm {
            reply: None,
            calls: AtomicUsize::new(0),
        });
        let p = pipeline(llm, StubDb::with_rows(Vec::new()));
        let out = p.process_question_on("你好", STUDENT, today()).await;

        assert!(!out.success);
        assert_eq!(out.error.as_deref(), Some(MSG_NOT_UNDERSTOOD));
        assert_eq!(out.suggestions.len(), 5);
    }

    #[tokio::test]
    async fn blank_question_skips_generator() {
        let llm = StubLlm::replying(&experiment_reply());
        let p = pipeline(llm.clone(), StubDb::with_rows(Vec::new()));
        let out = p.process_question_on("   ", STUDENT, today()).await;

        assert!(!out.success);
        assert_eq!(out.error.as_deref(), Some(MSG_EMPTY_QUESTION));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_calls_are_identical() {
        let p = pipeline(
            StubLlm::replying(&experiment_reply()),
            StubDb::with_rows(vec![experiment_row()]),
        );
        let a = p.process_question_on("我有哪些作业没交？", STUDENT, today()).await;
        let b = p.process_question_on("我有哪些作业没交？", STUDENT, today()).await;
        assert_eq!(a.answer, b.answer);
        assert_eq!(a.row_count, b.row_count);
    }

    #[tokio::test]
    async fn missing_intent_uses_general_suggestions() {
        let reply = serde_json::json!({
            "sql": "SELECT course_content FROM Intelligent_Supervision",
            "params": []
        })
        .to_string();
        let rows = vec![vec![CellValue::Text("OS".into())]];
        let p = pipeline(StubLlm::replying(&reply), StubDb::with_rows(rows));
        let out = p.process_question_on("随便看看", STUDENT, today()).await;

        assert!(out.success);
        assert_eq!(out.intent, None);
        assert_eq!(out.suggestions.len(), 5);
        assert!(out.answer.unwrap().contains("📝 OS"));
    }
}
