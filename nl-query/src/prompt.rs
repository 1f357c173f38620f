//! Prompt builder: fixed system message + schema, rules and worked examples.

use serde_json::json;

use crate::intent::QueryIntent;
use crate::schema::{EXAMPLES, FewShot, SCHEMA_DESCRIPTION};

/// System instructions for SQL generation.
pub const DEFAULT_SYSTEM: &str = "你是一个专业的SQL生成助手，专门为教育督学系统服务。请严格按照JSON格式输出，确保SQL查询的安全性和准确性。充分利用数据库中的所有表结构，提供详细和有用的查询结果。";

const RULES: &str = "请遵循以下规则:
1. 所有查询必须使用参数化查询 (%s) 防止SQL注入
2. 涉及学生个人数据时，必须添加 student_id = %s 条件限制
3. 日期比较使用 CURRENT_DATE 获取当前日期
4. 优先查询最相关和最有用的信息
5. 对于模糊问题，选择最可能的解释
6. 利用新增的表结构提供更丰富的查询结果";

/// Builds the user prompt for one question.
///
/// Embeds the schema, the caller id, the literal question, the predicted
/// intent when there is one, the output contract and the worked examples
/// rendered with the caller's id.
///
/// # Example
/// ```
/// use nl_query::prompt::build_user_prompt;
/// use nl_query::QueryIntent;
/// let p = build_user_prompt("我有哪些作业没交？", "202311081040", Some(QueryIntent::ExperimentReport));
/// assert!(p.contains("预测查询意图: experiment_report"));
/// assert!(p.contains("学生ID '202311081040'"));
/// ```
pub fn build_user_prompt(question: &str, user_id: &str, hint: Option<QueryIntent>) -> String {
    let mut out = String::with_capacity(SCHEMA_DESCRIPTION.len() * 3);

    out.push_str("你是一个专业的SQL查询生成助手，专门为智能督学系统服务。请根据学生的自然语言问题生成安全、准确的SQL查询。\n\n");
    out.push_str(SCHEMA_DESCRIPTION);
    out.push_str("\n\n");

    out.push_str(&format!("当前用户: 学生ID '{user_id}'\n"));
    out.push_str(&format!("用户问题: \"{}\"", question.trim()));
    if let Some(intent) = hint {
        out.push_str(&format!("\n预测查询意图: {intent}"));
    }
    out.push_str("\n\n");

    out.push_str(RULES);
    out.push_str("\n\n");

    out.push_str("输出格式 (严格的JSON):\n```json\n");
    out.push_str(&output_contract());
    out.push_str("\n```\n\n增强查询示例:\n\n");

    for ex in EXAMPLES {
        out.push_str(&render_example(ex, user_id));
        out.push('\n');
    }

    out.push_str("请根据用户问题生成最合适的SQL查询，充分利用数据库中的丰富信息。\n");
    out
}

fn output_contract() -> String {
    let tags: Vec<&str> = QueryIntent::ALL.iter().map(|i| i.as_str()).collect();
    let v = json!({
        "query_type": tags.join("|"),
        "sql": "完整的SQL查询语句",
        "params": ["参数列表"],
        "explanation": "查询意图的简短说明",
    });
    serde_json::to_string_pretty(&v).unwrap_or_default()
}

fn render_example(ex: &FewShot, user_id: &str) -> String {
    let questions = ex
        .questions
        .iter()
        .map(|q| format!("\"{q}\""))
        .collect::<Vec<_>>()
        .join(" / ");
    let v = json!({
        "query_type": ex.intent.as_str(),
        "sql": ex.sql,
        "params": ex.params_for(user_id),
        "explanation": ex.explanation,
    });
    format!(
        "问题: {questions}\n```json\n{}\n```\n",
        serde_json::to_string_pretty(&v).unwrap_or_default()
    )
}
