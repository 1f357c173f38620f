//! Result → natural-language answer.
//!
//! Each intent has a positional template with a minimum column count. A
//! result with any shorter row is rendered by the generic formatter instead,
//! so no row is silently dropped.

mod templates;

use chrono::NaiveDate;
use study_store::{CellValue, QueryResult};
use tracing::warn;

use crate::intent::QueryIntent;

type Template = fn(&[Vec<CellValue>], NaiveDate) -> String;

/// Fixed sentence for an empty result.
pub fn empty_message(intent: Option<QueryIntent>) -> &'static str {
    match intent {
        Some(QueryIntent::ExperimentReport) => "📋 您目前没有未提交的实验报告，继续保持！",
        Some(QueryIntent::UnitTest) => "📝 暂无即将进行的单元测试信息。",
        Some(QueryIntent::CourseInfo) => "📚 暂无课程信息。",
        Some(QueryIntent::StudentProgress) => "📈 暂无学习进度数据。",
        Some(QueryIntent::LearningSchedule) => "📅 暂无近期学习安排。",
        Some(QueryIntent::DeadlineWarning) => "⏰ 目前没有即将到期的任务。",
        Some(QueryIntent::TeacherFeedback) => "📝 暂时没有收到老师的反馈，请继续努力学习！",
        Some(QueryIntent::LearningAnalytics) => "📊 暂无学习行为数据记录。",
        Some(QueryIntent::PeerComparison) => "📊 暂无可比较的班级数据。",
        Some(QueryIntent::ResourceUsage) => "📚 您尚未访问任何学习资源。",
        Some(QueryIntent::GradeInquiry) => "📝 暂无成绩记录。",
        Some(QueryIntent::Announcement) => "📢 暂无有效的公告。",
        Some(QueryIntent::StudyRecommendation) => "💡 您已完成所有任务，建议复习已学内容！",
        Some(QueryIntent::CompletionStats) | None => "📋 暂无相关数据，请尝试其他问题！",
    }
}

/// Template and minimum arity for `intent`; `None` means generic.
fn template_for(intent: Option<QueryIntent>) -> Option<(usize, Template)> {
    let entry: (usize, Template) = match intent? {
        QueryIntent::ExperimentReport => (5, templates::experiment_report),
        QueryIntent::UnitTest => (3, templates::unit_test),
        QueryIntent::CourseInfo => (2, templates::course_info),
        QueryIntent::StudentProgress => (3, templates::student_progress),
        QueryIntent::LearningSchedule => (3, templates::learning_schedule),
        QueryIntent::DeadlineWarning => (3, templates::deadline_warning),
        QueryIntent::TeacherFeedback => (6, templates::teacher_feedback),
        QueryIntent::PeerComparison => (4, templates::peer_comparison),
        QueryIntent::ResourceUsage => (6, templates::resource_usage),
        QueryIntent::GradeInquiry => (5, templates::grade_inquiry),
        QueryIntent::Announcement => (5, templates::announcement),
        QueryIntent::StudyRecommendation => (4, templates::study_recommendation),
        QueryIntent::LearningAnalytics => (6, templates::learning_analytics),
        QueryIntent::CompletionStats => return None,
    };
    Some(entry)
}

/// Renders `result` for `intent`.
///
/// `today` anchors the relative-day labels of schedule and deadline answers.
pub fn format_answer(intent: Option<QueryIntent>, result: &QueryResult, today: NaiveDate) -> String {
    if result.rows.is_empty() {
        return empty_message(intent).to_string();
    }

    match template_for(intent) {
        Some((arity, template)) => {
            if let Some(short) = result.rows.iter().map(Vec::len).find(|len| *len < arity) {
                warn!(
                    intent = ?intent,
                    expected = arity,
                    got = short,
                    "row narrower than template; using generic formatter"
                );
                templates::generic(&result.rows)
            } else {
                template(&result.rows, today)
            }
        }
        None => templates::generic(&result.rows),
    }
}
