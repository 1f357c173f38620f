//! Question intents and the keyword classifier that predicts them.
//!
//! The prediction is only a hint for the generator. The generator's own
//! `query_type` decides which answer template is used.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Purpose category of a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    ExperimentReport,
    GradeInquiry,
    TeacherFeedback,
    LearningSchedule,
    UnitTest,
    CourseInfo,
    StudentProgress,
    DeadlineWarning,
    Announcement,
    StudyRecommendation,
    PeerComparison,
    ResourceUsage,
    LearningAnalytics,
    CompletionStats,
}

impl QueryIntent {
    pub const ALL: [QueryIntent; 14] = [
        QueryIntent::ExperimentReport,
        QueryIntent::GradeInquiry,
        QueryIntent::TeacherFeedback,
        QueryIntent::LearningSchedule,
        QueryIntent::UnitTest,
        QueryIntent::CourseInfo,
        QueryIntent::StudentProgress,
        QueryIntent::DeadlineWarning,
        QueryIntent::Announcement,
        QueryIntent::StudyRecommendation,
        QueryIntent::PeerComparison,
        QueryIntent::ResourceUsage,
        QueryIntent::LearningAnalytics,
        QueryIntent::CompletionStats,
    ];

    /// Wire tag, e.g. `experiment_report`.
    pub fn as_str(self) -> &'static str {
        match self {
            QueryIntent::ExperimentReport => "experiment_report",
            QueryIntent::GradeInquiry => "grade_inquiry",
            QueryIntent::TeacherFeedback => "teacher_feedback",
            QueryIntent::LearningSchedule => "learning_schedule",
            QueryIntent::UnitTest => "unit_test",
            QueryIntent::CourseInfo => "course_info",
            QueryIntent::StudentProgress => "student_progress",
            QueryIntent::DeadlineWarning => "deadline_warning",
            QueryIntent::Announcement => "announcement",
            QueryIntent::StudyRecommendation => "study_recommendation",
            QueryIntent::PeerComparison => "peer_comparison",
            QueryIntent::ResourceUsage => "resource_usage",
            QueryIntent::LearningAnalytics => "learning_analytics",
            QueryIntent::CompletionStats => "completion_stats",
        }
    }

    /// Parses a wire tag; unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL.into_iter().find(|i| i.as_str() == tag)
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table in registration order. Ties resolve to the earlier entry.
const KEYWORDS: &[(QueryIntent, &[&str])] = &[
    (
        QueryIntent::ExperimentReport,
        &[
            "作业", "实验报告", "未提交", "没交", "逾期", "截止", "deadline", "report",
            "assignment", "homework", "补交",
        ],
    ),
    (
        QueryIntent::UnitTest,
        &[
            "测试", "考试", "单元测试", "unit test", "exam", "quiz", "考核", "测验", "考试安排",
        ],
    ),
    (
        QueryIntent::LearningSchedule,
        &[
            "学习安排", "课程安排", "时间表", "schedule", "计划", "日程", "这周", "下周", "最近",
            "什么时候学",
        ],
    ),
    (
        QueryIntent::CourseInfo,
        &[
            "课程内容", "学习内容", "课程详情", "course", "内容", "学什么", "涵盖", "包含",
            "课程介绍",
        ],
    ),
    (
        QueryIntent::StudentProgress,
        &[
            "进度", "完成情况", "统计", "progress", "完成率", "学习状况", "表现", "整体情况",
        ],
    ),
    (
        QueryIntent::DeadlineWarning,
        &[
            "即将到期", "快到期", "紧急", "提醒", "警告", "urgent", "soon", "approaching", "催促",
        ],
    ),
    (
        QueryIntent::TeacherFeedback,
        &[
            "老师", "教师", "反馈", "评价", "建议", "feedback", "评语", "意见", "指导",
        ],
    ),
    (
        QueryIntent::LearningAnalytics,
        &[
            "学习时长", "访问记录", "学习行为", "活跃度", "学习习惯", "analytics", "统计分析",
        ],
    ),
    (
        QueryIntent::PeerComparison,
        &[
            "同学", "其他人", "排名", "比较", "平均", "对比", "相比", "comparison", "排行",
        ],
    ),
    (
        QueryIntent::ResourceUsage,
        &[
            "资源", "视频", "课件", "资料", "下载", "观看", "学习资源", "材料",
        ],
    ),
    (
        QueryIntent::GradeInquiry,
        &["成绩", "分数", "评分", "grade", "score", "多少分", "得分"],
    ),
    (
        QueryIntent::Announcement,
        &[
            "通知", "公告", "消息", "announcement", "新闻", "最新", "重要通知",
        ],
    ),
    (
        QueryIntent::StudyRecommendation,
        &[
            "建议", "推荐", "应该", "怎么学", "如何", "学习方法", "复习", "准备",
        ],
    ),
];

/// Keywords registered for `intent` (empty for intents without keywords).
pub fn keywords(intent: QueryIntent) -> &'static [&'static str] {
    KEYWORDS
        .iter()
        .find(|(i, _)| *i == intent)
        .map(|(_, k)| *k)
        .unwrap_or(&[])
}

/// Per-intent keyword hit counts, in registration order, zero scores omitted.
pub fn score(question: &str) -> Vec<(QueryIntent, usize)> {
    let lowered = question.to_lowercase();
    KEYWORDS
        .iter()
        .map(|(intent, words)| {
            let hits = words
                .iter()
                .filter(|w| lowered.contains(&w.to_lowercase()))
                .count();
            (*intent, hits)
        })
        .filter(|(_, hits)| *hits > 0)
        .collect()
}

/// Predicts the intent with the strictly highest nonzero keyword score.
///
/// Returns `None` when no keyword matches.
pub fn classify(question: &str) -> Option<QueryIntent> {
    let mut best: Option<(QueryIntent, usize)> = None;
    for (intent, hits) in score(question) {
        if best.is_none_or(|(_, top)| hits > top) {
            best = Some((intent, hits));
        }
    }
    best.map(|(intent, _)| intent)
}
