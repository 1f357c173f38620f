//! Follow-up questions offered alongside answers.

use serde::Serialize;

use crate::intent::QueryIntent;

const GENERAL: [&str; 5] = [
    "查看未提交的实验报告: '我有哪些作业没交？'",
    "查询成绩: '我的成绩怎么样？'",
    "获取教师反馈: '老师对我有什么反馈？'",
    "了解学习安排: '这周的学习计划是什么？'",
    "查看公告: '有什么重要通知？'",
];

fn follow_ups(intent: QueryIntent) -> Option<[&'static str; 3]> {
    use QueryIntent::*;
    let items = match intent {
        ExperimentReport => [
            "查看具体作业详情: '某课程的实验报告要求是什么？'",
            "查询截止日期: '我的作业什么时候到期？'",
            "获取学习建议: '我应该先完成哪些作业？'",
        ],
        UnitTest => [
            "查看测试详情: '单元测试的内容是什么？'",
            "获取复习建议: '如何准备单元测试？'",
            "查看课程进度: '我学到哪了？'",
        ],
        CourseInfo => [
            "查看课程资源: '这门课有哪些学习资料？'",
            "查询学习安排: '课程什么时候开始？'",
            "获取教师反馈: '老师对这门课有什么建议？'",
        ],
        StudentProgress => [
            "对比同学: '我和其他同学相比怎么样？'",
            "查看学习时间: '我花了多少时间学习？'",
            "获取改进建议: '我该如何提高进度？'",
        ],
        LearningSchedule => [
            "查看具体课程: '下周要学什么？'",
            "查询截止日期: '最近有什么作业要交？'",
            "获取学习建议: '我应该怎么安排学习？'",
        ],
        DeadlineWarning => [
            "查看作业详情: '这些作业的具体要求是什么？'",
            "查询优先级: '哪些作业最紧急？'",
            "获取时间管理建议: '如何规划我的作业？'",
        ],
        TeacherFeedback => [
            "查看更多反馈: '最近的反馈有哪些？'",
            "查询成绩: '这门课的成绩怎么样？'",
            "获取改进建议: '我该如何改进？'",
        ],
        LearningAnalytics => [
            "查看资源使用: '我看了哪些学习资料？'",
            "对比同学: '我的学习时间和其他人比如何？'",
            "获取学习建议: '我该如何优化学习？'",
        ],
        PeerComparison => [
            "查看详细进度: '我的具体进度如何？'",
            "查询成绩: '我的成绩排名如何？'",
            "获取提升建议: '我该如何提高排名？'",
        ],
        ResourceUsage => [
            "查看课程资源: '有哪些推荐的学习资料？'",
            "查询学习时间: '我花了多少时间看资料？'",
            "获取使用建议: '我应该多看哪些资源？'",
        ],
        GradeInquiry => [
            "查看教师评语: '老师对我的作业有什么评价？'",
            "查询作业状态: '我有哪些作业没交？'",
            "获取改进建议: '我该如何提高成绩？'",
        ],
        Announcement => [
            "查看紧急通知: '有什么紧急公告？'",
            "查询考试安排: '最近有什么考试？'",
            "获取课程更新: '课程有什么新消息？'",
        ],
        StudyRecommendation => [
            "查看优先级任务: '我应该先完成什么？'",
            "查询学习资源: '有哪些推荐的学习资料？'",
            "获取时间规划: '我该如何安排学习时间？'",
        ],
        CompletionStats => return None,
    };
    Some(items)
}

/// The five starter questions shown when no intent applies.
pub fn general_suggestions() -> Vec<String> {
    GENERAL.iter().map(|s| s.to_string()).collect()
}

/// Three follow-ups for `intent`, or [`general_suggestions`].
pub fn suggestions(intent: Option<QueryIntent>) -> Vec<String> {
    match intent.and_then(follow_ups) {
        Some(items) => items.iter().map(|s| s.to_string()).collect(),
        None => general_suggestions(),
    }
}

/// One category of the example-question catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ExampleCategory {
    pub category: QueryIntent,
    pub questions: Vec<&'static str>,
}

/// Example questions grouped by intent, in display order.
pub fn example_questions() -> Vec<ExampleCategory> {
    let catalog: [(QueryIntent, [&'static str; 4]); 5] = [
        (
            QueryIntent::LearningSchedule,
            [
                "这周有什么课程要学？",
                "最近的学习安排是什么？",
                "下个月的课程安排",
                "所有课程的学习时间表",
            ],
        ),
        (
            QueryIntent::UnitTest,
            [
                "什么时候有单元测试？",
                "第3单元测试是什么时候？",
                "所有单元测试的时间安排",
                "最近的考试安排",
            ],
        ),
        (
            QueryIntent::ExperimentReport,
            [
                "我有哪些作业没交？",
                "未提交的实验报告有哪些？",
                "本周截止的实验报告",
                "逾期的作业列表",
            ],
        ),
        (
            QueryIntent::CourseInfo,
            [
                "数据库课程有哪些内容？",
                "所有课程的详细信息",
                "课程内容和时间安排",
                "每次课的学习内容",
            ],
        ),
        (
            QueryIntent::StudentProgress,
            [
                "我的学习进度怎么样？",
                "作业完成情况统计",
                "学习完成度分析",
                "我提交了多少作业？",
            ],
        ),
    ];

    catalog
        .into_iter()
        .map(|(category, questions)| ExampleCategory {
            category,
            questions: questions.to_vec(),
        })
        .collect()
}
