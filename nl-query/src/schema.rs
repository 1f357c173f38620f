//! Static description of the learning-platform schema and worked examples.

use crate::intent::QueryIntent;

/// Tables, columns, types and relations as shown to the generator.
pub const SCHEMA_DESCRIPTION: &str = r#"完整数据库表结构:

1. students (学生信息表)
   - student_id VARCHAR(12) PRIMARY KEY - 学生ID
   - email VARCHAR(50) NOT NULL - 邮箱
   - student_name VARCHAR(50) - 学生姓名
   - gender CHAR(1) - 性别

2. Intelligent_Supervision (智能督学表)
   - serial_number INT PRIMARY KEY - 序号
   - course_content VARCHAR(50) NOT NULL - 课程内容
   - online_learning_date DATE NOT NULL - 在线学习日期
   - report_deadline DATE NOT NULL - 报告截止日期
   - unit_number INT NOT NULL - 单元号
   - unit_test_date DATE NOT NULL - 单元测试日期

3. LabReport (实验报告表)
   - serial_number INT - 序号 (外键引用 Intelligent_Supervision.serial_number)
   - student_id VARCHAR(12) - 学生ID (外键引用 students.student_id)
   - submitted BOOLEAN DEFAULT false - 是否已提交
   - 主键: (serial_number, student_id)

4. StudentGrades (学生成绩表)
   - grade_id SERIAL PRIMARY KEY - 成绩ID
   - student_id VARCHAR(12) - 学生ID (外键)
   - serial_number INT - 序号 (外键)
   - grade DECIMAL(5,2) - 成绩 (0-100)
   - submit_date DATE - 实际提交日期
   - late_days INT DEFAULT 0 - 迟交天数
   - comments TEXT - 教师评语
   - created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP

5. LearningActivity (学习行为记录表)
   - activity_id SERIAL PRIMARY KEY - 活动ID
   - student_id VARCHAR(12) - 学生ID (外键)
   - serial_number INT - 序号 (外键)
   - activity_type VARCHAR(20) - 活动类型 ('view', 'download', 'submit', 'review')
   - activity_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP - 活动时间
   - duration_minutes INT - 学习时长(分钟)
   - device_type VARCHAR(20) - 设备类型 ('PC', 'Mobile', 'Tablet')
   - ip_address VARCHAR(15) - IP地址

6. Announcements (通知公告表)
   - announcement_id SERIAL PRIMARY KEY - 公告ID
   - title VARCHAR(100) NOT NULL - 标题
   - content TEXT NOT NULL - 内容
   - announcement_type VARCHAR(20) - 公告类型 ('deadline', 'exam', 'general', 'urgent')
   - target_students TEXT - 目标学生ID (JSON格式，null表示全体)
   - publish_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP - 发布时间
   - expire_date DATE - 过期日期
   - is_active BOOLEAN DEFAULT TRUE - 是否激活
   - created_by VARCHAR(50) DEFAULT 'system' - 创建者

7. TeacherFeedback (教师反馈表)
   - feedback_id SERIAL PRIMARY KEY - 反馈ID
   - student_id VARCHAR(12) - 学生ID (外键)
   - serial_number INT - 序号 (外键)
   - feedback_type VARCHAR(20) - 反馈类型 ('praise', 'reminder', 'warning', 'suggestion')
   - feedback_content TEXT NOT NULL - 反馈内容
   - feedback_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP - 反馈时间
   - is_read BOOLEAN DEFAULT FALSE - 是否已读
   - teacher_name VARCHAR(50) DEFAULT '系统教师' - 教师姓名

8. ResourceAccess (学习资源访问记录表)
   - access_id SERIAL PRIMARY KEY - 访问ID
   - student_id VARCHAR(12) - 学生ID (外键)
   - serial_number INT - 序号 (外键)
   - resource_type VARCHAR(30) - 资源类型 ('lecture_video', 'slides', 'example_code', 'reference')
   - resource_name VARCHAR(100) - 资源名称
   - access_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP - 访问时间
   - access_duration_seconds INT - 访问时长(秒)

9. 统计视图:
   - StudentProgressView - 学生进度统计视图
   - CourseCompletionView - 课程完成情况统计视图

表关系:
- LabReport 通过 serial_number 关联 Intelligent_Supervision
- LabReport 通过 student_id 关联 students
- StudentGrades 关联 students 和 Intelligent_Supervision
- LearningActivity 记录学生的学习行为轨迹
- TeacherFeedback 存储教师对学生的个性化反馈
- ResourceAccess 追踪学生对学习资源的使用情况"#;

/// Tables holding one student's private records.
///
/// A query touching any of them must bind the caller's id.
pub const PERSONAL_TABLES: &[&str] = &[
    "labreport",
    "studentgrades",
    "learningactivity",
    "teacherfeedback",
    "resourceaccess",
];

/// Placeholder replaced with the caller's id when examples are rendered.
pub const USER_ID_TOKEN: &str = "{user_id}";

/// One worked question → SQL example.
#[derive(Debug, Clone, Copy)]
pub struct FewShot {
    pub questions: &'static [&'static str],
    pub intent: QueryIntent,
    pub sql: &'static str,
    /// Parameter templates; [`USER_ID_TOKEN`] is substituted.
    pub params: &'static [&'static str],
    pub explanation: &'static str,
}

pub const EXAMPLES: &[FewShot] = &[
    FewShot {
        questions: &["我有哪些作业没交？", "未提交的实验报告"],
        intent: QueryIntent::ExperimentReport,
        sql: "SELECT ins.serial_number, ins.course_content, ins.report_deadline, CASE WHEN ins.report_deadline < CURRENT_DATE THEN '已逾期' ELSE '未逾期' END as status, CASE WHEN ins.report_deadline - CURRENT_DATE <= 3 THEN '紧急' WHEN ins.report_deadline - CURRENT_DATE <= 7 THEN '即将到期' ELSE '正常' END as urgency FROM Intelligent_Supervision ins LEFT JOIN LabReport lr ON ins.serial_number = lr.serial_number AND lr.student_id = %s WHERE lr.submitted IS FALSE OR lr.submitted IS NULL ORDER BY ins.report_deadline",
        params: &[USER_ID_TOKEN],
        explanation: "查询学生未提交的实验报告及其紧急程度",
    },
    FewShot {
        questions: &["我的成绩怎么样？", "我得了多少分？"],
        intent: QueryIntent::GradeInquiry,
        sql: "SELECT ins.course_content, sg.grade, sg.submit_date, sg.late_days, sg.comments, CASE WHEN sg.grade >= 90 THEN '优秀' WHEN sg.grade >= 80 THEN '良好' WHEN sg.grade >= 70 THEN '中等' WHEN sg.grade >= 60 THEN '及格' ELSE '不及格' END as grade_level FROM StudentGrades sg JOIN Intelligent_Supervision ins ON sg.serial_number = ins.serial_number WHERE sg.student_id = %s ORDER BY sg.submit_date DESC",
        params: &[USER_ID_TOKEN],
        explanation: "查询学生的成绩记录和等级评价",
    },
    FewShot {
        questions: &["老师对我有什么反馈？", "教师评价"],
        intent: QueryIntent::TeacherFeedback,
        sql: "SELECT tf.feedback_type, tf.feedback_content, tf.feedback_date, tf.teacher_name, ins.course_content, CASE WHEN tf.feedback_type = 'praise' THEN '表扬' WHEN tf.feedback_type = 'reminder' THEN '提醒' WHEN tf.feedback_type = 'warning' THEN '警告' WHEN tf.feedback_type = 'suggestion' THEN '建议' ELSE '其他' END as feedback_type_zh FROM TeacherFeedback tf LEFT JOIN Intelligent_Supervision ins ON tf.serial_number = ins.serial_number WHERE tf.student_id = %s ORDER BY tf.feedback_date DESC LIMIT 10",
        params: &[USER_ID_TOKEN],
        explanation: "查询教师对学生的最新反馈信息",
    },
    FewShot {
        questions: &["我的学习时间统计", "学习行为分析"],
        intent: QueryIntent::LearningAnalytics,
        sql: "SELECT ins.course_content, COUNT(la.activity_id) as total_activities, SUM(la.duration_minutes) as total_minutes, AVG(la.duration_minutes) as avg_duration, la.device_type, COUNT(DISTINCT DATE(la.activity_date)) as active_days FROM LearningActivity la JOIN Intelligent_Supervision ins ON la.serial_number = ins.serial_number WHERE la.student_id = %s GROUP BY ins.course_content, la.device_type ORDER BY total_minutes DESC",
        params: &[USER_ID_TOKEN],
        explanation: "分析学生的学习行为和时间分布",
    },
    FewShot {
        questions: &["我和其他同学相比怎么样？", "班级排名"],
        intent: QueryIntent::PeerComparison,
        sql: "WITH student_stats AS (SELECT s.student_id, s.student_name, COUNT(CASE WHEN lr.submitted = TRUE THEN 1 END) as completed, AVG(sg.grade) as avg_grade FROM students s LEFT JOIN LabReport lr ON s.student_id = lr.student_id LEFT JOIN StudentGrades sg ON s.student_id = sg.student_id GROUP BY s.student_id, s.student_name), ranked_students AS (SELECT *, RANK() OVER (ORDER BY completed DESC, avg_grade DESC) as rank FROM student_stats) SELECT rs.rank, rs.completed, rs.avg_grade, (SELECT COUNT(*) FROM ranked_students) as total_students FROM ranked_students rs WHERE rs.student_id = %s",
        params: &[USER_ID_TOKEN],
        explanation: "比较当前学生与同班同学的学习表现",
    },
    FewShot {
        questions: &["有什么重要通知？", "最新公告"],
        intent: QueryIntent::Announcement,
        sql: "SELECT title, content, announcement_type, publish_date, expire_date, CASE WHEN announcement_type = 'urgent' THEN '紧急' WHEN announcement_type = 'deadline' THEN '截止提醒' WHEN announcement_type = 'exam' THEN '考试通知' ELSE '一般通知' END as type_zh FROM Announcements WHERE is_active = TRUE AND (target_students IS NULL OR target_students::text LIKE %s) AND (expire_date IS NULL OR expire_date >= CURRENT_DATE) ORDER BY CASE WHEN announcement_type = 'urgent' THEN 1 ELSE 2 END, publish_date DESC LIMIT 5",
        params: &["%\"{user_id}\"%"],
        explanation: "查询针对该学生的有效通知公告",
    },
    FewShot {
        questions: &["我应该重点学习什么？", "学习建议"],
        intent: QueryIntent::StudyRecommendation,
        sql: "SELECT ins.course_content, ins.online_learning_date, ins.report_deadline, CASE WHEN lr.submitted IS FALSE OR lr.submitted IS NULL THEN '需要完成实验报告' END as recommendation, CASE WHEN ins.report_deadline - CURRENT_DATE <= 7 THEN '高优先级' WHEN ins.report_deadline - CURRENT_DATE <= 14 THEN '中优先级' ELSE '低优先级' END as priority FROM Intelligent_Supervision ins LEFT JOIN LabReport lr ON ins.serial_number = lr.serial_number AND lr.student_id = %s WHERE lr.submitted IS FALSE OR lr.submitted IS NULL ORDER BY ins.report_deadline",
        params: &[USER_ID_TOKEN],
        explanation: "基于截止日期和完成情况给出学习建议",
    },
    FewShot {
        questions: &["我看了多少学习资料？", "资源使用情况"],
        intent: QueryIntent::ResourceUsage,
        sql: "SELECT ra.resource_type, ra.resource_name, COUNT(*) as access_count, SUM(ra.access_duration_seconds) as total_seconds, AVG(ra.access_duration_seconds) as avg_seconds, MAX(ra.access_date) as last_access, CASE WHEN ra.resource_type = 'lecture_video' THEN '讲课视频' WHEN ra.resource_type = 'slides' THEN '课件' WHEN ra.resource_type = 'example_code' THEN '示例代码' WHEN ra.resource_type = 'reference' THEN '参考资料' ELSE '其他' END as resource_type_zh FROM ResourceAccess ra WHERE ra.student_id = %s GROUP BY ra.resource_type, ra.resource_name ORDER BY total_seconds DESC",
        params: &[USER_ID_TOKEN],
        explanation: "统计学生对各类学习资源的使用情况",
    },
];

/// Example for `intent`, if one exists.
pub fn example_for(intent: QueryIntent) -> Option<&'static FewShot> {
    EXAMPLES.iter().find(|e| e.intent == intent)
}

impl FewShot {
    /// Parameters with the caller's id substituted.
    pub fn params_for(&self, user_id: &str) -> Vec<String> {
        self.params
            .iter()
            .map(|p| p.replace(USER_ID_TOKEN, user_id))
            .collect()
    }
}
