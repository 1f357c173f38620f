//! Per-intent answer templates. Callers guarantee the minimum row width.

use std::fmt::Write as _;

use chrono::NaiveDate;
use study_store::CellValue;

type Rows = [Vec<CellValue>];

/* ---------------------------------------------------------------------- */
/* Cell helpers                                                           */
/* ---------------------------------------------------------------------- */

/// `YYYY-MM-DD` for dates and timestamps, raw text otherwise.
fn day_text(c: &CellValue) -> String {
    match c {
        CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        CellValue::Timestamp(t) => t.format("%Y-%m-%d").to_string(),
        CellValue::TimestampTz(t) => t.format("%Y-%m-%d").to_string(),
        other => other.to_string(),
    }
}

/// `YYYY-MM-DD HH:MM` for timestamps.
fn minute_text(c: &CellValue) -> String {
    match c {
        CellValue::Timestamp(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        CellValue::TimestampTz(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        other => day_text(other),
    }
}

/// Text of the cell, or `fallback` for NULL and blank text.
fn text_or(c: &CellValue, fallback: &str) -> String {
    match c {
        CellValue::Null => fallback.to_string(),
        CellValue::Text(t) if t.trim().is_empty() => fallback.to_string(),
        other => other.to_string(),
    }
}

fn one_decimal(c: &CellValue) -> String {
    match c.as_f64() {
        Some(v) => format!("{v:.1}"),
        None => text_or(c, "无"),
    }
}

fn days_between(c: &CellValue, today: NaiveDate) -> Option<i64> {
    c.as_date().map(|d| (d - today).num_days())
}

fn days_label(days: Option<i64>) -> String {
    match days {
        Some(n) => format!("{n}天"),
        None => "未知".to_string(),
    }
}

/// Level label for a numeric grade.
pub(crate) fn grade_level(grade: f64) -> &'static str {
    match grade {
        g if g >= 90.0 => "优秀",
        g if g >= 80.0 => "良好",
        g if g >= 70.0 => "中等",
        g if g >= 60.0 => "及格",
        _ => "不及格",
    }
}

fn urgency_emoji(label: &str) -> &'static str {
    match label {
        "紧急" => "🚨",
        "即将到期" => "⏰",
        "正常" => "✅",
        _ => "📝",
    }
}

fn feedback_emoji(label: &str) -> &'static str {
    match label {
        "表扬" => "🌟",
        "提醒" => "⏰",
        "警告" => "⚠️",
        "建议" => "💡",
        _ => "📝",
    }
}

fn grade_emoji(level: &str) -> &'static str {
    match level {
        "优秀" => "🌟",
        "良好" => "👍",
        "中等" => "✅",
        "及格" => "✔️",
        "不及格" => "⚠️",
        _ => "📝",
    }
}

fn announcement_emoji(label: &str) -> &'static str {
    match label {
        "紧急" => "🚨",
        "截止提醒" => "⏰",
        "考试通知" => "📝",
        _ => "📢",
    }
}

fn priority_emoji(label: &str) -> &'static str {
    match label {
        "高优先级" => "🚨",
        "中优先级" => "⏰",
        "低优先级" => "✅",
        _ => "💡",
    }
}

fn hours_minutes(total: i64, unit_secs: i64) -> (i64, i64) {
    let secs = total.max(0) * unit_secs;
    (secs / 3600, secs % 3600 / 60)
}

/* ---------------------------------------------------------------------- */
/* Templates                                                              */
/* ---------------------------------------------------------------------- */

pub(crate) fn experiment_report(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("📋 **未提交的实验报告:**\n\n");
    for r in rows {
        let urgency = r[4].to_string();
        let _ = write!(
            out,
            "{} **{}** (序号: {})\n   📅 截止日期: {}\n   📊 状态: {}\n   ⚠️ 紧急程度: {}\n\n",
            urgency_emoji(&urgency),
            r[1],
            r[0],
            day_text(&r[2]),
            r[3],
            urgency
        );
    }
    out.push_str("💡 **建议**: 请优先完成紧急和即将到期的实验报告，避免逾期影响成绩！");
    out
}

pub(crate) fn unit_test(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("📝 **单元测试安排:**\n\n");
    for r in rows {
        let _ = write!(
            out,
            "📚 **{}** (单元: {})\n   📅 测试日期: {}\n\n",
            r[0],
            r[1],
            day_text(&r[2])
        );
    }
    out.push_str("💡 **建议**: 请提前复习相关课程内容，确保测试顺利通过！");
    out
}

pub(crate) fn course_info(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("📚 **课程信息:**\n\n");
    for r in rows {
        let _ = write!(out, "📖 **{}** (单元: {})\n\n", r[0], r[1]);
    }
    out.push_str("💡 **建议**: 请查看课程资源，合理安排学习时间！");
    out
}

pub(crate) fn student_progress(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("📈 **您的学习进度:**\n\n");
    for r in rows {
        let completed = r[1].as_f64().unwrap_or(0.0);
        let total = r[2].as_f64().unwrap_or(0.0);
        let rate = if total > 0.0 {
            completed / total * 100.0
        } else {
            0.0
        };
        let _ = write!(
            out,
            "📚 **{}**\n   ✅ 已完成: {}/{}\n   📊 完成率: {rate:.1}%\n\n",
            r[0], r[1], r[2]
        );
    }
    out.push_str("💡 **建议**: 保持学习节奏，重点关注完成率较低的课程！");
    out
}

pub(crate) fn learning_schedule(rows: &Rows, today: NaiveDate) -> String {
    let mut out = String::from("📅 **近期学习安排:**\n\n");
    for r in rows {
        let _ = write!(
            out,
            "📖 **{}** (单元: {})\n   📅 在线学习日期: {}\n   ⏰ 距离学习日期: {}\n\n",
            r[0],
            r[2],
            day_text(&r[1]),
            days_label(days_between(&r[1], today))
        );
    }
    out.push_str("💡 **建议**: 请根据安排提前预习，合理分配学习时间！");
    out
}

pub(crate) fn deadline_warning(rows: &Rows, today: NaiveDate) -> String {
    let mut out = String::from("⏰ **即将到期任务提醒:**\n\n");
    for r in rows {
        let days = days_between(&r[1], today);
        let emoji = if days.is_some_and(|d| d <= 3) {
            "🚨"
        } else {
            "⏰"
        };
        let _ = write!(
            out,
            "{emoji} **{}** (序号: {})\n   📅 截止日期: {}\n   ⏰ 剩余: {}\n\n",
            r[0],
            r[2],
            day_text(&r[1]),
            days_label(days)
        );
    }
    out.push_str("💡 **建议**: 请优先完成紧急任务，避免逾期！");
    out
}

pub(crate) fn teacher_feedback(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("👨‍🏫 **教师反馈信息:**\n\n");
    for r in rows {
        let label = text_or(&r[5], "其他");
        let _ = write!(
            out,
            "{} **{label}** - {}\n📚 课程: {}\n💬 内容: {}\n📅 时间: {}\n\n",
            feedback_emoji(&label),
            text_or(&r[3], "系统教师"),
            text_or(&r[4], "通用"),
            r[1],
            minute_text(&r[2])
        );
    }
    out.push_str("💡 **建议**: 请认真对待老师的反馈，这将有助于您的学习进步！");
    out
}

pub(crate) fn peer_comparison(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("📊 **与同学的比较:**\n\n");
    for r in rows {
        let _ = write!(
            out,
            "🏅 **排名**: 第{}/{}\n   ✅ 完成作业数: {}\n   📊 平均成绩: {}\n\n",
            r[0],
            r[3],
            r[1],
            one_decimal(&r[2])
        );
    }
    out.push_str("💡 **建议**: 继续努力，争取提升排名！");
    out
}

pub(crate) fn resource_usage(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("📚 **学习资源使用情况:**\n\n");
    for r in rows {
        let kind = match r.get(6) {
            Some(zh) if !zh.is_null() => zh.to_string(),
            _ => r[0].to_string(),
        };
        let (hours, minutes) = hours_minutes(r[3].as_i64().unwrap_or(0), 1);
        let avg = r[4].as_i64().unwrap_or(0);
        let _ = write!(
            out,
            "📖 **{}** ({kind})\n   🔢 访问次数: {}\n   ⏱️ 总时长: {hours}小时{minutes}分钟\n   ⏰ 平均每次: {avg}秒\n   📅 最后访问: {}\n\n",
            r[1],
            r[2],
            minute_text(&r[5])
        );
    }
    out.push_str("💡 **建议**: 多利用优质资源如讲课视频和课件，提升学习效率！");
    out
}

pub(crate) fn grade_inquiry(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("📝 **您的成绩记录:**\n\n");
    for r in rows {
        let level = match (r.get(5), r[1].as_f64()) {
            (Some(CellValue::Text(l)), _) if !l.trim().is_empty() => l.clone(),
            (_, Some(g)) => grade_level(g).to_string(),
            _ => "未评级".to_string(),
        };
        let _ = write!(
            out,
            "{} **{}**\n   📊 成绩: {} ({level})\n   📅 提交日期: {}\n",
            grade_emoji(&level),
            r[0],
            one_decimal(&r[1]),
            day_text(&r[2])
        );
        if let Some(late) = r[3].as_i64().filter(|d| *d > 0) {
            let _ = writeln!(out, "   ⏰ 迟交: {late}天");
        }
        if !text_or(&r[4], "").is_empty() {
            let _ = writeln!(out, "   💬 评语: {}", r[4]);
        }
        out.push('\n');
    }
    out.push_str("💡 **建议**: 关注成绩较低的课程，查看评语并改进！");
    out
}

pub(crate) fn announcement(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("📢 **最新公告:**\n\n");
    for r in rows {
        let label = match r.get(5) {
            Some(zh) if !zh.is_null() => zh.to_string(),
            _ => r[2].to_string(),
        };
        let _ = write!(
            out,
            "{} **{}** ({label})\n   💬 内容: {}\n   📅 发布时间: {}\n",
            announcement_emoji(&label),
            r[0],
            r[1],
            minute_text(&r[3])
        );
        if !r[4].is_null() {
            let _ = writeln!(out, "   ⏰ 有效期至: {}", day_text(&r[4]));
        }
        out.push('\n');
    }
    out.push_str("💡 **建议**: 请关注紧急和考试相关公告，及时采取行动！");
    out
}

pub(crate) fn study_recommendation(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("💡 **学习建议:**\n\n");
    for r in rows {
        let priority = match r.get(4) {
            Some(p) if !p.is_null() => p.to_string(),
            _ => "低优先级".to_string(),
        };
        let _ = write!(
            out,
            "{} **{}** ({priority})\n   📅 截止日期: {}\n   📚 建议: {}\n\n",
            priority_emoji(&priority),
            r[0],
            day_text(&r[2]),
            text_or(&r[3], "尽快完成实验报告")
        );
    }
    out.push_str("💡 **建议**: 优先完成高优先级任务，合理安排时间！");
    out
}

pub(crate) fn learning_analytics(rows: &Rows, _today: NaiveDate) -> String {
    let mut out = String::from("📊 **学习行为分析:**\n\n");
    for r in rows {
        let (hours, minutes) = hours_minutes(r[2].as_i64().unwrap_or(0), 60);
        let avg = r[3].as_f64().unwrap_or(0.0);
        let _ = write!(
            out,
            "📚 **{}** ({})\n   🔢 学习次数: {}\n   ⏱️ 总时长: {hours}小时{minutes}分钟\n   ⏰ 平均每次: {avg:.0}分钟\n   📅 活跃天数: {}天\n\n",
            r[0],
            text_or(&r[4], "未知设备"),
            r[1],
            r[5]
        );
    }
    out.push_str("💡 **建议**: 保持稳定的学习节奏，合理分配各课程的学习时间！");
    out
}

/// Row dump used for unknown intents and mismatched widths.
pub(crate) fn generic(rows: &Rows) -> String {
    let mut out = String::from("📋 **查询结果:**\n\n");
    for r in rows {
        let line = r.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        let _ = write!(out, "📝 {line}\n\n");
    }
    out.push_str("💡 **建议**: 请检查问题表述或联系管理员获取更多信息！");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn grade_levels_follow_thresholds() {
        assert_eq!(grade_level(95.0), "优秀");
        assert_eq!(grade_level(90.0), "优秀");
        assert_eq!(grade_level(80.0), "良好");
        assert_eq!(grade_level(79.9), "中等");
        assert_eq!(grade_level(60.0), "及格");
        assert_eq!(grade_level(59.5), "不及格");
    }

    #[test]
    fn feedback_uses_defaults_for_missing_course() {
        let ts = NaiveDateTime::parse_from_str("2024-04-02 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let rows = vec![vec![
            text("praise"),
            text("做得好"),
            CellValue::Timestamp(ts),
            text("王老师"),
            CellValue::Null,
            text("表扬"),
        ]];
        let out = teacher_feedback(&rows, NaiveDate::MIN);
        assert!(out.contains("🌟 **表扬** - 王老师"));
        assert!(out.contains("📚 课程: 通用"));
        assert!(out.contains("📅 时间: 2024-04-02 09:30"));
    }

    #[test]
    fn resource_usage_prefers_chinese_label_and_splits_duration() {
        let rows = vec![vec![
            text("slides"),
            text("第一讲"),
            CellValue::Int(3),
            CellValue::Int(3_900),
            CellValue::Float(1300.4),
            CellValue::Null,
            text("课件"),
        ]];
        let out = resource_usage(&rows, NaiveDate::MIN);
        assert!(out.contains("📖 **第一讲** (课件)"));
        assert!(out.contains("⏱️ 总时长: 1小时5分钟"));
        assert!(out.contains("⏰ 平均每次: 1300秒"));
        assert!(out.contains("📅 最后访问: NULL"));
    }

    #[test]
    fn schedule_with_non_date_cell_says_unknown() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let rows = vec![vec![text("OS"), text("soon"), CellValue::Int(2)]];
        let out = learning_schedule(&rows, today);
        assert!(out.contains("⏰ 距离学习日期: 未知"));
    }

    #[test]
    fn study_recommendation_defaults_priority() {
        let rows = vec![vec![
            text("网络"),
            CellValue::Null,
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            CellValue::Null,
        ]];
        let out = study_recommendation(&rows, NaiveDate::MIN);
        assert!(out.contains("✅ **网络** (低优先级)"));
        assert!(out.contains("📚 建议: 尽快完成实验报告"));
    }

    #[test]
    fn announcement_skips_missing_expiry() {
        let rows = vec![vec![
            text("期中考试"),
            text("下周三"),
            text("exam"),
            text("2024-04-01"),
            CellValue::Null,
            text("考试通知"),
        ]];
        let out = announcement(&rows, NaiveDate::MIN);
        assert!(out.contains("📝 **期中考试** (考试通知)"));
        assert!(!out.contains("有效期至"));
    }

    #[test]
    fn analytics_converts_minutes() {
        let rows = vec![vec![
            text("数据库"),
            CellValue::Int(4),
            CellValue::Int(135),
            CellValue::Float(33.75),
            text("PC"),
            CellValue::Int(3),
        ]];
        let out = learning_analytics(&rows, NaiveDate::MIN);
        assert!(out.contains("📚 **数据库** (PC)"));
        assert!(out.contains("⏱️ 总时长: 2小时15分钟"));
        assert!(out.contains("⏰ 平均每次: 34分钟"));
        assert!(out.contains("📅 活跃天数: 3天"));
    }
}
