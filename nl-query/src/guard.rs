//! Safety gate between the generator and the executor.
//!
//! Two layers:
//! - [`validate`]: textual deny-list plus the `SELECT`/`WITH` prefix rule.
//! - [`inspect`]: `validate`, then (under [`GuardPolicy::strict`]) a parse
//!   of the rewritten statement that only admits a single read-only query,
//!   never compares `student_id` with an inline literal, and equates
//!   `student_id` with a parameter carrying the caller's id whenever a
//!   personal table is read.

use std::ops::ControlFlow;

use sqlparser::ast::{
    BinaryOperator, Expr, JoinConstraint, JoinOperator, ObjectName, Query, Select, SetExpr,
    Statement, TableFactor, Value as SqlValue, Visit, Visitor,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use study_store::{BindValue, PlaceholderError, rewrite_placeholders};
use thiserror::Error;

use crate::schema::PERSONAL_TABLES;

/// Keywords that must not appear anywhere in the upper-cased statement.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE",
];

/// Which checks [`inspect`] runs beyond [`validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuardPolicy {
    pub strict: bool,
    pub enforce_caller_scope: bool,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            strict: true,
            enforce_caller_scope: true,
        }
    }
}

/// Why a generated statement was refused. Logged, never shown to users.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("empty statement")]
    Empty,
    #[error("forbidden keyword {0}")]
    ForbiddenKeyword(&'static str),
    #[error("statement does not start with SELECT or WITH")]
    NotSelect,
    #[error("{0}")]
    Placeholder(#[from] PlaceholderError),
    #[error("statement expects {expected} parameters, got {got}")]
    ParamCountMismatch { expected: usize, got: usize },
    #[error("unparsable statement: {0}")]
    Parse(String),
    #[error("expected exactly one statement, got {0}")]
    StatementCount(usize),
    #[error("statement is not a query")]
    NotAQuery,
    #[error("query body is not read-only")]
    NotReadOnly,
    #[error("SELECT INTO is not allowed")]
    SelectInto,
    #[error("row locking clauses are not allowed")]
    Locking,
    #[error("student_id compared against an inline literal")]
    InlineStudentId,
    #[error("reads {table} without binding the caller's id")]
    MissingCallerScope { table: String },
}

/// Textual safety check.
///
/// `true` iff the statement is non-empty, contains none of
/// [`FORBIDDEN_KEYWORDS`] as a substring of its upper-cased text, and its
/// trimmed upper-cased text starts with `SELECT` or `WITH`.
pub fn validate(sql: &str) -> bool {
    textual_rejection(sql).is_none()
}

fn textual_rejection(sql: &str) -> Option<Rejection> {
    if sql.is_empty() {
        return Some(Rejection::Empty);
    }
    let upper = sql.to_uppercase();
    if let Some(kw) = FORBIDDEN_KEYWORDS.iter().copied().find(|kw| upper.contains(kw)) {
        return Some(Rejection::ForbiddenKeyword(kw));
    }
    let head = upper.trim();
    if !(head.starts_with("SELECT") || head.starts_with("WITH")) {
        return Some(Rejection::NotSelect);
    }
    None
}

/// Full gate applied before execution.
///
/// # Errors
/// The first [`Rejection`] found.
pub fn inspect(
    sql: &str,
    params: &[BindValue],
    caller: &str,
    policy: GuardPolicy,
) -> Result<(), Rejection> {
    if let Some(r) = textual_rejection(sql) {
        return Err(r);
    }
    if !policy.strict {
        return Ok(());
    }

    let rewritten = rewrite_placeholders(sql)?;
    if rewritten.count != params.len() {
        return Err(Rejection::ParamCountMismatch {
            expected: rewritten.count,
            got: params.len(),
        });
    }

    let statements = Parser::parse_sql(&PostgreSqlDialect {}, &rewritten.sql)
        .map_err(|e| Rejection::Parse(e.to_string()))?;
    if statements.len() != 1 {
        return Err(Rejection::StatementCount(statements.len()));
    }
    if !matches!(statements[0], Statement::Query(_)) {
        return Err(Rejection::NotAQuery);
    }

    let mut scan = Scan::default();
    if let ControlFlow::Break(r) = statements.visit(&mut scan) {
        return Err(r);
    }

    if policy.enforce_caller_scope {
        if let Some(table) = scan.relations.iter().find(|t| PERSONAL_TABLES.contains(&t.as_str())) {
            if !binds_caller(&scan.scoped_params, params, caller) {
                return Err(Rejection::MissingCallerScope {
                    table: table.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Whether one of the placeholders equated with `student_id` carries `caller`.
fn binds_caller(scoped: &[usize], params: &[BindValue], caller: &str) -> bool {
    let caller = caller.trim();
    !caller.is_empty()
        && scoped
            .iter()
            .filter_map(|n| n.checked_sub(1).and_then(|i| params.get(i)))
            .filter_map(BindValue::as_text)
            .any(|p| p.trim() == caller)
}

/* ---------------------------------------------------------------------- */
/* AST walk                                                               */
/* ---------------------------------------------------------------------- */

/// The visitor has no query hook: the top-level query is entered from
/// `pre_visit_statement`, subqueries from the table-factor and expression
/// hooks, and CTEs and set operations by hand in [`Scan::check_query`].
#[derive(Default)]
struct Scan {
    /// Lower-cased unqualified relation names, CTE names included.
    relations: Vec<String>,
    /// 1-based placeholder indices in a `student_id = $n` conjunct of some
    /// WHERE or JOIN ON clause.
    scoped_params: Vec<usize>,
}

impl Scan {
    fn check_query(&mut self, query: &Query) -> ControlFlow<Rejection> {
        if !query.locks.is_empty() {
            return ControlFlow::Break(Rejection::Locking);
        }
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.check_query(&cte.query)?;
            }
        }
        self.check_body(&query.body)
    }

    fn check_body(&mut self, body: &SetExpr) -> ControlFlow<Rejection> {
        match body {
            SetExpr::Select(select) => {
                if select.into.is_some() {
                    return ControlFlow::Break(Rejection::SelectInto);
                }
                self.collect_scope(select);
                ControlFlow::Continue(())
            }
            SetExpr::Query(query) => self.check_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.check_body(left)?;
                self.check_body(right)
            }
            SetExpr::Values(_) => ControlFlow::Continue(()),
            _ => ControlFlow::Break(Rejection::NotReadOnly),
        }
    }

    fn collect_scope(&mut self, select: &Select) {
        let mut conditions: Vec<&Expr> = select.selection.iter().collect();
        for table in &select.from {
            for join in &table.joins {
                if let Some(JoinConstraint::On(on)) = join_constraint(&join.join_operator) {
                    conditions.push(on);
                }
            }
        }
        for cond in conditions {
            let mut conjuncts = Vec::new();
            split_and(cond, &mut conjuncts);
            self.scoped_params
                .extend(conjuncts.into_iter().filter_map(student_id_placeholder));
        }
    }
}

impl Visitor for Scan {
    type Break = Rejection;

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<Self::Break> {
        match statement {
            Statement::Query(query) => self.check_query(query),
            _ => ControlFlow::Break(Rejection::NotAQuery),
        }
    }

    fn pre_visit_table_factor(&mut self, factor: &TableFactor) -> ControlFlow<Self::Break> {
        match factor {
            TableFactor::Derived { subquery, .. } => self.check_query(subquery),
            _ => ControlFlow::Continue(()),
        }
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        if let Some(last) = relation.0.last() {
            self.relations.push(last.value.to_lowercase());
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        match expr {
            Expr::Subquery(q) | Expr::ArraySubquery(q) => return self.check_query(q),
            Expr::Exists { subquery, .. } | Expr::InSubquery { subquery, .. } => {
                return self.check_query(subquery);
            }
            _ => {}
        }
        let inline = match expr {
            Expr::BinaryOp { left, right, .. } => {
                (is_student_id(left) && is_literal(right))
                    || (is_student_id(right) && is_literal(left))
            }
            Expr::InList { expr, list, .. } => is_student_id(expr) && list.iter().any(is_literal),
            Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } => {
                is_student_id(expr) && is_literal(pattern)
            }
            _ => false,
        };
        if inline {
            ControlFlow::Break(Rejection::InlineStudentId)
        } else {
            ControlFlow::Continue(())
        }
    }
}

fn join_constraint(op: &JoinOperator) -> Option<&JoinConstraint> {
    match op {
        JoinOperator::Inner(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c)
        | JoinOperator::LeftSemi(c)
        | JoinOperator::RightSemi(c)
        | JoinOperator::LeftAnti(c)
        | JoinOperator::RightAnti(c) => Some(c),
        JoinOperator::CrossJoin | JoinOperator::CrossApply | JoinOperator::OuterApply => None,
    }
}

/// Flattens `a AND (b AND c)` into `[a, b, c]`. OR branches stay whole.
fn split_and<'e>(expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            split_and(left, out);
            split_and(right, out);
        }
        Expr::Nested(inner) => split_and(inner, out),
        other => out.push(other),
    }
}

/// `n` for `student_id = $n` (either side).
fn student_id_placeholder(expr: &Expr) -> Option<usize> {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => {
            if is_student_id(left) {
                placeholder_index(right)
            } else if is_student_id(right) {
                placeholder_index(left)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn placeholder_index(expr: &Expr) -> Option<usize> {
    match expr {
        Expr::Value(SqlValue::Placeholder(p)) => p.strip_prefix('$')?.parse().ok(),
        Expr::Nested(inner) => placeholder_index(inner),
        Expr::Cast { expr, .. } => placeholder_index(expr),
        _ => None,
    }
}

fn is_student_id(expr: &Expr) -> bool {
    match expr {
        Expr::Identifier(id) => id.value.eq_ignore_ascii_case("student_id"),
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .is_some_and(|id| id.value.eq_ignore_ascii_case("student_id")),
        Expr::Nested(inner) => is_student_id(inner),
        Expr::Cast { expr, .. } => is_student_id(expr),
        _ => false,
    }
}

fn is_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Value(SqlValue::Placeholder(_)) | Expr::Value(SqlValue::Null) => false,
        Expr::Value(_) | Expr::TypedString { .. } => true,
        Expr::Nested(inner) => is_literal(inner),
        Expr::Cast { expr, .. } | Expr::UnaryOp { expr, .. } => is_literal(expr),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EXAMPLES;

    const CALLER: &str = "202311081040";

    fn text(s: &str) -> BindValue {
        BindValue::Text(s.to_string())
    }

    fn strict(sql: &str, params: &[BindValue]) -> Result<(), Rejection> {
        inspect(sql, params, CALLER, GuardPolicy::default())
    }

    #[test]
    fn forbidden_keywords_fail_in_any_case() {
        for kw in FORBIDDEN_KEYWORDS {
            assert!(!validate(&format!("SELECT * FROM t; {kw} TABLE t")));
            assert!(!validate(&format!("select 1 /* {} */", kw.to_lowercase())));
        }
        assert!(!validate("DELETE FROM students"));
    }

    #[test]
    fn must_start_with_select_or_with() {
        assert!(!validate(""));
        assert!(!validate("EXPLAIN SELECT 1"));
        assert!(!validate("  (SELECT 1)"));
        assert!(validate("  select 1"));
        assert!(validate("WITH x AS (SELECT 1) SELECT * FROM x"));
    }

    #[test]
    fn substring_rule_is_literal() {
        // created_at contains CREATE: textual rule rejects it.
        assert!(!validate("SELECT created_at FROM StudentGrades"));
    }

    #[test]
    fn worked_examples_pass_strict_inspection() {
        for ex in EXAMPLES {
            let params: Vec<BindValue> = ex.params_for(CALLER).iter().map(|p| text(p)).collect();
            assert_eq!(strict(ex.sql, &params), Ok(()), "example {}", ex.intent);
        }
    }

    #[test]
    fn inline_student_id_literal_is_rejected() {
        assert_eq!(
            strict("SELECT * FROM StudentGrades sg WHERE sg.student_id = '202311081041'", &[]),
            Err(Rejection::InlineStudentId)
        );
        assert_eq!(
            strict(
                "SELECT * FROM students WHERE student_id IN ('a', %s)",
                &[text(CALLER)]
            ),
            Err(Rejection::InlineStudentId)
        );
    }

    #[test]
    fn personal_tables_require_the_caller_id() {
        assert_eq!(
            strict(
                "SELECT grade FROM StudentGrades WHERE student_id = %s",
                &[text("someone-else")]
            ),
            Err(Rejection::MissingCallerScope {
                table: "studentgrades".into()
            })
        );
        assert_eq!(
            strict("SELECT grade FROM StudentGrades", &[]),
            Err(Rejection::MissingCallerScope {
                table: "studentgrades".into()
            })
        );
        let relaxed = GuardPolicy {
            strict: true,
            enforce_caller_scope: false,
        };
        assert_eq!(
            inspect("SELECT grade FROM StudentGrades", &[], CALLER, relaxed),
            Ok(())
        );
    }

    #[test]
    fn shared_tables_need_no_caller_param() {
        assert_eq!(
            strict(
                "SELECT course_content, unit_number, unit_test_date FROM Intelligent_Supervision WHERE unit_test_date >= CURRENT_DATE",
                &[]
            ),
            Ok(())
        );
    }

    #[test]
    fn placeholder_count_must_match_params() {
        assert_eq!(
            strict(
                "SELECT * FROM LabReport WHERE student_id = %s AND serial_number = %s",
                &[text(CALLER)]
            ),
            Err(Rejection::ParamCountMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn multiple_statements_are_rejected() {
        assert_eq!(
            strict("SELECT 1; SELECT 2", &[]),
            Err(Rejection::StatementCount(2))
        );
    }

    #[test]
    fn select_into_and_locks_are_rejected() {
        assert_eq!(
            strict("SELECT * INTO backup FROM students", &[]),
            Err(Rejection::SelectInto)
        );
        // Without an alias, FOR is taken as the alias of `students`.
        assert_eq!(
            strict("SELECT * FROM students s FOR SHARE", &[]),
            Err(Rejection::Locking)
        );
        assert_eq!(
            strict(
                "SELECT student_name FROM students WHERE student_id = %s FOR SHARE NOWAIT",
                &[text(CALLER)]
            ),
            Err(Rejection::Locking)
        );
    }

    #[test]
    fn nested_queries_are_checked_too() {
        let cases = [
            (
                "WITH x AS (SELECT * FROM students s FOR SHARE) SELECT * FROM x",
                Rejection::Locking,
            ),
            (
                "SELECT * FROM (SELECT * FROM students s FOR SHARE) t",
                Rejection::Locking,
            ),
            (
                "SELECT 1 WHERE EXISTS (SELECT 1 FROM students s FOR SHARE)",
                Rejection::Locking,
            ),
            (
                "SELECT (SELECT count(*) FROM students s FOR SHARE) AS n",
                Rejection::Locking,
            ),
            (
                "SELECT 1 UNION SELECT * INTO backup FROM students",
                Rejection::SelectInto,
            ),
        ];
        for (sql, expected) in cases {
            assert_eq!(strict(sql, &[]), Err(expected), "{sql}");
        }
    }

    #[test]
    fn caller_id_must_be_equated_with_student_id() {
        let grades = Err(Rejection::MissingCallerScope {
            table: "studentgrades".into(),
        });
        assert_eq!(
            strict(
                "SELECT sg.student_id, sg.grade FROM StudentGrades sg WHERE sg.student_id <> %s",
                &[text(CALLER)]
            ),
            grades
        );
        assert_eq!(
            strict(
                "SELECT sg.student_id, sg.grade FROM StudentGrades sg WHERE %s IS NOT NULL",
                &[text(CALLER)]
            ),
            grades
        );
        assert_eq!(
            strict(
                "SELECT grade FROM StudentGrades WHERE student_id = %s OR grade > 0",
                &[text(CALLER)]
            ),
            grades
        );
        // The caller's id in a parameter that is not the scoped one
        assert_eq!(
            strict(
                "SELECT grade FROM StudentGrades WHERE student_id = %s AND comments <> %s",
                &[text("202311081041"), text(CALLER)]
            ),
            grades
        );
    }

    #[test]
    fn caller_scope_accepts_conjuncts_joins_and_casts() {
        assert_eq!(
            strict(
                "SELECT grade FROM StudentGrades WHERE (grade > 60 AND (student_id = %s::text))",
                &[text(CALLER)]
            ),
            Ok(())
        );
        assert_eq!(
            strict(
                "SELECT ins.course_content FROM Intelligent_Supervision ins JOIN LabReport lr ON lr.serial_number = ins.serial_number AND %s = lr.student_id",
                &[text(CALLER)]
            ),
            Ok(())
        );
        assert_eq!(
            strict(
                "SELECT grade FROM StudentGrades WHERE student_id = %s",
                &[BindValue::Int(202311081040)]
            ),
            Ok(())
        );
    }

    #[test]
    fn garbage_after_select_fails_to_parse() {
        assert!(matches!(
            strict("SELECT * FROM (", &[]),
            Err(Rejection::Parse(_))
        ));
    }

    #[test]
    fn lenient_policy_only_runs_textual_rules() {
        let lenient = GuardPolicy {
            strict: false,
            enforce_caller_scope: false,
        };
        assert_eq!(inspect("SELECT 1; SELECT 2", &[], CALLER, lenient), Ok(()));
        assert_eq!(
            inspect("DELETE FROM students", &[], CALLER, lenient),
            Err(Rejection::ForbiddenKeyword("DELETE"))
        );
    }
}
