//! Statement execution over a per-call PostgreSQL connection.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgRow, Postgres};
use sqlx::{Column, Connection, Either, Executor, PgConnection, Row, TypeInfo};
use tracing::{debug, info, warn};

use crate::{
    binds::{Typed, coerce},
    config::DbConfig,
    error::StoreError,
    placeholders::rewrite_placeholders,
    value::{BindValue, CellValue, QueryResult},
};

/// Boxed future returned by [`QueryExecutor::execute`].
pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = Result<QueryResult, StoreError>> + Send + 'a>>;

/// Runs one read-only statement with positional parameters.
///
/// `sql` uses `%s` placeholders (or native `$n`), `params` are bound in order.
pub trait QueryExecutor: Send + Sync {
    fn execute<'a>(&'a self, sql: &'a str, params: &'a [BindValue]) -> ExecFuture<'a>;
}

/// PostgreSQL executor without pooling.
///
/// Every call opens its own connection and closes it before returning,
/// whether the statement succeeded or not.
#[derive(Clone, Debug)]
pub struct PgExecutor {
    cfg: DbConfig,
}

impl PgExecutor {
    pub fn new(cfg: DbConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &DbConfig {
        &self.cfg
    }

    async fn connect(&self) -> Result<PgConnection, StoreError> {
        let opts = self.cfg.connect_options();
        match tokio::time::timeout(self.cfg.connect_timeout, PgConnection::connect_with(&opts))
            .await
        {
            Err(_) => Err(StoreError::ConnectTimeout(self.cfg.connect_timeout)),
            Ok(conn) => conn.map_err(StoreError::Connect),
        }
    }

    /// Rewrites placeholders, runs the statement and decodes every row.
    pub async fn run(&self, sql: &str, params: &[BindValue]) -> Result<QueryResult, StoreError> {
        let rewritten = rewrite_placeholders(sql)?;
        let started = Instant::now();

        let mut conn = self.connect().await?;
        debug!(
            host = %self.cfg.host,
            database = %self.cfg.database,
            params = params.len(),
            "connection opened"
        );

        let result = fetch(&mut conn, &rewritten.sql, params).await;
        close(conn).await;

        match &result {
            Ok(r) => info!(
                rows = r.len(),
                latency_ms = started.elapsed().as_millis(),
                "statement executed"
            ),
            Err(e) => warn!(
                error = %e,
                latency_ms = started.elapsed().as_millis(),
                "statement failed"
            ),
        }
        result
    }

    /// `SELECT 1` on a fresh connection.
    pub async fn check_connection(&self) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        let res = sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(StoreError::Execute);
        close(conn).await;
        res
    }

    /// Whether a row exists in `students` for `student_id`.
    pub async fn student_exists(&self, student_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.connect().await?;
        let res = sqlx::query("SELECT 1 FROM students WHERE student_id = $1 LIMIT 1")
            .bind(student_id)
            .fetch_optional(&mut conn)
            .await
            .map(|row| row.is_some())
            .map_err(StoreError::Execute);
        close(conn).await;
        res
    }
}

impl QueryExecutor for PgExecutor {
    fn execute<'a>(&'a self, sql: &'a str, params: &'a [BindValue]) -> ExecFuture<'a> {
        Box::pin(self.run(sql, params))
    }
}

async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        warn!(error = %e, "failed to close connection cleanly");
    }
}

async fn fetch(
    conn: &mut PgConnection,
    sql: &str,
    params: &[BindValue],
) -> Result<QueryResult, StoreError> {
    let types = param_types(conn, sql, params.len()).await?;

    let mut q = sqlx::query(sql).persistent(false);
    for (idx, p) in params.iter().enumerate() {
        let typed = match types.get(idx) {
            Some(ty) => coerce(p, ty).map_err(|reason| StoreError::Bind {
                index: idx + 1,
                type_name: ty.clone(),
                reason,
            })?,
            None => Typed::natural(p),
        };
        q = typed.bind_to(q);
    }

    let rows = q.fetch_all(&mut *conn).await.map_err(StoreError::Execute)?;
    decode_rows(&rows)
}

/// Parameter types the server infers for `$1..$n`, by sqlx type name.
async fn param_types(
    conn: &mut PgConnection,
    sql: &str,
    count: usize,
) -> Result<Vec<String>, StoreError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let described = (&mut *conn)
        .describe(sql)
        .await
        .map_err(StoreError::Execute)?;
    let types = match described.parameters() {
        Some(Either::Left(types)) => types.iter().map(|t| t.name().to_string()).collect(),
        _ => Vec::new(),
    };
    debug!(?types, "parameter types described");
    Ok(types)
}

fn decode_rows(rows: &[PgRow]) -> Result<QueryResult, StoreError> {
    let columns = rows
        .first()
        .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            cells.push(decode_cell(row, idx)?);
        }
        out.push(cells);
    }

    Ok(QueryResult { columns, rows: out })
}

fn get<'r, T>(row: &'r PgRow, idx: usize) -> Result<Option<T>, sqlx::Error>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(idx)
}

fn decode_cell(row: &PgRow, idx: usize) -> Result<CellValue, StoreError> {
    let column = &row.columns()[idx];
    let type_name = column.type_info().name();

    let decoded: Result<Option<CellValue>, sqlx::Error> = match type_name {
        "BOOL" => get::<bool>(row, idx).map(|v| v.map(CellValue::Bool)),
        "INT2" => get::<i16>(row, idx).map(|v| v.map(|x| CellValue::Int(x.into()))),
        "INT4" => get::<i32>(row, idx).map(|v| v.map(|x| CellValue::Int(x.into()))),
        "INT8" => get::<i64>(row, idx).map(|v| v.map(CellValue::Int)),
        "FLOAT4" => get::<f32>(row, idx).map(|v| v.map(|x| CellValue::Float(x.into()))),
        "FLOAT8" => get::<f64>(row, idx).map(|v| v.map(CellValue::Float)),
        "NUMERIC" => get::<Decimal>(row, idx).map(|v| v.map(CellValue::Numeric)),
        "DATE" => get::<NaiveDate>(row, idx).map(|v| v.map(CellValue::Date)),
        "TIMESTAMP" => get::<NaiveDateTime>(row, idx).map(|v| v.map(CellValue::Timestamp)),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, idx).map(|v| v.map(CellValue::TimestampTz)),
        "TIME" => get::<NaiveTime>(row, idx).map(|v| v.map(|t| CellValue::Text(t.to_string()))),
        "INTERVAL" => {
            get::<PgInterval>(row, idx).map(|v| v.map(|i| CellValue::Text(render_interval(&i))))
        }
        "JSON" | "JSONB" => get::<serde_json::Value>(row, idx)
            .map(|v| v.map(|j| CellValue::Text(j.to_string()))),
        _ => get::<String>(row, idx).map(|v| v.map(CellValue::Text)),
    };

    decoded
        .map(|v| v.unwrap_or(CellValue::Null))
        .map_err(|e| StoreError::Decode {
            column: column.name().to_string(),
            type_name: type_name.to_string(),
            reason: e.to_string(),
        })
}

/// `1 mon 2 days 01:30:00`-style rendering, matching `psql` output.
fn render_interval(i: &PgInterval) -> String {
    let mut parts = Vec::new();
    if i.months != 0 {
        parts.push(format!("{} mon", i.months));
    }
    if i.days != 0 {
        parts.push(format!("{} days", i.days));
    }
    if i.microseconds != 0 || parts.is_empty() {
        let total = i.microseconds / 1_000_000;
        let sign = if total < 0 { "-" } else { "" };
        let total = total.abs();
        parts.push(format!(
            "{sign}{:02}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        ));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_rendering() {
        let i = PgInterval {
            months: 0,
            days: 2,
            microseconds: 5_400_000_000,
        };
        assert_eq!(render_interval(&i), "2 days 01:30:00");
        let zero = PgInterval {
            months: 0,
            days: 0,
            microseconds: 0,
        };
        assert_eq!(render_interval(&zero), "00:00:00");
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL server reachable through DB_*"]
    async fn string_params_bind_to_inferred_types() -> Result<(), StoreError> {
        let exec = PgExecutor::new(DbConfig::from_env()?);
        let text = |s: &str| BindValue::Text(s.to_string());

        let dated = exec
            .run("SELECT 1 WHERE DATE '2024-03-01' >= %s", &[text("2024-01-01")])
            .await?;
        assert_eq!(dated.len(), 1);

        let unit = exec.run("SELECT 1 WHERE 3 = %s", &[text("3")]).await?;
        assert_eq!(unit.len(), 1);

        let null = exec
            .run("SELECT 1 WHERE %s::date IS NULL", &[BindValue::Null])
            .await?;
        assert_eq!(null.len(), 1);

        let bad = exec.run("SELECT 1 WHERE 3 = %s", &[text("three")]).await;
        assert!(matches!(bad, Err(StoreError::Bind { index: 1, .. })));
        Ok(())
    }
}
