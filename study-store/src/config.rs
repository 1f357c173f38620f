//! Connection settings loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::error::StoreError;

/// Connection settings for the learning database.
///
/// Defaults match a local development install.
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
    /// Server-side `statement_timeout`.
    pub statement_timeout: Duration,
}

impl DbConfig {
    /// Build from `DB_*` environment variables.
    ///
    /// # Errors
    /// [`StoreError::Config`] when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`DbConfig::from_env`], reading through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: env(&lookup, "DB_HOST", "localhost"),
            port: parse(&lookup, "DB_PORT", 5432u16)?,
            database: env(&lookup, "DB_NAME", "learning_system"),
            user: env(&lookup, "DB_USER", "postgres"),
            password: env(&lookup, "DB_PASSWORD", "password"),
            connect_timeout: Duration::from_secs(parse(&lookup, "DB_CONNECT_TIMEOUT_SECS", 10u64)?),
            statement_timeout: Duration::from_secs(parse(
                &lookup,
                "DB_STATEMENT_TIMEOUT_SECS",
                15u64,
            )?),
        })
    }

    /// Connect options for a read-only session with a statement timeout.
    pub(crate) fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
            .application_name("supervision-gateway")
            .options([
                ("default_transaction_read_only", "on".to_string()),
                (
                    "statement_timeout",
                    self.statement_timeout.as_millis().to_string(),
                ),
            ])
    }
}

fn env<F>(lookup: &F, k: &str, dflt: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(k)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| dflt.to_string())
}

fn parse<F, T>(lookup: &F, k: &'static str, dflt: T) -> Result<T, StoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(k).filter(|v| !v.trim().is_empty()) {
        Some(v) => v.trim().parse().map_err(|_| StoreError::Config {
            var: k,
            reason: format!("cannot parse {v:?}"),
        }),
        None => Ok(dflt),
    }
}
