//! Typed error for the study-store crate.

use std::time::Duration;

use thiserror::Error;

use crate::placeholders::PlaceholderError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid `DB_*` setting.
    #[error("[Study Store] invalid config {var}: {reason}")]
    Config { var: &'static str, reason: String },

    /// The server refused or dropped the connection.
    #[error("[Study Store] connect failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("[Study Store] connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("[Study Store] {0}")]
    Placeholder(#[from] PlaceholderError),

    /// A parameter does not parse as the type the server expects for it.
    #[error("[Study Store] parameter ${index} is not a valid {type_name}: {reason}")]
    Bind {
        index: usize,
        type_name: String,
        reason: String,
    },

    /// Statement failed on the server (syntax, permissions, timeout).
    #[error("[Study Store] query failed: {0}")]
    Execute(#[source] sqlx::Error),

    #[error("[Study Store] cannot decode column {column} ({type_name}): {reason}")]
    Decode {
        column: String,
        type_name: String,
        reason: String,
    },
}
