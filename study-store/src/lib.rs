//! Read-only access to the learning-platform database.
//!
//! Public API:
//! - [`QueryExecutor`]: the seam the query pipeline executes through
//! - [`PgExecutor`]: one connection per call, closed on every exit path
//! - [`rewrite_placeholders`]: `%s` → `$n` outside quotes and comments
//! - [`BindValue`], [`CellValue`], [`QueryResult`]: typed binds and cells

mod binds;
mod config;
mod error;
mod executor;
pub mod placeholders;
mod value;

pub use config::DbConfig;
pub use error::StoreError;
pub use executor::{ExecFuture, PgExecutor, QueryExecutor};
pub use placeholders::{PlaceholderError, Rewritten, rewrite_placeholders};
pub use value::{BindValue, CellValue, QueryResult};
