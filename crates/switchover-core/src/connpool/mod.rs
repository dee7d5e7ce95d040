//! Pattern-routed data access.
//!
//! [`DoubleWritePool`] presents the same surface as a single-store pool so
//! business code stays pattern-agnostic; [`ConnPool`] is that surface,
//! implemented by `sqlx::PgPool` for the raw sides and by the double-write
//! facade itself.

mod args;
mod double_write;
mod pg;

#[cfg(test)]
mod double_write_tests;

pub use args::SqlArg;
pub(crate) use args::bind_args;
pub use double_write::{DoubleWritePool, DoubleWriteTx};

use async_trait::async_trait;
use sqlx::postgres::PgRow;

use crate::error::CoreResult;

/// Connection-pool surface shared by the raw stores and the double-write
/// facade.
#[async_trait]
pub trait ConnPool: Send + Sync {
    /// Run a statement, returning the number of affected rows.
    async fn execute(&self, sql: &str, args: &[SqlArg]) -> CoreResult<u64>;

    /// Run a query returning every matching row.
    async fn fetch_all(&self, sql: &str, args: &[SqlArg]) -> CoreResult<Vec<PgRow>>;

    /// Run a query returning at most one row.
    async fn fetch_optional(&self, sql: &str, args: &[SqlArg]) -> CoreResult<Option<PgRow>>;

    /// Open a transaction on this pool.
    async fn begin(&self) -> CoreResult<Box<dyn TxHandle>>;
}

/// A transaction in flight.
///
/// A handle is driven by one task from begin to completion. Dropping a handle
/// without calling `commit` or `rollback` rolls the underlying transactions
/// back.
#[async_trait]
pub trait TxHandle: Send {
    async fn execute(&mut self, sql: &str, args: &[SqlArg]) -> CoreResult<u64>;

    async fn fetch_all(&mut self, sql: &str, args: &[SqlArg]) -> CoreResult<Vec<PgRow>>;

    async fn fetch_optional(&mut self, sql: &str, args: &[SqlArg]) -> CoreResult<Option<PgRow>>;

    async fn commit(self: Box<Self>) -> CoreResult<()>;

    async fn rollback(self: Box<Self>) -> CoreResult<()>;
}
