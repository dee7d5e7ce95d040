//! [`ConnPool`] and [`TxHandle`] implementations for the underlying sqlx
//! pools.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Transaction};

use super::{bind_args, ConnPool, SqlArg, TxHandle};
use crate::error::CoreResult;

#[async_trait]
impl ConnPool for PgPool {
    async fn execute(&self, sql: &str, args: &[SqlArg]) -> CoreResult<u64> {
        let result = bind_args(sqlx::query(sql), args).execute(self).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, sql: &str, args: &[SqlArg]) -> CoreResult<Vec<PgRow>> {
        Ok(bind_args(sqlx::query(sql), args).fetch_all(self).await?)
    }

    async fn fetch_optional(&self, sql: &str, args: &[SqlArg]) -> CoreResult<Option<PgRow>> {
        Ok(bind_args(sqlx::query(sql), args).fetch_optional(self).await?)
    }

    async fn begin(&self) -> CoreResult<Box<dyn TxHandle>> {
        let tx = PgPool::begin(self).await?;
        Ok(Box::new(tx))
    }
}

#[async_trait]
impl TxHandle for Transaction<'static, Postgres> {
    async fn execute(&mut self, sql: &str, args: &[SqlArg]) -> CoreResult<u64> {
        let result = bind_args(sqlx::query(sql), args).execute(&mut **self).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&mut self, sql: &str, args: &[SqlArg]) -> CoreResult<Vec<PgRow>> {
        Ok(bind_args(sqlx::query(sql), args).fetch_all(&mut **self).await?)
    }

    async fn fetch_optional(&mut self, sql: &str, args: &[SqlArg]) -> CoreResult<Option<PgRow>> {
        Ok(bind_args(sqlx::query(sql), args).fetch_optional(&mut **self).await?)
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        Ok(Transaction::commit(*self).await?)
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        Ok(Transaction::rollback(*self).await?)
    }
}
