//! Postgres implementation of [`EntityStore`].

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Column, Executor, FromRow, PgPool, Statement};

use super::EntityStore;
use crate::connpool::bind_args;
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};

/// One side of the migration, reached through its own pool.
pub struct PgEntityStore<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PgEntityStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _entity: PhantomData }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl<T> EntityStore<T> for PgEntityStore<T>
where
    T: Entity + for<'r> FromRow<'r, PgRow>,
{
    async fn fetch_at_offset(&self, offset: i64) -> CoreResult<Option<T>> {
        let sql = format!("SELECT * FROM {} ORDER BY id ASC OFFSET $1 LIMIT 1", T::TABLE);
        Ok(sqlx::query_as(&sql).bind(offset).fetch_optional(&self.pool).await?)
    }

    async fn fetch_incr_at_offset(&self, watermark: i64, offset: i64) -> CoreResult<Option<T>> {
        let sql = format!(
            "SELECT * FROM {} WHERE utime > $1 ORDER BY utime ASC, id ASC OFFSET $2 LIMIT 1",
            T::TABLE
        );
        Ok(sqlx::query_as(&sql).bind(watermark).bind(offset).fetch_optional(&self.pool).await?)
    }

    async fn fetch_batch(&self, offset: i64, limit: i64) -> CoreResult<Vec<T>> {
        let sql = format!("SELECT * FROM {} ORDER BY id ASC OFFSET $1 LIMIT $2", T::TABLE);
        Ok(sqlx::query_as(&sql).bind(offset).bind(limit).fetch_all(&self.pool).await?)
    }

    async fn fetch_incr_batch(
        &self,
        watermark: i64,
        offset: i64,
        limit: i64,
    ) -> CoreResult<Vec<T>> {
        let sql = format!(
            "SELECT * FROM {} WHERE utime > $1 ORDER BY utime ASC, id ASC OFFSET $2 LIMIT $3",
            T::TABLE
        );
        Ok(sqlx::query_as(&sql)
            .bind(watermark)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn fetch_by_id(&self, id: i64) -> CoreResult<Option<T>> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", T::TABLE);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn fetch_by_ids(&self, ids: &[i64]) -> CoreResult<Vec<T>> {
        let sql = format!("SELECT * FROM {} WHERE id = ANY($1)", T::TABLE);
        Ok(sqlx::query_as(&sql).bind(ids).fetch_all(&self.pool).await?)
    }

    async fn discover_columns(&self) -> CoreResult<Vec<String>> {
        let sql = format!("SELECT * FROM {} LIMIT 1", T::TABLE);
        let statement = self.pool.prepare(&sql).await?;
        Ok(statement.columns().iter().map(|column| column.name().to_owned()).collect())
    }

    async fn upsert(&self, entity: &T, update_columns: &[String]) -> CoreResult<u64> {
        let columns = T::columns();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
        let assignments: Vec<String> = update_columns
            .iter()
            .filter(|column| column.as_str() != "id")
            .map(|column| format!("{column} = EXCLUDED.{column}"))
            .collect();
        let conflict_action = if assignments.is_empty() {
            "DO NOTHING".to_owned()
        } else {
            format!("DO UPDATE SET {}", assignments.join(", "))
        };
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT (id) {}",
            T::TABLE,
            columns.join(", "),
            placeholders.join(", "),
            conflict_action,
        );
        let args = entity.args();
        let result = bind_args(sqlx::query(&sql), &args).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: i64) -> CoreResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn load_ratio(&self) -> CoreResult<f64> {
        let connections: i64 = sqlx::query_scalar("SELECT count(*) FROM pg_stat_activity")
            .fetch_one(&self.pool)
            .await?;
        let max_connections: String =
            sqlx::query_scalar("SHOW max_connections").fetch_one(&self.pool).await?;
        let max: i64 = max_connections
            .parse()
            .map_err(|_| CoreError::Store(format!("unparseable max_connections: {max_connections}")))?;
        if max <= 0 {
            return Ok(0.0);
        }
        Ok(connections as f64 / max as f64)
    }
}
