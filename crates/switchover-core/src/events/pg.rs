//! Postgres-backed event log.

use async_trait::async_trait;
use sqlx::PgPool;

use super::log::{partition_for, EventLog, LogRecord};
use crate::error::{CoreError, CoreResult};

/// Append-only log in two tables: `switchover_events` holds the records with
/// a per-topic monotonic offset, `switchover_offsets` holds each consumer
/// group's committed position.
pub struct PgEventLog {
    pool: PgPool,
    partitions: u32,
}

impl PgEventLog {
    pub fn new(pool: PgPool, partitions: u32) -> Self {
        Self { pool, partitions: partitions.max(1) }
    }

    /// Create the log tables when they do not exist yet.
    pub async fn ensure_schema(&self) -> CoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS switchover_events (
                 offset_id  BIGSERIAL PRIMARY KEY,
                 topic      TEXT NOT NULL,
                 partition_id INT NOT NULL,
                 payload    JSONB NOT NULL,
                 created_at TIMESTAMPTZ NOT NULL DEFAULT now()
             )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS switchover_events_scan_idx
             ON switchover_events (topic, partition_id, offset_id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS switchover_offsets (
                 topic      TEXT NOT NULL,
                 group_name TEXT NOT NULL,
                 partition_id INT NOT NULL,
                 committed  BIGINT NOT NULL DEFAULT 0,
                 PRIMARY KEY (topic, group_name, partition_id)
             )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl EventLog for PgEventLog {
    fn partitions(&self) -> u32 {
        self.partitions
    }

    async fn append(&self, topic: &str, key: i64, payload: &[u8]) -> CoreResult<()> {
        let partition = partition_for(key, self.partitions);
        let payload = std::str::from_utf8(payload)
            .map_err(|err| CoreError::EventLog(format!("payload is not utf-8: {err}")))?;
        sqlx::query(
            "INSERT INTO switchover_events (topic, partition_id, payload) VALUES ($1, $2, $3::jsonb)",
        )
        .bind(topic)
        .bind(partition as i32)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch(
        &self,
        topic: &str,
        group: &str,
        partition: u32,
        max: i64,
    ) -> CoreResult<Vec<LogRecord>> {
        let committed: Option<i64> = sqlx::query_scalar(
            "SELECT committed FROM switchover_offsets
             WHERE topic = $1 AND group_name = $2 AND partition_id = $3",
        )
        .bind(topic)
        .bind(group)
        .bind(partition as i32)
        .fetch_optional(&self.pool)
        .await?;

        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT offset_id, payload::text FROM switchover_events
             WHERE topic = $1 AND partition_id = $2 AND offset_id > $3
             ORDER BY offset_id ASC
             LIMIT $4",
        )
        .bind(topic)
        .bind(partition as i32)
        .bind(committed.unwrap_or(0))
        .bind(max)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(offset, payload)| LogRecord { partition, offset, payload: payload.into_bytes() })
            .collect())
    }

    async fn commit_offset(
        &self,
        topic: &str,
        group: &str,
        partition: u32,
        offset: i64,
    ) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO switchover_offsets (topic, group_name, partition_id, committed)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (topic, group_name, partition_id)
             DO UPDATE SET committed = GREATEST(switchover_offsets.committed, EXCLUDED.committed)",
        )
        .bind(topic)
        .bind(group)
        .bind(partition as i32)
        .bind(offset)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
