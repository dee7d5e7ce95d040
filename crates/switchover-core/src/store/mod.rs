//! Raw per-store access used by the validator and the repair pipeline.
//!
//! Everything here runs against one underlying store at a time — never
//! through the double-write facade, which would fan repairs back out into
//! dual writes.

pub mod memory;
mod pg;

pub use memory::MemStore;
pub use pg::PgEntityStore;

use async_trait::async_trait;

use crate::entity::Entity;
use crate::error::CoreResult;

/// Scan and repair surface of one store for one entity type.
///
/// Full scans page in id order; incremental scans page in `(utime, id)`
/// order over rows beyond a watermark. Offset paging drifts under concurrent
/// inserts — callers treat a missing row at a previously seen offset as scan
/// noise, not as divergence.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Row at `offset` of the id-ordered full scan.
    async fn fetch_at_offset(&self, offset: i64) -> CoreResult<Option<T>>;

    /// Row at `offset` of the incremental scan over `utime > watermark`.
    async fn fetch_incr_at_offset(&self, watermark: i64, offset: i64) -> CoreResult<Option<T>>;

    /// Up to `limit` rows of the id-ordered full scan starting at `offset`.
    async fn fetch_batch(&self, offset: i64, limit: i64) -> CoreResult<Vec<T>>;

    /// Batched variant of the incremental scan.
    async fn fetch_incr_batch(&self, watermark: i64, offset: i64, limit: i64)
        -> CoreResult<Vec<T>>;

    async fn fetch_by_id(&self, id: i64) -> CoreResult<Option<T>>;

    async fn fetch_by_ids(&self, ids: &[i64]) -> CoreResult<Vec<T>>;

    /// Column names of the backing table, read from statement metadata.
    async fn discover_columns(&self) -> CoreResult<Vec<String>>;

    /// Insert the row, or replace every column in `update_columns` when the
    /// id already exists. Returns affected rows; zero is a valid outcome.
    async fn upsert(&self, entity: &T, update_columns: &[String]) -> CoreResult<u64>;

    async fn delete_by_id(&self, id: i64) -> CoreResult<u64>;

    /// Live-connection ratio of the store (`connections / max_connections`).
    async fn load_ratio(&self) -> CoreResult<f64>;
}
