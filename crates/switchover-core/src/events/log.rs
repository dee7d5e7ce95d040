//! Durable event-log seam.

use async_trait::async_trait;

use crate::error::CoreResult;

/// One record fetched from a partition.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub partition: u32,
    /// Position within the partition; commit it to acknowledge everything up
    /// to and including this record.
    pub offset: i64,
    pub payload: Vec<u8>,
}

/// A durable, partitioned, at-least-once event log.
///
/// Appends land on the partition derived from the record key. A consumer
/// group fetches records beyond its committed offset, in order; a fetch that
/// is not followed by a commit redelivers the same records next time.
#[async_trait]
pub trait EventLog: Send + Sync {
    fn partitions(&self) -> u32;

    /// Append one payload to `topic`, partitioned by `key`.
    async fn append(&self, topic: &str, key: i64, payload: &[u8]) -> CoreResult<()>;

    /// Records of `topic`/`partition` beyond `group`'s committed offset.
    async fn fetch(
        &self,
        topic: &str,
        group: &str,
        partition: u32,
        max: i64,
    ) -> CoreResult<Vec<LogRecord>>;

    /// Advance `group`'s committed offset on `partition`. Commits never move
    /// backwards.
    async fn commit_offset(
        &self,
        topic: &str,
        group: &str,
        partition: u32,
        offset: i64,
    ) -> CoreResult<()>;
}

/// Stable key-to-partition assignment; same key, same partition.
pub fn partition_for(key: i64, partitions: u32) -> u32 {
    (key.rem_euclid(i64::from(partitions.max(1)))) as u32
}
