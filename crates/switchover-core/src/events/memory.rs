//! In-process event log with the same at-least-once contract as the
//! Postgres backing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::log::{partition_for, EventLog, LogRecord};
use crate::error::CoreResult;

#[derive(Debug, Default)]
struct Inner {
    /// Append-only payloads per (topic, partition).
    records: HashMap<(String, u32), Vec<Vec<u8>>>,
    /// Committed offset per (topic, group, partition). Offsets are 1-based:
    /// committing `n` acknowledges the first `n` records.
    committed: HashMap<(String, String, u32), i64>,
}

#[derive(Debug)]
pub struct MemEventLog {
    partitions: u32,
    inner: Mutex<Inner>,
}

impl MemEventLog {
    pub fn new(partitions: u32) -> Self {
        Self { partitions: partitions.max(1), inner: Mutex::new(Inner::default()) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every payload ever appended to `topic`, across partitions, in no
    /// particular cross-partition order.
    pub fn payloads(&self, topic: &str) -> Vec<Vec<u8>> {
        let inner = self.lock();
        let mut out = Vec::new();
        for partition in 0..self.partitions {
            if let Some(records) = inner.records.get(&(topic.to_owned(), partition)) {
                out.extend(records.iter().cloned());
            }
        }
        out
    }

    pub fn len(&self, topic: &str) -> usize {
        self.payloads(topic).len()
    }
}

#[async_trait]
impl EventLog for MemEventLog {
    fn partitions(&self) -> u32 {
        self.partitions
    }

    async fn append(&self, topic: &str, key: i64, payload: &[u8]) -> CoreResult<()> {
        let partition = partition_for(key, self.partitions);
        self.lock()
            .records
            .entry((topic.to_owned(), partition))
            .or_default()
            .push(payload.to_vec());
        Ok(())
    }

    async fn fetch(
        &self,
        topic: &str,
        group: &str,
        partition: u32,
        max: i64,
    ) -> CoreResult<Vec<LogRecord>> {
        let inner = self.lock();
        let committed = inner
            .committed
            .get(&(topic.to_owned(), group.to_owned(), partition))
            .copied()
            .unwrap_or(0);
        let records = inner.records.get(&(topic.to_owned(), partition));
        Ok(records
            .map(|records| {
                records
                    .iter()
                    .enumerate()
                    .skip(committed.max(0) as usize)
                    .take(max.max(0) as usize)
                    .map(|(index, payload)| LogRecord {
                        partition,
                        offset: index as i64 + 1,
                        payload: payload.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit_offset(
        &self,
        topic: &str,
        group: &str,
        partition: u32,
        offset: i64,
    ) -> CoreResult<()> {
        let mut inner = self.lock();
        let committed =
            inner.committed.entry((topic.to_owned(), group.to_owned(), partition)).or_insert(0);
        *committed = (*committed).max(offset);
        Ok(())
    }
}
