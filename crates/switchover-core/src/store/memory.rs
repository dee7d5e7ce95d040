//! In-process store with the same ordering semantics as the Postgres store.
//!
//! Backs unit tests and local runs where no database is available.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::EntityStore;
use crate::entity::Entity;
use crate::error::CoreResult;

#[derive(Debug, Default)]
pub struct MemStore<T> {
    // BTreeMap keeps rows in id order, matching the full-scan ORDER BY.
    rows: Mutex<BTreeMap<i64, T>>,
}

impl<T: Entity> MemStore<T> {
    pub fn new() -> Self {
        Self { rows: Mutex::new(BTreeMap::new()) }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<i64, T>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, row: T) {
        self.lock().insert(row.id(), row);
    }

    pub fn remove(&self, id: i64) -> Option<T> {
        self.lock().remove(&id)
    }

    pub fn get(&self, id: i64) -> Option<T> {
        self.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn incr_ordered(&self, watermark: i64) -> Vec<T> {
        let mut rows: Vec<T> =
            self.lock().values().filter(|row| row.utime() > watermark).cloned().collect();
        rows.sort_by_key(|row| (row.utime(), row.id()));
        rows
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for MemStore<T> {
    async fn fetch_at_offset(&self, offset: i64) -> CoreResult<Option<T>> {
        Ok(self.lock().values().nth(offset.max(0) as usize).cloned())
    }

    async fn fetch_incr_at_offset(&self, watermark: i64, offset: i64) -> CoreResult<Option<T>> {
        Ok(self.incr_ordered(watermark).into_iter().nth(offset.max(0) as usize))
    }

    async fn fetch_batch(&self, offset: i64, limit: i64) -> CoreResult<Vec<T>> {
        Ok(self
            .lock()
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn fetch_incr_batch(
        &self,
        watermark: i64,
        offset: i64,
        limit: i64,
    ) -> CoreResult<Vec<T>> {
        Ok(self
            .incr_ordered(watermark)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn fetch_by_id(&self, id: i64) -> CoreResult<Option<T>> {
        Ok(self.get(id))
    }

    async fn fetch_by_ids(&self, ids: &[i64]) -> CoreResult<Vec<T>> {
        let rows = self.lock();
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn discover_columns(&self) -> CoreResult<Vec<String>> {
        Ok(T::columns().iter().map(|column| (*column).to_owned()).collect())
    }

    async fn upsert(&self, entity: &T, _update_columns: &[String]) -> CoreResult<u64> {
        self.insert(entity.clone());
        Ok(1)
    }

    async fn delete_by_id(&self, id: i64) -> CoreResult<u64> {
        Ok(u64::from(self.remove(id).is_some()))
    }

    async fn load_ratio(&self) -> CoreResult<f64> {
        Ok(0.0)
    }
}
