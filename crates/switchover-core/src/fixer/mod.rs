//! Row repair from the authoritative side.

mod consumer;

pub use consumer::RepairConsumer;

use std::sync::Arc;

use crate::entity::Entity;
use crate::error::CoreResult;
use crate::store::EntityStore;

/// Re-reconciles single rows by copying the authoritative side wholesale.
///
/// Built over the raw per-store surfaces. Repairs must not flow through the
/// double-write pool: a pooled write would fan back out to both sides and
/// feed the loop it is meant to close.
pub struct OverrideFixer<T: Entity> {
    base: Arc<dyn EntityStore<T>>,
    target: Arc<dyn EntityStore<T>>,
    columns: Vec<String>,
}

impl<T: Entity> OverrideFixer<T> {
    /// Discovers the column set once, from the base store's statement
    /// metadata.
    pub async fn new(
        base: Arc<dyn EntityStore<T>>,
        target: Arc<dyn EntityStore<T>>,
    ) -> CoreResult<Self> {
        let columns = base.discover_columns().await?;
        Ok(Self { base, target, columns })
    }

    /// Copy the row named by `id` from base to target, replacing every
    /// column; when the base no longer has it, delete it from the target.
    ///
    /// Affecting zero rows means the sides already agreed — a no-op, not an
    /// error, which is what keeps repair idempotent under redelivery.
    pub async fn fix(&self, id: i64) -> CoreResult<()> {
        match self.base.fetch_by_id(id).await? {
            Some(row) => {
                self.target.upsert(&row, &self.columns).await?;
                Ok(())
            }
            None => {
                self.target.delete_by_id(id).await?;
                Ok(())
            }
        }
    }
}
