//! Consumer-group drain loop of the inconsistency topic.

use std::sync::Arc;
use std::time::Duration;

use switchover_types::{Direction, InconsistentEvent};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::OverrideFixer;
use crate::entity::Entity;
use crate::error::CoreResult;
use crate::events::{handle_record, EventLog};
use crate::store::EntityStore;

const FETCH_MAX: i64 = 128;
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drains inconsistency events and repairs one row per event.
///
/// Holds one fixer per direction of trust, both built over the raw store
/// surfaces — the double-write pool is not reachable from here. Every record
/// is acknowledged after handling, successful or not; redelivered or
/// out-of-order events only cause redundant copies of the authoritative row.
pub struct RepairConsumer<T: Entity> {
    log: Arc<dyn EventLog>,
    topic: String,
    group: String,
    src_authoritative: OverrideFixer<T>,
    dst_authoritative: OverrideFixer<T>,
}

impl<T: Entity> RepairConsumer<T> {
    pub async fn new(
        log: Arc<dyn EventLog>,
        topic: impl Into<String>,
        group: impl Into<String>,
        src: Arc<dyn EntityStore<T>>,
        dst: Arc<dyn EntityStore<T>>,
    ) -> CoreResult<Self> {
        let src_authoritative = OverrideFixer::new(src.clone(), dst.clone()).await?;
        let dst_authoritative = OverrideFixer::new(dst, src).await?;
        Ok(Self {
            log,
            topic: topic.into(),
            group: group.into(),
            src_authoritative,
            dst_authoritative,
        })
    }

    /// Drain whatever is currently fetchable on every partition. Returns the
    /// number of records acknowledged.
    pub async fn poll_once(&self) -> CoreResult<usize> {
        let mut handled = 0;
        for partition in 0..self.log.partitions() {
            let records = self.log.fetch(&self.topic, &self.group, partition, FETCH_MAX).await?;
            for record in &records {
                handle_record::<InconsistentEvent, _, _>(record, |event| self.apply(event)).await;
                self.log.commit_offset(&self.topic, &self.group, partition, record.offset).await?;
                handled += 1;
            }
        }
        Ok(handled)
    }

    async fn apply(&self, event: InconsistentEvent) -> CoreResult<()> {
        info!(
            id = event.id,
            direction = event.direction.as_str(),
            kind = event.kind.as_str(),
            "repairing row",
        );
        match event.direction {
            Direction::Src => self.src_authoritative.fix(event.id).await,
            Direction::Dst => self.dst_authoritative.fix(event.id).await,
        }
    }

    /// Spawn the drain loop; it polls until `shutdown` flips or its sender
    /// is dropped.
    pub fn start(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(topic = %self.topic, group = %self.group, "repair consumer started");
            loop {
                if *shutdown.borrow() {
                    break;
                }
                match self.poll_once().await {
                    Ok(handled) if handled > 0 => {}
                    Ok(_) => {
                        tokio::select! {
                            _ = tokio::time::sleep(POLL_INTERVAL) => {}
                            _ = shutdown.changed() => break,
                        }
                    }
                    Err(err) => {
                        error!(error = %err, "event fetch failed");
                        tokio::select! {
                            _ = tokio::time::sleep(POLL_INTERVAL) => {}
                            _ = shutdown.changed() => break,
                        }
                    }
                }
            }
            info!(topic = %self.topic, "repair consumer stopped");
        })
    }
}
