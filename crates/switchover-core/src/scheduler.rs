//! Operator control point for the migration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use switchover_types::{AccessPattern, Direction, MigrationStatus};
use tokio::sync::{watch, Mutex};
use tracing::info;

use crate::connpool::DoubleWritePool;
use crate::entity::Entity;
use crate::events::Producer;
use crate::store::EntityStore;
use crate::validator::Validator;

/// Outcome of a control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    Ok,
    /// The slot already runs a validation. Benign.
    AlreadyRunning,
    /// The slot has nothing to stop. Benign.
    NotRunning,
}

/// One running validation: its shutdown sender plus a flag the spawned task
/// clears when it exits on its own.
struct Slot {
    shutdown: watch::Sender<bool>,
    running: Arc<AtomicBool>,
}

impl Slot {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        let _ = self.shutdown.send(true);
        self.running.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Slots {
    full: Option<Slot>,
    incr: Option<Slot>,
}

/// Owns the traffic pattern and at most one full plus one incremental
/// validation at a time.
///
/// The mutex serializes control transitions only; the pool reads the pattern
/// cell directly, so hot-path traffic never contends with the scheduler.
pub struct Scheduler<T: Entity> {
    src: Arc<dyn EntityStore<T>>,
    dst: Arc<dyn EntityStore<T>>,
    pool: Arc<DoubleWritePool>,
    producer: Arc<dyn Producer>,
    slots: Mutex<Slots>,
}

impl<T: Entity> Scheduler<T> {
    pub fn new(
        src: Arc<dyn EntityStore<T>>,
        dst: Arc<dyn EntityStore<T>>,
        pool: Arc<DoubleWritePool>,
        producer: Arc<dyn Producer>,
    ) -> Self {
        Self { src, dst, pool, producer, slots: Mutex::new(Slots::default()) }
    }

    pub async fn src_only(&self) {
        self.switch_pattern(AccessPattern::SrcOnly).await;
    }

    pub async fn src_first(&self) {
        self.switch_pattern(AccessPattern::SrcFirst).await;
    }

    pub async fn dst_first(&self) {
        self.switch_pattern(AccessPattern::DstFirst).await;
    }

    pub async fn dst_only(&self) {
        self.switch_pattern(AccessPattern::DstOnly).await;
    }

    pub fn pattern(&self) -> AccessPattern {
        self.pool.pattern()
    }

    async fn switch_pattern(&self, pattern: AccessPattern) {
        let _transitions = self.slots.lock().await;
        self.pool.update_pattern(pattern);
        info!(pattern = %pattern, "traffic pattern switched");
    }

    /// Start the single-row full validation. Shares its slot with the
    /// batched variant; only one full scan runs at a time.
    pub async fn start_full_validation(&self) -> ControlOutcome {
        self.start_full(None).await
    }

    /// Start the batched full validation in the shared full slot.
    pub async fn start_full_validation_batch(&self, limit: i64) -> ControlOutcome {
        self.start_full(Some(limit)).await
    }

    async fn start_full(&self, batch_limit: Option<i64>) -> ControlOutcome {
        let mut slots = self.slots.lock().await;
        if slots.full.as_ref().is_some_and(Slot::is_running) {
            return ControlOutcome::AlreadyRunning;
        }
        if let Some(finished) = slots.full.take() {
            finished.stop();
        }
        let mut validator = self.validator_for_pattern();
        if let Some(limit) = batch_limit {
            validator = validator.limit(limit);
        }
        slots.full = Some(launch(validator, batch_limit.is_some(), "full"));
        ControlOutcome::Ok
    }

    /// Stop whichever full-scan variant occupies the slot.
    pub async fn stop_full_validation(&self) -> ControlOutcome {
        let mut slots = self.slots.lock().await;
        match slots.full.take() {
            Some(slot) if slot.is_running() => {
                slot.stop();
                ControlOutcome::Ok
            }
            _ => ControlOutcome::NotRunning,
        }
    }

    /// Alias of [`stop_full_validation`](Self::stop_full_validation): the
    /// single-row and batched variants share one slot.
    pub async fn stop_full_validation_batch(&self) -> ControlOutcome {
        self.stop_full_validation().await
    }

    /// Start the long-running incremental validation from `utime`, sleeping
    /// `interval` between exhausted scans. Independent of the full slot.
    pub async fn start_incremental_validation(
        &self,
        utime: i64,
        interval: Duration,
    ) -> ControlOutcome {
        let mut slots = self.slots.lock().await;
        if slots.incr.as_ref().is_some_and(Slot::is_running) {
            return ControlOutcome::AlreadyRunning;
        }
        if let Some(finished) = slots.incr.take() {
            finished.stop();
        }
        let validator =
            self.validator_for_pattern().incremental(utime).sleep_interval(interval);
        slots.incr = Some(launch(validator, false, "incremental"));
        ControlOutcome::Ok
    }

    pub async fn stop_incremental_validation(&self) -> ControlOutcome {
        let mut slots = self.slots.lock().await;
        match slots.incr.take() {
            Some(slot) if slot.is_running() => {
                slot.stop();
                ControlOutcome::Ok
            }
            _ => ControlOutcome::NotRunning,
        }
    }

    pub async fn status(&self) -> MigrationStatus {
        let slots = self.slots.lock().await;
        MigrationStatus {
            pattern: self.pool.pattern(),
            full_running: slots.full.as_ref().is_some_and(Slot::is_running),
            incr_running: slots.incr.as_ref().is_some_and(Slot::is_running),
        }
    }

    /// Base, target and direction of trust follow the current pattern: under
    /// `SRC_*` the source is streamed and authoritative, under `DST_*` the
    /// roles reverse.
    fn validator_for_pattern(&self) -> Validator<T> {
        if self.pool.pattern().src_leads() {
            Validator::new(self.src.clone(), self.dst.clone(), Direction::Src, self.producer.clone())
        } else {
            Validator::new(self.dst.clone(), self.src.clone(), Direction::Dst, self.producer.clone())
        }
    }
}

fn launch<T: Entity>(validator: Validator<T>, batch: bool, label: &'static str) -> Slot {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    tokio::spawn(async move {
        validator.validate(shutdown_rx, batch).await;
        flag.store(false, Ordering::SeqCst);
        info!(label, "validation finished");
    });
    Slot { shutdown: shutdown_tx, running }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use switchover_types::{Direction, InconsistentEvent};

    use super::*;
    use crate::events::{LogProducer, MemEventLog};
    use crate::store::MemStore;
    use crate::test_support::{dyn_store, sample_row, CallLog, RecordingPool, TestRow};

    const TOPIC: &str = "inconsistent";

    struct Fixture {
        scheduler: Scheduler<TestRow>,
        pool: Arc<DoubleWritePool>,
        src: Arc<MemStore<TestRow>>,
        dst: Arc<MemStore<TestRow>>,
        log: Arc<MemEventLog>,
    }

    fn fixture() -> Fixture {
        let call_log = Arc::new(CallLog::default());
        let pool = Arc::new(DoubleWritePool::new(
            Arc::new(RecordingPool::new("src", call_log.clone())),
            Arc::new(RecordingPool::new("dst", call_log)),
            AccessPattern::SrcOnly,
        ));
        let src = Arc::new(MemStore::new());
        let dst = Arc::new(MemStore::new());
        let log = Arc::new(MemEventLog::new(1));
        let producer = Arc::new(LogProducer::new(log.clone(), TOPIC));
        let scheduler =
            Scheduler::new(dyn_store(src.clone()), dyn_store(dst.clone()), pool.clone(), producer);
        Fixture { scheduler, pool, src, dst, log }
    }

    fn emitted(log: &MemEventLog) -> Vec<InconsistentEvent> {
        log.payloads(TOPIC)
            .iter()
            .map(|payload| serde_json::from_slice(payload).unwrap())
            .collect()
    }

    async fn wait_until_full_finished(scheduler: &Scheduler<TestRow>) {
        for _ in 0..200 {
            if !scheduler.status().await.full_running {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("full validation did not finish");
    }

    #[tokio::test]
    async fn pattern_operations_drive_the_pool() {
        let f = fixture();
        assert_eq!(f.pool.pattern(), AccessPattern::SrcOnly);
        f.scheduler.src_first().await;
        assert_eq!(f.pool.pattern(), AccessPattern::SrcFirst);
        f.scheduler.dst_first().await;
        assert_eq!(f.pool.pattern(), AccessPattern::DstFirst);
        f.scheduler.dst_only().await;
        assert_eq!(f.pool.pattern(), AccessPattern::DstOnly);
        f.scheduler.src_only().await;
        assert_eq!(f.pool.pattern(), AccessPattern::SrcOnly);
    }

    #[tokio::test]
    async fn incremental_slot_guards_double_starts() {
        let f = fixture();
        let interval = Duration::from_millis(20);
        assert_eq!(
            f.scheduler.start_incremental_validation(0, interval).await,
            ControlOutcome::Ok
        );
        assert_eq!(
            f.scheduler.start_incremental_validation(0, interval).await,
            ControlOutcome::AlreadyRunning
        );
        assert_eq!(f.scheduler.stop_incremental_validation().await, ControlOutcome::Ok);
        assert_eq!(f.scheduler.stop_incremental_validation().await, ControlOutcome::NotRunning);
    }

    #[tokio::test]
    async fn stopping_an_idle_full_slot_is_benign() {
        let f = fixture();
        assert_eq!(f.scheduler.stop_full_validation().await, ControlOutcome::NotRunning);
        assert_eq!(f.scheduler.stop_full_validation_batch().await, ControlOutcome::NotRunning);
    }

    #[tokio::test]
    async fn slots_are_independent() {
        let f = fixture();
        assert_eq!(
            f.scheduler.start_incremental_validation(0, Duration::from_millis(20)).await,
            ControlOutcome::Ok
        );
        // The incremental run does not occupy the full slot.
        assert_eq!(f.scheduler.start_full_validation().await, ControlOutcome::Ok);
        let status = f.scheduler.status().await;
        assert!(status.incr_running);
        f.scheduler.stop_incremental_validation().await;
        wait_until_full_finished(&f.scheduler).await;
    }

    #[tokio::test]
    async fn full_validation_follows_the_direction_of_trust() {
        let f = fixture();
        f.scheduler.dst_first().await;
        // Present on the target database, deleted from the source: under a
        // reversed pattern the target-side copy is the truth.
        f.dst.insert(sample_row(3, "kept"));

        assert_eq!(f.scheduler.start_full_validation().await, ControlOutcome::Ok);
        wait_until_full_finished(&f.scheduler).await;

        let events = emitted(&f.log);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, 3);
        assert_eq!(events[0].direction, Direction::Dst);
    }

    #[tokio::test]
    async fn finished_full_run_frees_the_slot() {
        let f = fixture();
        f.src.insert(sample_row(1, "a"));
        f.dst.insert(sample_row(1, "a"));
        assert_eq!(f.scheduler.start_full_validation().await, ControlOutcome::Ok);
        wait_until_full_finished(&f.scheduler).await;
        // The scan ran out of rows and exited by itself; a new start must
        // succeed, and the stale slot must not read as running.
        assert_eq!(f.scheduler.start_full_validation_batch(10).await, ControlOutcome::Ok);
        wait_until_full_finished(&f.scheduler).await;
    }

    #[tokio::test]
    async fn status_reports_pattern_and_slots() {
        let f = fixture();
        f.scheduler.src_first().await;
        let status = f.scheduler.status().await;
        assert_eq!(status.pattern, AccessPattern::SrcFirst);
        assert!(!status.full_running);
        assert!(!status.incr_running);
    }
}
