//! Bidirectional validation of the two stores.

mod load;
mod throttle;


pub use throttle::SlideWindow;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use switchover_types::{Direction, InconsistentEvent, InconsistentKind};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::entity::Entity;
use crate::events::Producer;
use crate::store::EntityStore;

const QUERY_TIMEOUT: Duration = Duration::from_secs(1);
const HIGH_LOAD_PAUSE: Duration = Duration::from_secs(60);
// Keeps a persistently failing scan query at one attempt per second instead
// of a hot loop.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Streams rows from the base store and compares them against the target
/// store, emitting one event per divergent row.
///
/// Two symmetric scanners run concurrently: base→target finds rows the
/// target lacks or disagrees on, target→base finds rows the base lacks.
/// "Base" is the side being streamed — under a reversed direction of trust
/// the base is the target database.
pub struct Validator<T: Entity> {
    base: Arc<dyn EntityStore<T>>,
    target: Arc<dyn EntityStore<T>>,
    direction: Direction,
    producer: Arc<dyn Producer>,
    high_load: Arc<AtomicBool>,
    incremental: bool,
    utime: i64,
    sleep_interval: Duration,
    limit: i64,
    throttle: Option<SlideWindow>,
}

impl<T: Entity> Validator<T> {
    pub fn new(
        base: Arc<dyn EntityStore<T>>,
        target: Arc<dyn EntityStore<T>>,
        direction: Direction,
        producer: Arc<dyn Producer>,
    ) -> Self {
        Self {
            base,
            target,
            direction,
            producer,
            high_load: Arc::new(AtomicBool::new(false)),
            incremental: false,
            utime: 0,
            sleep_interval: Duration::ZERO,
            limit: 0,
            throttle: None,
        }
    }

    /// Only consider base rows updated after the watermark.
    pub fn incremental(mut self, utime: i64) -> Self {
        self.incremental = true;
        self.utime = utime;
        self
    }

    /// Sleep this long on scan exhaustion instead of exiting, then resume.
    pub fn sleep_interval(mut self, interval: Duration) -> Self {
        self.sleep_interval = interval;
        self
    }

    /// Rows per iteration of the batched strategy.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Cap scan iterations with a sliding window.
    pub fn throttle(mut self, throttle: SlideWindow) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Run both scanners until they exhaust (or forever, with a sleep
    /// interval). `shutdown` stops them promptly; a query already in flight
    /// finishes within its one-second deadline first.
    pub async fn validate(&self, shutdown: watch::Receiver<bool>, batch: bool) {
        let sensor = load::spawn(self.base.clone(), self.high_load.clone(), shutdown.clone());
        if batch {
            tokio::join!(
                self.scan_base_to_target_batch(shutdown.clone()),
                self.scan_target_to_base_batch(shutdown.clone()),
            );
        } else {
            tokio::join!(
                self.scan_base_to_target(shutdown.clone()),
                self.scan_target_to_base(shutdown.clone()),
            );
        }
        sensor.abort();
    }

    async fn scan_base_to_target(&self, mut shutdown: watch::Receiver<bool>) {
        let mut offset: i64 = 0;
        loop {
            if *shutdown.borrow() {
                return;
            }
            if !self.admit(&mut shutdown).await {
                return;
            }

            let row = match timeout(QUERY_TIMEOUT, self.from_base(offset)).await {
                Err(_) => {
                    warn!(offset, "base query timed out, advancing");
                    if sleep_or_shutdown(&mut shutdown, ERROR_BACKOFF).await {
                        return;
                    }
                    offset += 1;
                    continue;
                }
                Ok(Err(err)) => {
                    error!(error = %err, offset, "base query failed, advancing");
                    if sleep_or_shutdown(&mut shutdown, ERROR_BACKOFF).await {
                        return;
                    }
                    offset += 1;
                    continue;
                }
                Ok(Ok(None)) => {
                    if self.sleep_interval.is_zero() {
                        return;
                    }
                    if sleep_or_shutdown(&mut shutdown, self.sleep_interval).await {
                        return;
                    }
                    continue;
                }
                Ok(Ok(Some(row))) => row,
            };

            match timeout(QUERY_TIMEOUT, self.target.fetch_by_id(row.id())).await {
                Ok(Ok(Some(peer))) => {
                    if !row.compare_to(&peer) {
                        self.notify(row.id(), InconsistentKind::Neq).await;
                    }
                }
                Ok(Ok(None)) => self.notify(row.id(), InconsistentKind::TargetMissing).await,
                Ok(Err(err)) => error!(error = %err, id = row.id(), "target lookup failed"),
                Err(_) => warn!(id = row.id(), "target lookup timed out"),
            }
            offset += 1;
        }
    }

    async fn scan_target_to_base(&self, mut shutdown: watch::Receiver<bool>) {
        let mut offset: i64 = 0;
        loop {
            if *shutdown.borrow() {
                return;
            }
            if !self.admit(&mut shutdown).await {
                return;
            }

            let row = match timeout(QUERY_TIMEOUT, self.from_target(offset)).await {
                Err(_) => {
                    warn!(offset, "target query timed out, advancing");
                    if sleep_or_shutdown(&mut shutdown, ERROR_BACKOFF).await {
                        return;
                    }
                    offset += 1;
                    continue;
                }
                Ok(Err(err)) => {
                    error!(error = %err, offset, "target query failed, advancing");
                    if sleep_or_shutdown(&mut shutdown, ERROR_BACKOFF).await {
                        return;
                    }
                    offset += 1;
                    continue;
                }
                Ok(Ok(None)) => {
                    if self.sleep_interval.is_zero() {
                        return;
                    }
                    if sleep_or_shutdown(&mut shutdown, self.sleep_interval).await {
                        return;
                    }
                    continue;
                }
                Ok(Ok(Some(row))) => row,
            };

            match timeout(QUERY_TIMEOUT, self.base.fetch_by_id(row.id())).await {
                Ok(Ok(Some(peer))) => {
                    if !row.compare_to(&peer) {
                        self.notify(row.id(), InconsistentKind::Neq).await;
                    }
                }
                Ok(Ok(None)) => self.notify(row.id(), InconsistentKind::BaseMissing).await,
                Ok(Err(err)) => error!(error = %err, id = row.id(), "base lookup failed"),
                Err(_) => warn!(id = row.id(), "base lookup timed out"),
            }
            offset += 1;
        }
    }

    async fn scan_base_to_target_batch(&self, mut shutdown: watch::Receiver<bool>) {
        let limit = self.limit.max(1);
        let mut offset: i64 = 0;
        loop {
            if *shutdown.borrow() {
                return;
            }
            if !self.admit(&mut shutdown).await {
                return;
            }

            let rows = match timeout(QUERY_TIMEOUT, self.batch_from_base(offset, limit)).await {
                Err(_) => {
                    warn!(offset, "base batch timed out, advancing");
                    if sleep_or_shutdown(&mut shutdown, ERROR_BACKOFF).await {
                        return;
                    }
                    offset += limit;
                    continue;
                }
                Ok(Err(err)) => {
                    error!(error = %err, offset, "base batch failed, advancing");
                    if sleep_or_shutdown(&mut shutdown, ERROR_BACKOFF).await {
                        return;
                    }
                    offset += limit;
                    continue;
                }
                Ok(Ok(rows)) => rows,
            };
            if rows.is_empty() {
                if self.sleep_interval.is_zero() {
                    return;
                }
                if sleep_or_shutdown(&mut shutdown, self.sleep_interval).await {
                    return;
                }
                continue;
            }

            let fetched = rows.len() as i64;
            self.diff_batch(&rows, BatchSide::Target).await;
            offset += fetched;

            if fetched < limit {
                if self.sleep_interval.is_zero() {
                    return;
                }
                if sleep_or_shutdown(&mut shutdown, self.sleep_interval).await {
                    return;
                }
            }
        }
    }

    async fn scan_target_to_base_batch(&self, mut shutdown: watch::Receiver<bool>) {
        let limit = self.limit.max(1);
        let mut offset: i64 = 0;
        loop {
            if *shutdown.borrow() {
                return;
            }
            if !self.admit(&mut shutdown).await {
                return;
            }

            let rows = match timeout(QUERY_TIMEOUT, self.batch_from_target(offset, limit)).await {
                Err(_) => {
                    warn!(offset, "target batch timed out, advancing");
                    if sleep_or_shutdown(&mut shutdown, ERROR_BACKOFF).await {
                        return;
                    }
                    offset += limit;
                    continue;
                }
                Ok(Err(err)) => {
                    error!(error = %err, offset, "target batch failed, advancing");
                    if sleep_or_shutdown(&mut shutdown, ERROR_BACKOFF).await {
                        return;
                    }
                    offset += limit;
                    continue;
                }
                Ok(Ok(rows)) => rows,
            };
            if rows.is_empty() {
                if self.sleep_interval.is_zero() {
                    return;
                }
                if sleep_or_shutdown(&mut shutdown, self.sleep_interval).await {
                    return;
                }
                continue;
            }

            let fetched = rows.len() as i64;
            self.diff_batch(&rows, BatchSide::Base).await;
            offset += fetched;

            if fetched < limit {
                if self.sleep_interval.is_zero() {
                    return;
                }
                if sleep_or_shutdown(&mut shutdown, self.sleep_interval).await {
                    return;
                }
            }
        }
    }

    /// Compare one batch against the other side, joined by id in a single
    /// lookup. Each divergent row gets its own event; rows fail alone.
    async fn diff_batch(&self, rows: &[T], side: BatchSide) {
        let ids: Vec<i64> = rows.iter().map(Entity::id).collect();
        let (store, label) = match side {
            BatchSide::Target => (&self.target, "target"),
            BatchSide::Base => (&self.base, "base"),
        };
        let peers = match timeout(QUERY_TIMEOUT, store.fetch_by_ids(&ids)).await {
            Err(_) => {
                warn!(label, "batch lookup timed out");
                return;
            }
            Ok(Err(err)) => {
                error!(error = %err, label, "batch lookup failed");
                return;
            }
            Ok(Ok(peers)) => peers,
        };
        let by_id: HashMap<i64, &T> = peers.iter().map(|peer| (peer.id(), peer)).collect();
        let missing_kind = match side {
            BatchSide::Target => InconsistentKind::TargetMissing,
            BatchSide::Base => InconsistentKind::BaseMissing,
        };
        for row in rows {
            match by_id.get(&row.id()) {
                None => self.notify(row.id(), missing_kind).await,
                Some(peer) if !row.compare_to(peer) => {
                    self.notify(row.id(), InconsistentKind::Neq).await;
                }
                Some(_) => {}
            }
        }
    }

    async fn from_base(&self, offset: i64) -> crate::error::CoreResult<Option<T>> {
        if self.incremental {
            self.base.fetch_incr_at_offset(self.utime, offset).await
        } else {
            self.base.fetch_at_offset(offset).await
        }
    }

    async fn from_target(&self, offset: i64) -> crate::error::CoreResult<Option<T>> {
        if self.incremental {
            self.target.fetch_incr_at_offset(self.utime, offset).await
        } else {
            self.target.fetch_at_offset(offset).await
        }
    }

    async fn batch_from_base(&self, offset: i64, limit: i64) -> crate::error::CoreResult<Vec<T>> {
        if self.incremental {
            self.base.fetch_incr_batch(self.utime, offset, limit).await
        } else {
            self.base.fetch_batch(offset, limit).await
        }
    }

    async fn batch_from_target(&self, offset: i64, limit: i64) -> crate::error::CoreResult<Vec<T>> {
        if self.incremental {
            self.target.fetch_incr_batch(self.utime, offset, limit).await
        } else {
            self.target.fetch_batch(offset, limit).await
        }
    }

    /// Gate one scan iteration on the load flag and the optional throttle.
    /// Returns false when shutdown fired while waiting.
    async fn admit(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        while self.high_load.load(Ordering::SeqCst) {
            tracing::info!("store under high load, pausing validation");
            if sleep_or_shutdown(shutdown, HIGH_LOAD_PAUSE).await {
                return false;
            }
        }
        if let Some(throttle) = &self.throttle {
            while let Some(wait) = throttle.admit() {
                if sleep_or_shutdown(shutdown, wait).await {
                    return false;
                }
            }
        }
        true
    }

    /// Report one divergent row. Emit failures are logged and dropped: the
    /// next scan pass rediscovers anything that still diverges.
    async fn notify(&self, id: i64, kind: InconsistentKind) {
        let event = InconsistentEvent { id, direction: self.direction, kind };
        match timeout(QUERY_TIMEOUT, self.producer.produce_inconsistent_event(event)).await {
            Ok(Ok(())) => debug!(id, kind = kind.as_str(), "inconsistency reported"),
            Ok(Err(err)) => error!(error = %err, id, "failed to report inconsistency"),
            Err(_) => error!(id, "inconsistency report timed out"),
        }
    }
}

#[derive(Clone, Copy)]
enum BatchSide {
    /// Comparing base rows against the target store.
    Target,
    /// Comparing target rows against the base store.
    Base,
}

/// Sleep for `duration` unless shutdown flips first; true when it did (or
/// the sender is gone).
async fn sleep_or_shutdown(shutdown: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => *shutdown.borrow(),
        _ = shutdown.changed() => true,
    }
}
