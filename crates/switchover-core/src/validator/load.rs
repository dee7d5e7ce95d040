//! Connection-load sensor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::entity::Entity;
use crate::store::EntityStore;

const SAMPLE_INTERVAL: Duration = Duration::from_secs(60);
const HIGH_LOAD_RATIO: f64 = 0.8;

/// Sample the scanned store's connection load every minute into `flag`.
///
/// A failed sample leaves the flag untouched: an unreadable ratio is not
/// evidence of load.
pub(super) fn spawn<T: Entity>(
    store: Arc<dyn EntityStore<T>>,
    flag: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SAMPLE_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match store.load_ratio().await {
                        Ok(ratio) => {
                            let high = ratio > HIGH_LOAD_RATIO;
                            flag.store(high, Ordering::SeqCst);
                            if high {
                                info!(ratio, "store under high load, validation will pause");
                            } else {
                                debug!(ratio, "store load sampled");
                            }
                        }
                        Err(err) => warn!(error = %err, "load sample failed"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
    })
}
