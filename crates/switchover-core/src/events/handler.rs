//! Generic retrying consumer handler.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::error;

use super::log::LogRecord;
use crate::error::CoreResult;

const MAX_ATTEMPTS: u32 = 3;
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Decode `record` as JSON and run `handle`, retrying on failure.
///
/// The record is always consumed: an undecodable payload is skipped after an
/// error log, and a handler that still fails after three attempts gives up so
/// one poisoned record cannot stall the partition — the next validation pass
/// re-emits anything that still diverges.
pub async fn handle_record<T, F, Fut>(record: &LogRecord, mut handle: F)
where
    T: DeserializeOwned + Clone,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = CoreResult<()>>,
{
    let decoded: T = match serde_json::from_slice(&record.payload) {
        Ok(value) => value,
        Err(err) => {
            error!(
                error = %err,
                partition = record.partition,
                offset = record.offset,
                "skipping undecodable event",
            );
            return;
        }
    };

    for attempt in 1..=MAX_ATTEMPTS {
        match tokio::time::timeout(ATTEMPT_TIMEOUT, handle(decoded.clone())).await {
            Ok(Ok(())) => return,
            Ok(Err(err)) => {
                error!(
                    error = %err,
                    attempt,
                    partition = record.partition,
                    offset = record.offset,
                    "event handler failed",
                );
            }
            Err(_) => {
                error!(
                    attempt,
                    partition = record.partition,
                    offset = record.offset,
                    "event handler timed out",
                );
            }
        }
    }
    error!(
        partition = record.partition,
        offset = record.offset,
        "event handler exhausted retries, acknowledging anyway",
    );
}
