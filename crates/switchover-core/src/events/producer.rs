//! Inconsistency-event publication.

use std::sync::Arc;

use async_trait::async_trait;
use switchover_types::InconsistentEvent;

use super::log::EventLog;
use crate::error::CoreResult;

/// Publishes inconsistency reports for the repair pipeline.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn produce_inconsistent_event(&self, event: InconsistentEvent) -> CoreResult<()>;
}

/// [`Producer`] over a durable [`EventLog`] topic. Sends are synchronous;
/// the caller decides what a failed send means.
pub struct LogProducer {
    log: Arc<dyn EventLog>,
    topic: String,
}

impl LogProducer {
    pub fn new(log: Arc<dyn EventLog>, topic: impl Into<String>) -> Self {
        Self { log, topic: topic.into() }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl Producer for LogProducer {
    async fn produce_inconsistent_event(&self, event: InconsistentEvent) -> CoreResult<()> {
        let payload = serde_json::to_vec(&event)?;
        self.log.append(&self.topic, event.id, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use switchover_types::{Direction, InconsistentKind};

    use super::*;
    use crate::events::memory::MemEventLog;

    #[tokio::test]
    async fn appends_the_wire_encoding() {
        let log = Arc::new(MemEventLog::new(1));
        let producer = LogProducer::new(log.clone(), "inconsistent");

        producer
            .produce_inconsistent_event(InconsistentEvent {
                id: 5,
                direction: Direction::Src,
                kind: InconsistentKind::Neq,
            })
            .await
            .unwrap();

        let payloads = log.payloads("inconsistent");
        assert_eq!(payloads.len(), 1);
        assert_eq!(
            std::str::from_utf8(&payloads[0]).unwrap(),
            r#"{"ID":5,"Direction":"SRC","Type":"neq"}"#
        );
    }

    #[tokio::test]
    async fn same_id_lands_on_the_same_partition() {
        let log = Arc::new(MemEventLog::new(4));
        let producer = LogProducer::new(log.clone(), "inconsistent");
        for kind in [InconsistentKind::Neq, InconsistentKind::TargetMissing] {
            producer
                .produce_inconsistent_event(InconsistentEvent {
                    id: 9,
                    direction: Direction::Src,
                    kind,
                })
                .await
                .unwrap();
        }
        let partition = crate::events::partition_for(9, 4);
        assert_eq!(log.fetch("inconsistent", "g", partition, 10).await.unwrap().len(), 2);
    }
}
