//! The inconsistency event stream.
//!
//! The validator appends [`InconsistentEvent`](switchover_types::InconsistentEvent)s
//! through a [`Producer`]; the repair consumer drains them as a named group.
//! The log itself is a seam: durable and partitioned on Postgres in
//! production, in-process for tests and local runs. Delivery is
//! at-least-once either way, so every consumer is idempotent.

mod handler;
mod log;
pub mod memory;
mod pg;
mod producer;

pub use handler::handle_record;
pub use log::{partition_for, EventLog, LogRecord};
pub use memory::MemEventLog;
pub use pg::PgEventLog;
pub use producer::{LogProducer, Producer};
