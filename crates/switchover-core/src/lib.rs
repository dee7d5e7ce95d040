//! # Switchover Core
//!
//! Live-migration machinery for moving traffic from a source store to a
//! target store with no downtime:
//!
//! - **`connpool`** - the double-write pool routing every read/write per the
//!   current [`AccessPattern`](switchover_types::AccessPattern)
//! - **`validator`** - background scanners comparing the two sides and
//!   reporting divergent rows
//! - **`events`** - the durable, partitioned inconsistency topic
//! - **`fixer`** - the repair consumer copying rows from the authoritative side
//! - **`scheduler`** - the operator control point tying the above together
//!
//! Business rows plug in through the [`Entity`] capability; stores plug in
//! through [`store::EntityStore`], with Postgres and in-memory backings.

pub mod connpool;
pub mod entity;
pub mod error;
pub mod events;
pub mod fixer;
pub mod pattern_cell;
pub mod queue;
pub mod scheduler;
pub mod store;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use connpool::{ConnPool, DoubleWritePool, SqlArg, TxHandle};
pub use entity::Entity;
pub use error::{CoreError, CoreResult};
pub use events::{EventLog, LogProducer, LogRecord, MemEventLog, PgEventLog, Producer};
pub use fixer::{OverrideFixer, RepairConsumer};
pub use pattern_cell::PatternCell;
pub use queue::Queue;
pub use scheduler::{ControlOutcome, Scheduler};
pub use store::{EntityStore, MemStore, PgEntityStore};
pub use validator::{SlideWindow, Validator};
