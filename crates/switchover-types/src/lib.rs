//! # Switchover Types
//!
//! Shared types for the switchover migration toolkit:
//!
//! - **`pattern`** - the four-phase traffic pattern the double-write pool routes by
//! - **`events`** - the inconsistency event carried on the repair topic
//! - **`api`** - request/response models of the migration control surface
//!
//! This crate sits at the bottom of the dependency graph; everything here is
//! `Serialize`/`Deserialize`, `Clone`, and `PartialEq`.

pub mod api;
pub mod events;
pub mod pattern;

pub use api::{
    ApiResponse, MigrationStatus, StartBatchRequest, StartIncrRequest, CODE_BENIGN, CODE_OK,
    CODE_SYSTEM_ERROR,
};
pub use events::{Direction, InconsistentEvent, InconsistentKind};
pub use pattern::AccessPattern;
