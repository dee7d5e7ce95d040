//! The inconsistency event carried on the repair topic.

use serde::{Deserialize, Serialize};

/// The side that is authoritative for repairing a reported row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Copy from source to target.
    #[serde(rename = "SRC")]
    Src,
    /// Copy from target to source.
    #[serde(rename = "DST")]
    Dst,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Src => "SRC",
            Self::Dst => "DST",
        }
    }
}

/// What the validator observed for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InconsistentKind {
    /// The compared-against side is missing the row.
    #[serde(rename = "target_missing")]
    TargetMissing,
    /// Both sides have the row but the values differ.
    #[serde(rename = "neq")]
    Neq,
    /// The scanned side is missing the row.
    #[serde(rename = "base_missing")]
    BaseMissing,
}

impl InconsistentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TargetMissing => "target_missing",
            Self::Neq => "neq",
            Self::BaseMissing => "base_missing",
        }
    }
}

/// One divergence between the two stores, keyed by row id.
///
/// Consumers repair by copying the row wholesale from the authoritative side,
/// so handling the same event twice converges on the same state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InconsistentEvent {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Direction")]
    pub direction: Direction,
    #[serde(rename = "Type")]
    pub kind: InconsistentKind,
}
