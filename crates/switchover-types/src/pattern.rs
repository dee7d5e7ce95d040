//! Traffic patterns of the double-write pool.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Routing mode for reads and writes during a migration.
///
/// A migration walks `SrcOnly → SrcFirst → DstFirst → DstOnly`; the leader
/// side (the one named first) is the one whose outcome callers observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessPattern {
    SrcOnly,
    SrcFirst,
    DstFirst,
    DstOnly,
}

impl AccessPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SrcOnly => "SRC_ONLY",
            Self::SrcFirst => "SRC_FIRST",
            Self::DstFirst => "DST_FIRST",
            Self::DstOnly => "DST_ONLY",
        }
    }

    /// Whether the source store is the leader under this pattern.
    pub fn src_leads(self) -> bool {
        matches!(self, Self::SrcOnly | Self::SrcFirst)
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
