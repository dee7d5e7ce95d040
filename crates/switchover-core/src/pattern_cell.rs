//! Process-wide traffic-pattern cell.

use std::sync::atomic::{AtomicU8, Ordering};

use switchover_types::AccessPattern;

/// Atomic holder of the current [`AccessPattern`].
///
/// Hot-path reads are plain atomic loads; concurrent in-flight operations
/// observe either the old or the new value, never a torn one, and adjacent
/// operations on one task may legally observe different patterns.
#[derive(Debug)]
pub struct PatternCell(AtomicU8);

impl PatternCell {
    pub fn new(pattern: AccessPattern) -> Self {
        Self(AtomicU8::new(encode(pattern)))
    }

    pub fn load(&self) -> AccessPattern {
        decode(self.0.load(Ordering::SeqCst))
    }

    pub fn store(&self, pattern: AccessPattern) {
        self.0.store(encode(pattern), Ordering::SeqCst);
    }
}

const fn encode(pattern: AccessPattern) -> u8 {
    match pattern {
        AccessPattern::SrcOnly => 0,
        AccessPattern::SrcFirst => 1,
        AccessPattern::DstFirst => 2,
        AccessPattern::DstOnly => 3,
    }
}

fn decode(value: u8) -> AccessPattern {
    match value {
        0 => AccessPattern::SrcOnly,
        1 => AccessPattern::SrcFirst,
        2 => AccessPattern::DstFirst,
        3 => AccessPattern::DstOnly,
        // The cell only ever stores values produced by `encode`.
        _ => unreachable!("corrupt pattern cell: {value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_pattern() {
        let cell = PatternCell::new(AccessPattern::SrcOnly);
        for pattern in [
            AccessPattern::SrcOnly,
            AccessPattern::SrcFirst,
            AccessPattern::DstFirst,
            AccessPattern::DstOnly,
        ] {
            cell.store(pattern);
            assert_eq!(cell.load(), pattern);
        }
    }

    #[test]
    fn starts_with_the_initial_pattern() {
        let cell = PatternCell::new(AccessPattern::DstFirst);
        assert_eq!(cell.load(), AccessPattern::DstFirst);
    }
}
