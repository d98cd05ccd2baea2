//! Deep copy and deep comparison of a working set.
//!
//! `Fact` is backed by `serde_json` values, whose `Clone` and `PartialEq`
//! are already structural, so these are thin wrappers. The engine goes
//! through them so mutation detection has exactly one definition.

use crate::Fact;

/// Deep copy of a working set.
#[must_use]
pub fn deep_clone(facts: &[Fact]) -> Vec<Fact> {
    facts.to_vec()
}

/// Structural equality of two working sets, record by record.
#[must_use]
pub fn deep_equal(a: &[Fact], b: &[Fact]) -> bool {
    a == b
}

/// The last-stable copy of the session that mutation detection compares
/// against.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    stable: Vec<Fact>,
}

impl Snapshot {
    pub(crate) fn capture(facts: &[Fact]) -> Self {
        Self {
            stable: deep_clone(facts),
        }
    }

    pub(crate) fn differs(&self, facts: &[Fact]) -> bool {
        !deep_equal(&self.stable, facts)
    }

    pub(crate) fn refresh(&mut self, facts: &[Fact]) {
        self.stable = deep_clone(facts);
    }
}
