//! Library-wide index types ("LibConfig").
//!
//! The original implementation expresses these as compile-time template
//! parameters so a caller can pick narrower or wider index types per world.
//! This crate fixes them instead: node/link indices are scoped to a single
//! structure (never more than a few million blocks in one connected
//! component in practice) while structure ids are scoped to a world's entire
//! lifetime and so get a wider, never-reused counter.

use std::fmt;

/// Index of a node within a single solver [`crate::solvers::Structure`].
pub type NodeIndex = u32;

/// Index of a link within a single solver [`crate::solvers::Structure`].
pub type LinkIndex = u32;

/// Monotonically increasing, never-reused identifier for a structure within
/// one [`crate::worlds::World`]'s lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructureIndex(pub(crate) u64);

impl StructureIndex {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StructureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
