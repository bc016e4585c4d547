//! Index of the oriented face between a block and one of its six neighbours:
//! `(b, +X)` and `(neighbour(b, +X), -X)` name the same physical
//! surface; the canonical form is the one with a positive direction.

use super::block_index::{BlockIndex, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactIndex {
    pub local_block: BlockIndex,
    pub direction: Direction,
}

impl ContactIndex {
    pub fn new(local_block: BlockIndex, direction: Direction) -> Self {
        ContactIndex { local_block, direction }
    }

    /// The same physical surface named from the other endpoint's side, or
    /// `None` if stepping along `direction` would overflow `i64`.
    pub fn opposite(self) -> Option<ContactIndex> {
        let other = self.local_block.neighbour_along(self.direction)?;
        Some(ContactIndex { local_block: other, direction: self.direction.opposite() })
    }

    /// This contact if its direction is already positive, otherwise the
    /// equivalent contact named from the other side.
    pub fn canonical(self) -> Option<ContactIndex> {
        if self.direction.is_positive() { Some(self) } else { self.opposite() }
    }
}
