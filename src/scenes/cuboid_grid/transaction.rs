//! An atomic batch of block additions and removals, and the
//! summary a scene hands back once it has applied one.

use crate::config::StructureIndex;
use crate::error::GustaveError;
use crate::material::PressureStress;
use crate::units::{Mass, Real};
use crate::util::FastSet;

use super::block_index::BlockIndex;

/// The immutable data a new block is created with; mass, stress and the
/// foundation flag never change after insertion.
#[derive(Debug, Clone, Copy)]
pub struct NewBlockSpec {
    pub mass: Real<Mass>,
    pub max_pressure_stress: PressureStress,
    pub is_foundation: bool,
}

impl NewBlockSpec {
    pub fn new(
        mass: Real<Mass>,
        max_pressure_stress: PressureStress,
        is_foundation: bool,
    ) -> Result<Self, GustaveError> {
        if !(mass.value() > 0.0) || !mass.is_finite() {
            return Err(GustaveError::invalid_argument("block mass must be strictly positive and finite"));
        }
        Ok(NewBlockSpec { mass, max_pressure_stress, is_foundation })
    }
}

/// `Transaction{newBlocks, deletedBlocks}`: a pair of sets keyed by block
/// index. `addBlock` rejects a duplicate index within the same transaction;
/// `removeBlock` is idempotent, since the deleted side is itself a set.
#[derive(Debug, Default)]
pub struct Transaction {
    new_blocks: Vec<(BlockIndex, NewBlockSpec)>,
    new_block_indices: FastSet<BlockIndex>,
    deleted_blocks: FastSet<BlockIndex>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self, index: BlockIndex, spec: NewBlockSpec) -> Result<(), GustaveError> {
        if !self.new_block_indices.insert(index) {
            return Err(GustaveError::DuplicateInsertion(index));
        }
        self.new_blocks.push((index, spec));
        Ok(())
    }

    pub fn remove_block(&mut self, index: BlockIndex) {
        self.deleted_blocks.insert(index);
    }

    pub(crate) fn new_blocks(&self) -> &[(BlockIndex, NewBlockSpec)] {
        &self.new_blocks
    }

    pub(crate) fn deleted_blocks(&self) -> &FastSet<BlockIndex> {
        &self.deleted_blocks
    }

    pub fn is_empty(&self) -> bool {
        self.new_blocks.is_empty() && self.deleted_blocks.is_empty()
    }
}

/// A contiguous, half-open range of freshly allocated structure ids (the
/// `StructureIndex` analogue of [`crate::util::IndexRange`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewStructureRange {
    start: u64,
    end: u64,
}

impl NewStructureRange {
    pub(crate) fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        NewStructureRange { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn iter(&self) -> impl Iterator<Item = StructureIndex> {
        (self.start..self.end).map(StructureIndex)
    }
}

/// Outcome of [`super::scene::CuboidGridScene::apply_transaction`]: which
/// structure ids were retired and which were freshly allocated.
#[derive(Debug, Clone)]
pub struct TransactionResult {
    pub new_structures: NewStructureRange,
    pub deleted_structures: Vec<StructureIndex>,
}
