//! Two non-foundation blocks form a structure disjoint from
//! any foundation; the solver must report the structure unsolvable rather
//! than silently picking an arbitrary potential field.

mod common;

use common::fixtures::{block_spec, unit_block_world};
use gustave::scenes::cuboid_grid::{BlockIndex, Transaction};

#[test]
fn an_island_with_no_foundation_is_unsolvable() {
    let mut world = unit_block_world();
    let mut tx = Transaction::new();
    tx.add_block(BlockIndex::new(0, 0, 0), block_spec(4000.0, false)).unwrap();
    tx.add_block(BlockIndex::new(0, 1, 0), block_spec(4000.0, false)).unwrap();
    tx.add_block(BlockIndex::new(5, 0, 0), block_spec(1.0, true)).unwrap();

    let result = world.modify(tx).unwrap();
    assert_eq!(result.new_structures.len(), 1, "the lone foundation block bonds to nothing, so it forms no structure");

    let id = result.new_structures.iter().next().unwrap();
    let island = world.structures().at(id).unwrap();
    assert!(!island.is_solved());
    assert_eq!(island.block_count(), 2);
    assert!(matches!(island.max_relative_error(), Err(gustave::GustaveError::StructureUnsolvable(_))));
}
