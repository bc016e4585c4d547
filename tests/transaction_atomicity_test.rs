//! A transaction that adds a block duplicating an existing
//! index anywhere in the batch must be rejected in full, leaving the world
//! — blocks, structures, and cached solutions alike — exactly as it was.

mod common;

use common::fixtures::{block_spec, unit_block_world};
use gustave::error::GustaveError;
use gustave::scenes::cuboid_grid::{BlockIndex, Transaction};

#[test]
fn a_transaction_with_a_duplicate_block_changes_nothing() {
    let mut world = unit_block_world();
    let mut tx = Transaction::new();
    for y in 0..10 {
        tx.add_block(BlockIndex::new(0, y, 0), block_spec(4000.0, y == 0)).unwrap();
    }
    let first = world.modify(tx).unwrap();
    assert_eq!(first.new_structures.len(), 1);
    let id = first.new_structures.iter().next().unwrap();

    let mut bad_tx = Transaction::new();
    bad_tx.add_block(BlockIndex::new(1, 0, 0), block_spec(4000.0, false)).unwrap();
    bad_tx.add_block(BlockIndex::new(0, 5, 0), block_spec(4000.0, false)).unwrap(); // already exists

    let err = world.modify(bad_tx).unwrap_err();
    assert!(matches!(err, GustaveError::InvalidTransaction(_)));

    assert_eq!(world.blocks().size(), 10, "the block count must be unchanged");
    assert_eq!(world.structures().size(), 1);
    assert!(world.structures().at(id).unwrap().is_solved(), "prior solutions must remain valid");
    assert!(world.blocks().find(BlockIndex::new(1, 0, 0)).is_none(), "no partial block additions survive");
}
