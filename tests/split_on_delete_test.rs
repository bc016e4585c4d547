//! Deleting the middle block of an H-shape's crossbar must
//! split the single structure it belonged to into two, with the old id
//! listed as deleted and two fresh ids listed as new.

mod common;

use common::fixtures::{block_spec, unit_block_world};
use gustave::scenes::cuboid_grid::{BlockIndex, Transaction};

#[test]
fn removing_the_crossbar_middle_splits_the_structure_in_two() {
    let mut world = unit_block_world();
    let mut tx = Transaction::new();
    tx.add_block(BlockIndex::new(0, 0, 0), block_spec(1.0, true)).unwrap();
    tx.add_block(BlockIndex::new(4, 0, 0), block_spec(1.0, true)).unwrap();
    tx.add_block(BlockIndex::new(0, 1, 0), block_spec(1000.0, false)).unwrap();
    tx.add_block(BlockIndex::new(4, 1, 0), block_spec(1000.0, false)).unwrap();
    tx.add_block(BlockIndex::new(1, 1, 0), block_spec(1000.0, false)).unwrap();
    tx.add_block(BlockIndex::new(2, 1, 0), block_spec(1000.0, false)).unwrap();
    tx.add_block(BlockIndex::new(3, 1, 0), block_spec(1000.0, false)).unwrap();
    let built = world.modify(tx).unwrap();
    assert_eq!(built.new_structures.len(), 1);
    let original_id = built.new_structures.iter().next().unwrap();

    let mut split_tx = Transaction::new();
    split_tx.remove_block(BlockIndex::new(2, 1, 0));
    let split = world.modify(split_tx).unwrap();

    assert_eq!(split.deleted_structures, vec![original_id]);
    assert_eq!(split.new_structures.len(), 2);
    assert_eq!(world.structures().size(), 2);

    for new_id in split.new_structures.iter() {
        let structure = world.structures().at(new_id).unwrap();
        assert!(structure.is_solved());
        assert_eq!(structure.block_count(), 3, "each half keeps one foundation and two crossbar blocks");
    }
}
