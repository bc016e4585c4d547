//! The cuboid-grid scene: a hash map of blocks plus the partition of
//! those blocks into structures, maintained incrementally under
//! [`Transaction`]s.

mod block_index;
mod contact_index;
mod scene;
mod transaction;

pub use block_index::{BlockIndex, Direction};
pub use contact_index::ContactIndex;
pub use scene::CuboidGridScene;
pub use transaction::{NewBlockSpec, NewStructureRange, Transaction, TransactionResult};

pub(crate) use scene::{BlockData, StructureData, StructureTopology, TopologyLink};
