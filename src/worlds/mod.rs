//! The synchronous world: a scene plus a Force1 solver config plus a
//! cache of one solution per live structure, and the reference types
//! used to query it.

mod sync_world;
mod views;

pub use sync_world::World;
pub use views::{BlockRef, Blocks, ContactRef, Contacts, LinkRef, Links, StructureRef, Structures};
