//! Scenes maintain blocks and the partition of blocks into structures under
//! add/remove transactions. The cuboid grid is currently the only scene
//! kind the engine implements.

pub mod cuboid_grid;
