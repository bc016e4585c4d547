//! Gustave — a structural integrity engine for voxel-like worlds built from
//! cuboid blocks.
//!
//! The crate is organised leaves-first: [`units`] and [`material`] carry the
//! dimension-tagged scalar contract every other module builds on, [`solvers`]
//! is the numerical engine (an immutable graph plus the Force1 potential
//! solver), [`scenes`] maintains the block/contact/structure partition under
//! transactions, and [`worlds`] composes a scene with a solver and caches one
//! [`solvers::force1::Solution`] per live structure.

pub mod config;
pub mod error;
pub mod material;
pub mod scenes;
pub mod solvers;
pub mod units;
pub mod util;
pub mod worlds;

pub use error::{GustaveError, Result};
