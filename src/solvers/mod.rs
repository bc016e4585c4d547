//! The solver's own graph model ([`Structure`]) and the Force1 potential
//! solver built on top of it.

pub mod force1;
mod structure;

pub use structure::{Link, LinkConductivities, Node, Structure, Weight};
