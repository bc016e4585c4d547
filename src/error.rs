//! Crate-wide error type.
//!
//! Every fallible entry point in the library returns `Result<T, GustaveError>`.
//! `Unsolvable` structures are not represented here: failing to converge is an
//! expected outcome of the solver, not an exceptional one, so it is carried in
//! [`crate::solvers::force1::SolverOutcome`] instead.

use crate::config::StructureIndex;
use crate::scenes::cuboid_grid::BlockIndex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GustaveError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("duplicate insertion at {0:?}")]
    DuplicateInsertion(BlockIndex),

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("index out of range: {0}")]
    OutOfRange(String),

    #[error("index overflow: {0}")]
    Overflow(String),

    #[error("structure {0:?} is unsolvable")]
    StructureUnsolvable(StructureIndex),
}

impl GustaveError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_transaction(message: impl Into<String>) -> Self {
        Self::InvalidTransaction(message.into())
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange(message.into())
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::Overflow(message.into())
    }
}

/// Re-exported so call sites in this crate can write `gustave::Result<T>`.
pub type Result<T> = std::result::Result<T, GustaveError>;
