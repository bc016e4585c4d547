//! Read-only result of a Force1 solve: either a converged [`Solution`]
//! carrying the potential field, or an [`UnsolvableReason`] explaining why
//! none was found.

use crate::config::NodeIndex;
use crate::error::GustaveError;
use crate::solvers::Structure;
use crate::units::{Force, One, Potential, Real, Vector3};

use super::f1_structure::F1Structure;

/// Why a structure's Force1 solve did not produce a [`Solution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsolvableReason {
    /// A non-foundation node is not reachable from any foundation node.
    UnreachableNode,
    /// `maxIterations` was reached before `maxRelError` cleared the target.
    IterationBudgetExhausted,
}

/// The outcome of one [`super::solve`] call: a structure always converges or
/// reports exactly why it didn't — this is an expected, commonly-handled
/// result, not an error.
#[derive(Debug, Clone)]
pub enum SolverOutcome {
    Solved(Solution),
    Unsolvable(UnsolvableReason),
}

impl SolverOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, SolverOutcome::Solved(_))
    }
}

/// A converged potential field over one structure, plus the pieces needed
/// to turn it into per-contact force vectors.
#[derive(Debug, Clone)]
pub struct Solution {
    structure: Structure,
    f1: F1Structure,
    potentials: Vec<Real<Potential>>,
    max_relative_error: Real<One>,
}

impl Solution {
    pub(super) fn new(
        structure: Structure,
        f1: F1Structure,
        potentials: Vec<Real<Potential>>,
        max_relative_error: Real<One>,
    ) -> Self {
        Solution { structure, f1, potentials, max_relative_error }
    }

    /// The achieved `max_i |residual(i)| / weight(i)`, `<= targetMaxError`.
    pub fn max_relative_error(&self) -> Real<One> {
        self.max_relative_error
    }

    pub fn potential_of(&self, node_id: NodeIndex) -> Real<Potential> {
        self.potentials[node_id as usize]
    }

    /// The force exerted **on** `node_id` **by** `other_id` across their
    /// shared link: `c(ΔP)·ΔP · surfaceNormal`. Swapping `node_id` and
    /// `other_id` negates the result.
    pub fn force_vector_from(
        &self,
        node_id: NodeIndex,
        other_id: NodeIndex,
    ) -> Result<Vector3<Force>, GustaveError> {
        let contact = self
            .f1
            .contacts_of(node_id)
            .iter()
            .find(|contact| contact.other_index == other_id)
            .ok_or_else(|| GustaveError::invalid_argument("no link between these nodes in this structure"))?;
        let delta = self.potentials[other_id as usize] - self.potentials[node_id as usize];
        let conductivity = if delta.sign_bit() { contact.c_minus } else { contact.c_plus };
        let magnitude = conductivity * delta;
        let link = self.structure.link(contact.link_index);
        // The link's surface normal is a fixed physical direction, shared by
        // both endpoints (never re-oriented per viewpoint) so that swapping
        // the two nodes negates the result instead of repeating it: the
        // asymmetry between endpoints already lives in which of c+/c- gets
        // selected (swapped at the two ends, see `F1Structure::build`).
        // A higher potential than a pinned foundation is what carries that
        // foundation's load, so the link normal points from the far node
        // toward the near one: negate the canonical (local-to-other) normal
        // to get the direction force actually acts along.
        Ok(link.surface_normal.negated().scaled(magnitude))
    }

    pub fn f1_structure(&self) -> &F1Structure {
        &self.f1
    }
}
