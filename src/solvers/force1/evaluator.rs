//! The one-dimensional potential balance shared by the node, layer and
//! cluster sweeps: each relaxes a single node or cluster to the
//! trial offset that brings its residual force within a threshold,
//! reading every other node's potential as fixed.

use crate::config::NodeIndex;
use crate::units::{Conductivity, Force, One, Potential, Real};

use super::f1_structure::{ClusterContact, F1Contact};

/// `(offset, force(offset), conductivity(offset))` for one balance probe.
/// The residual is piecewise-linear in `offset`, so `next_offset` lands
/// exactly on a breakpoint or past it, never overshooting more than one.
#[derive(Debug, Clone, Copy)]
pub struct NodePoint {
    offset: Real<Potential>,
    force: Real<Force>,
    conductivity: Real<Conductivity>,
}

impl NodePoint {
    pub fn offset(&self) -> Real<Potential> {
        self.offset
    }

    pub fn force(&self) -> Real<Force> {
        self.force
    }

    pub fn conductivity(&self) -> Real<Conductivity> {
        self.conductivity
    }

    pub fn next_offset(&self) -> Real<Potential> {
        self.offset + self.force / self.conductivity
    }
}

/// Matches the original `ClusterStepRunner::targetErrorFactor`: the balancer
/// is held to a tighter threshold than the solver's overall convergence
/// target, so the aggregate `maxRelError` clears it after a sweep.
pub const TARGET_ERROR_FACTOR: f64 = 0.75;

/// Evaluates a single node's balance at trial `offset`, against a plain
/// per-node F1-contact list (node sweep and layer sweep).
pub fn evaluate_node(
    potentials: &[Real<Potential>],
    node_id: NodeIndex,
    contacts: &[F1Contact],
    weight: Real<Force>,
    offset: Real<Potential>,
) -> NodePoint {
    let local_potential = offset + potentials[node_id as usize];
    let mut force = weight;
    let mut conductivity = Real::<Conductivity>::new(0.0);
    for contact in contacts {
        let other_potential = potentials[contact.other_index as usize];
        let delta = other_potential - local_potential;
        let c = if delta.sign_bit() { contact.c_minus } else { contact.c_plus };
        force = force + c * delta;
        conductivity = conductivity + c;
    }
    NodePoint { offset, force, conductivity }
}

/// Evaluates a whole cluster's balance at trial `offset`, applied uniformly
/// to every member's own current potential (cluster sweep). Each boundary
/// contact keeps its member node's individual local index, since cluster
/// members do not share a single prior potential.
pub fn evaluate_cluster(
    potentials: &[Real<Potential>],
    contacts: &[ClusterContact],
    weight: Real<Force>,
    offset: Real<Potential>,
) -> NodePoint {
    let mut force = weight;
    let mut conductivity = Real::<Conductivity>::new(0.0);
    for contact in contacts {
        let local_potential = offset + potentials[contact.local_index as usize];
        let other_potential = potentials[contact.other_index as usize];
        let delta = other_potential - local_potential;
        let c = if delta.sign_bit() { contact.c_minus } else { contact.c_plus };
        force = force + c * delta;
        conductivity = conductivity + c;
    }
    NodePoint { offset, force, conductivity }
}

/// Upper bound on the number of breakpoints a single balance probe will
/// cross; the residual is piecewise-linear with at most one breakpoint per
/// contact, so this comfortably covers any node or cluster this solver
/// sees in practice.
const MAX_BALANCE_STEPS: u32 = 64;

/// Repeatedly probes `eval` starting at offset zero until `|force| <=
/// threshold * weight`, or the step budget runs out, returning the last
/// offset reached either way.
pub fn find_balance_offset(
    threshold: Real<One>,
    weight: Real<Force>,
    eval: impl Fn(Real<Potential>) -> NodePoint,
) -> Real<Potential> {
    let mut offset = Real::new(0.0);
    for _ in 0..MAX_BALANCE_STEPS {
        let point = eval(offset);
        if point.force().abs().value() <= threshold.value() * weight.value() {
            return offset;
        }
        offset = point.next_offset();
    }
    offset
}
