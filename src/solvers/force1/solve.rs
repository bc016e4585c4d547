//! Top-level Force1 iteration schedule: cluster sweeps coarsest-to-finest,
//! then a layer sweep, then a node sweep, repeated until `maxRelError`
//! clears the target or the iteration budget runs out.

use tracing::{debug, warn};

use crate::config::NodeIndex;
use crate::solvers::Structure;
use crate::units::{Conductivity, One, Potential, Real};

use super::config::Config;
use super::evaluator::{evaluate_cluster, evaluate_node, find_balance_offset, TARGET_ERROR_FACTOR};
use super::f1_structure::{ClusterStructure, F1Structure};
use super::solution::{Solution, SolverOutcome, UnsolvableReason};

/// Runs the Force1 solver to convergence (or exhaustion) on one structure.
pub fn solve(structure: &Structure, config: &Config) -> SolverOutcome {
    let span = tracing::info_span!(
        "solve",
        target_max_error = config.target_max_error().value(),
        max_iterations = config.max_iterations(),
    );
    let _enter = span.enter();

    let f1 = F1Structure::build(structure, config);
    if !f1.is_solvable() {
        warn!("structure has a non-foundation node unreachable from any foundation; marking unsolvable");
        return SolverOutcome::Unsolvable(UnsolvableReason::UnreachableNode);
    }

    let node_count = f1.node_count();
    let mut potentials = vec![Real::<Potential>::new(0.0); node_count];
    let threshold = config.target_max_error() * TARGET_ERROR_FACTOR;
    let mut iteration_index: u64 = 0;

    loop {
        for cluster_structure in f1.clusters().iter().rev() {
            if iteration_index >= config.max_iterations() {
                break;
            }
            cluster_sweep(cluster_structure, &mut potentials, threshold);
            iteration_index += 1;
        }
        if iteration_index < config.max_iterations() {
            layer_sweep(&f1, &mut potentials, threshold);
            iteration_index += 1;
        }
        if iteration_index < config.max_iterations() {
            node_sweep(&f1, &mut potentials, threshold);
            iteration_index += 1;
        }

        let max_rel_error = compute_max_rel_error(&f1, &potentials);
        debug!(iteration_index, max_rel_error = max_rel_error.value(), "completed sweep cycle");

        if max_rel_error.value() <= config.target_max_error().value() {
            return SolverOutcome::Solved(Solution::new(
                structure.clone(),
                f1,
                potentials,
                max_rel_error,
            ));
        }
        if iteration_index >= config.max_iterations() {
            warn!(iteration_index, "iteration budget exhausted before convergence");
            return SolverOutcome::Unsolvable(UnsolvableReason::IterationBudgetExhausted);
        }
    }
}

fn node_sweep(f1: &F1Structure, potentials: &mut [Real<Potential>], threshold: Real<One>) {
    for layer in f1.nodes_at_depth().iter().skip(1) {
        for &node_id in layer {
            potentials[node_id as usize] =
                potentials[node_id as usize] + balance_node(f1, potentials, node_id, threshold);
        }
    }
}

/// Commits a whole depth layer at once: every node in the layer reads only
/// potentials left over from shallower layers (already committed earlier in
/// this same sweep), never from another node in its own layer.
fn layer_sweep(f1: &F1Structure, potentials: &mut [Real<Potential>], threshold: Real<One>) {
    for layer in f1.nodes_at_depth().iter().skip(1) {
        let offsets: Vec<Real<Potential>> =
            layer.iter().map(|&node_id| balance_node(f1, potentials, node_id, threshold)).collect();
        for (&node_id, offset) in layer.iter().zip(offsets) {
            potentials[node_id as usize] = potentials[node_id as usize] + offset;
        }
    }
}

fn balance_node(
    f1: &F1Structure,
    potentials: &[Real<Potential>],
    node_id: NodeIndex,
    threshold: Real<One>,
) -> Real<Potential> {
    let node = f1.node(node_id);
    let contacts = f1.contacts_of(node_id);
    find_balance_offset(threshold, node.weight, |offset| {
        evaluate_node(potentials, node_id, contacts, node.weight, offset)
    })
}

fn cluster_sweep(cs: &ClusterStructure, potentials: &mut [Real<Potential>], threshold: Real<One>) {
    let cluster_offsets: Vec<Real<Potential>> = cs
        .clusters
        .iter()
        .map(|cluster| {
            find_balance_offset(threshold, cluster.weight, |offset| {
                evaluate_cluster(potentials, &cluster.contacts, cluster.weight, offset)
            })
        })
        .collect();
    for node_id in 0..potentials.len() as NodeIndex {
        if let Some(cluster_id) = cs.cluster_of(node_id) {
            potentials[node_id as usize] = potentials[node_id as usize] + cluster_offsets[cluster_id as usize];
        }
    }
}

fn compute_max_rel_error(f1: &F1Structure, potentials: &[Real<Potential>]) -> Real<One> {
    let mut max_error = Real::<One>::new(0.0);
    for node_id in 0..f1.node_count() as NodeIndex {
        let node = f1.node(node_id);
        if node.is_foundation {
            continue;
        }
        let mut force = node.weight;
        let local_potential = potentials[node_id as usize];
        for contact in f1.contacts_of(node_id) {
            let delta = potentials[contact.other_index as usize] - local_potential;
            let conductivity: Real<Conductivity> = if delta.sign_bit() { contact.c_minus } else { contact.c_plus };
            force = force + conductivity * delta;
        }
        let rel_error: f64 = force.abs() / node.weight;
        max_error = max_error.max(Real::<One>::new(rel_error));
    }
    max_error
}
