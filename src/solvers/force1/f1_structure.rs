//! Derived per-structure view used by the Force1 solver: per-node weight and
//! foundation flag, a flat array of signed-conductivity contacts, and the
//! depth/layer/cluster decompositions the three sweep strategies rely on.

use smallvec::SmallVec;

use super::config::Config;
use crate::config::NodeIndex;
use crate::solvers::Structure;
use crate::units::{Conductivity, Real};
use crate::util::IndexRange;

/// One endpoint of a link, expressed with signed conductivities: `c+` applies
/// when the other node's potential is at least the local node's, `c-`
/// otherwise.
#[derive(Debug, Clone, Copy)]
pub struct F1Contact {
    pub other_index: NodeIndex,
    pub link_index: usize,
    pub c_plus: Real<Conductivity>,
    pub c_minus: Real<Conductivity>,
}

#[derive(Debug, Clone)]
pub struct F1Node {
    pub weight: crate::solvers::Weight,
    pub is_foundation: bool,
    pub contact_ids: IndexRange,
}

/// Computes `(c+, c-)` from a link's three material conductivities and the
/// angle of its surface normal with gravity. Both outputs are convex
/// combinations of the three strictly positive material conductivities,
/// hence strictly positive themselves, and swap at the link's two endpoints
/// (where the normal negates), which is exactly the symmetry force
/// reciprocity needs.
fn split_conductivities(
    conductivities: crate::solvers::LinkConductivities,
    normal_dot_gravity: f64,
) -> (Real<Conductivity>, Real<Conductivity>) {
    let a = normal_dot_gravity;
    let comp_frac = (1.0 - a) / 2.0;
    let tens_frac = (1.0 + a) / 2.0;
    let shear_frac = (1.0 - a * a).max(0.0).sqrt();
    let c_plus = conductivities.compression * comp_frac
        + conductivities.tensile * tens_frac
        + conductivities.shear * shear_frac;
    let c_minus = conductivities.compression * tens_frac
        + conductivities.tensile * comp_frac
        + conductivities.shear * shear_frac;
    (c_plus, c_minus)
}

#[derive(Debug, Clone)]
pub struct F1Structure {
    nodes: Vec<F1Node>,
    contacts: Vec<F1Contact>,
    depth_of_node: Vec<Option<u32>>,
    nodes_at_depth: Vec<Vec<NodeIndex>>,
    reached_count: usize,
    clusters: Vec<ClusterStructure>,
}

/// A cluster boundary contact: a real F1-contact whose local node sits
/// inside the cluster and whose other node sits outside it (or is a
/// foundation, which is never clustered).
#[derive(Debug, Clone, Copy)]
pub struct ClusterContact {
    pub local_index: NodeIndex,
    pub other_index: NodeIndex,
    pub c_plus: Real<Conductivity>,
    pub c_minus: Real<Conductivity>,
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub weight: crate::solvers::Weight,
    pub contacts: Vec<ClusterContact>,
}

/// One coarsening level: nodes grouped into bands of `width` consecutive
/// depths, generated only when it collapses the structure into at least 8
/// clusters.
#[derive(Debug, Clone)]
pub struct ClusterStructure {
    pub width: u32,
    pub clusters: Vec<Cluster>,
    cluster_of_node: Vec<Option<u32>>,
}

impl ClusterStructure {
    pub fn cluster_of(&self, node: NodeIndex) -> Option<u32> {
        self.cluster_of_node[node as usize]
    }
}

impl F1Structure {
    pub fn build(structure: &Structure, config: &Config) -> Self {
        let node_count = structure.nodes().len();
        let g_hat = config.g().normalized();

        let mut staging: Vec<SmallVec<[F1Contact; 6]>> = vec![SmallVec::new(); node_count];
        for (link_index, link) in structure.links().iter().enumerate() {
            let normal_dot_g = match g_hat {
                Some(g) => link.surface_normal.dot(g),
                None => 0.0,
            };
            let (c_plus, c_minus) = split_conductivities(link.conductivities, normal_dot_g);
            staging[link.local_node_id as usize].push(F1Contact {
                other_index: link.other_node_id,
                link_index,
                c_plus,
                c_minus,
            });
            // The other endpoint sees the negated normal, which swaps the
            // fractions: its c+ equals this endpoint's c-, and vice versa.
            let (other_c_plus, other_c_minus) = split_conductivities(link.conductivities, -normal_dot_g);
            staging[link.other_node_id as usize].push(F1Contact {
                other_index: link.local_node_id,
                link_index,
                c_plus: other_c_plus,
                c_minus: other_c_minus,
            });
        }

        let mut contacts = Vec::new();
        let mut nodes = Vec::with_capacity(node_count);
        for (node_id, node) in structure.nodes().iter().enumerate() {
            let start = contacts.len();
            contacts.extend(staging[node_id].iter().copied());
            let end = contacts.len();
            nodes.push(F1Node {
                weight: node.weight,
                is_foundation: node.is_foundation,
                contact_ids: IndexRange::new(start, end),
            });
        }

        let (depth_of_node, nodes_at_depth, reached_count) = Self::decompose_depth(&nodes, &contacts);
        let clusters = Self::build_cluster_structures(&nodes, &contacts, &depth_of_node, &nodes_at_depth);

        F1Structure { nodes, contacts, depth_of_node, nodes_at_depth, reached_count, clusters }
    }

    fn decompose_depth(
        nodes: &[F1Node],
        contacts: &[F1Contact],
    ) -> (Vec<Option<u32>>, Vec<Vec<NodeIndex>>, usize) {
        let node_count = nodes.len();
        let mut depth_of_node = vec![None; node_count];
        let mut is_reached = vec![false; node_count];
        let mut nodes_at_depth = Vec::new();
        let mut reached_count = 0usize;

        let mut cur_nodes: Vec<NodeIndex> = Vec::new();
        for (node_id, node) in nodes.iter().enumerate() {
            if node.is_foundation {
                is_reached[node_id] = true;
                depth_of_node[node_id] = Some(0);
                cur_nodes.push(node_id as NodeIndex);
            }
        }

        let mut depth: u32 = 0;
        while !cur_nodes.is_empty() {
            reached_count += cur_nodes.len();
            depth += 1;
            let mut next_nodes = Vec::new();
            for &local_index in &cur_nodes {
                let node = &nodes[local_index as usize];
                for contact in &contacts[node.contact_ids.start()..node.contact_ids.end()] {
                    let other = contact.other_index as usize;
                    if !is_reached[other] {
                        is_reached[other] = true;
                        depth_of_node[other] = Some(depth);
                        next_nodes.push(contact.other_index);
                    }
                }
            }
            nodes_at_depth.push(std::mem::replace(&mut cur_nodes, next_nodes));
        }

        (depth_of_node, nodes_at_depth, reached_count)
    }

    fn build_cluster_structures(
        nodes: &[F1Node],
        contacts: &[F1Contact],
        depth_of_node: &[Option<u32>],
        nodes_at_depth: &[Vec<NodeIndex>],
    ) -> Vec<ClusterStructure> {
        let max_depth = nodes_at_depth.len() as u32;
        if max_depth <= 1 {
            return Vec::new();
        }
        let max_width: u64 = (u32::MAX as u64) / 2;
        let mut result = Vec::new();
        let mut width: u32 = 3;
        while (width as u64) < max_width {
            let mut cluster_of_node = vec![None; nodes.len()];
            for (node_id, node) in nodes.iter().enumerate() {
                if node.is_foundation {
                    continue;
                }
                if let Some(depth) = depth_of_node[node_id] {
                    cluster_of_node[node_id] = Some((depth - 1) / width);
                }
            }
            let cluster_count =
                cluster_of_node.iter().filter_map(|c| *c).max().map(|m| m as usize + 1).unwrap_or(0);
            if cluster_count < 8 {
                break;
            }

            let mut weights = vec![Real::<crate::units::Force>::new(0.0); cluster_count];
            let mut boundary: Vec<Vec<ClusterContact>> = vec![Vec::new(); cluster_count];
            for (node_id, node) in nodes.iter().enumerate() {
                let Some(cluster_id) = cluster_of_node[node_id] else { continue };
                weights[cluster_id as usize] = weights[cluster_id as usize] + node.weight;

                let own_contacts = &contacts[node.contact_ids.start()..node.contact_ids.end()];
                for contact in own_contacts {
                    let other_cluster = cluster_of_node[contact.other_index as usize];
                    if other_cluster != Some(cluster_id) {
                        boundary[cluster_id as usize].push(ClusterContact {
                            local_index: node_id as NodeIndex,
                            other_index: contact.other_index,
                            c_plus: contact.c_plus,
                            c_minus: contact.c_minus,
                        });
                    }
                }
            }

            result.push(ClusterStructure {
                width,
                clusters: weights
                    .into_iter()
                    .zip(boundary)
                    .map(|(weight, contacts)| Cluster { weight, contacts })
                    .collect(),
                cluster_of_node,
            });
            width = 1 + 2 * width;
        }
        result
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: NodeIndex) -> &F1Node {
        &self.nodes[index as usize]
    }

    pub fn contacts_of(&self, index: NodeIndex) -> &[F1Contact] {
        let range = self.nodes[index as usize].contact_ids;
        &self.contacts[range.start()..range.end()]
    }

    pub fn depth_of(&self, index: NodeIndex) -> Option<u32> {
        self.depth_of_node[index as usize]
    }

    pub fn nodes_at_depth(&self) -> &[Vec<NodeIndex>] {
        &self.nodes_at_depth
    }

    pub fn clusters(&self) -> &[ClusterStructure] {
        &self.clusters
    }

    pub fn is_solvable(&self) -> bool {
        self.reached_count == self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::{Link, LinkConductivities, Node, Structure};
    use crate::units::{Acceleration, NormalizedVector3, Vector3};

    fn conductivities(v: f64) -> LinkConductivities {
        LinkConductivities { compression: Real::new(v), shear: Real::new(v), tensile: Real::new(v) }
    }

    fn config_with_gravity() -> Config {
        Config::new(Vector3::<Acceleration>::from_f64(0.0, -10.0, 0.0), Real::new(0.001)).unwrap()
    }

    #[test]
    fn split_conductivities_pure_compression_when_normal_matches_gravity() {
        let c = LinkConductivities { compression: Real::new(20.0), shear: Real::new(14.0), tensile: Real::new(2.0) };
        // Normal pointing opposite gravity (e.g. +Y with gravity pulling
        // down the -Y axis): a = -1, the "stacked block" case where the
        // local node's support is purely compressive.
        let (c_plus, c_minus) = split_conductivities(c, -1.0);
        assert!((c_plus.value() - 20.0).abs() < 1e-9);
        assert!((c_minus.value() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn split_conductivities_swap_at_the_two_endpoints() {
        let c = LinkConductivities { compression: Real::new(20.0), shear: Real::new(14.0), tensile: Real::new(2.0) };
        let (plus, minus) = split_conductivities(c, 0.37);
        let (other_plus, other_minus) = split_conductivities(c, -0.37);
        assert!((plus.value() - other_minus.value()).abs() < 1e-9);
        assert!((minus.value() - other_plus.value()).abs() < 1e-9);
    }

    #[test]
    fn build_gives_each_node_a_depth_and_flat_contact_ranges() {
        let mut structure = Structure::new();
        let foundation = structure.add_node(Node::new(Real::new(1.0), true)).unwrap();
        let middle = structure.add_node(Node::new(Real::new(40000.0), false)).unwrap();
        let top = structure.add_node(Node::new(Real::new(40000.0), false)).unwrap();
        structure
            .add_link(Link {
                local_node_id: foundation,
                other_node_id: middle,
                surface_normal: NormalizedVector3::PLUS_Y,
                conductivities: conductivities(1e6),
            })
            .unwrap();
        structure
            .add_link(Link {
                local_node_id: middle,
                other_node_id: top,
                surface_normal: NormalizedVector3::PLUS_Y,
                conductivities: conductivities(1e6),
            })
            .unwrap();

        let config = config_with_gravity();
        let f1 = F1Structure::build(&structure, &config);

        assert_eq!(f1.node_count(), 3);
        assert!(f1.is_solvable());
        assert_eq!(f1.depth_of(foundation), Some(0));
        assert_eq!(f1.depth_of(middle), Some(1));
        assert_eq!(f1.depth_of(top), Some(2));
        assert_eq!(f1.contacts_of(middle).len(), 2);
        assert_eq!(f1.contacts_of(foundation).len(), 1);
        assert!(f1.clusters().is_empty());
    }

    #[test]
    fn unreachable_node_marks_structure_unsolvable() {
        let mut structure = Structure::new();
        structure.add_node(Node::new(Real::new(1.0), false)).unwrap();
        let config = config_with_gravity();
        let f1 = F1Structure::build(&structure, &config);
        assert!(!f1.is_solvable());
        assert!(f1.nodes_at_depth().is_empty());
    }
}
