//! The solver's own immutable graph: nodes (mass, foundation flag) and links
//! (endpoint pair, surface normal, three directional conductivities).
//!
//! [`Structure`] is append-only while being built (`add_node`/`add_link`) and
//! is treated as immutable afterwards — the Force1 solver only ever reads it
//! through [`crate::solvers::force1::F1Structure`].

use crate::config::NodeIndex;
use crate::error::GustaveError;
use crate::units::{Conductivity, Force, NormalizedVector3, Real};

/// `weight = mass * |g|`, strictly positive for every physical block.
pub type Weight = Real<Force>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub weight: Weight,
    pub is_foundation: bool,
}

impl Node {
    pub fn new(weight: Weight, is_foundation: bool) -> Self {
        Node { weight, is_foundation }
    }
}

/// The three load-mode conductivities of a link, each strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkConductivities {
    pub compression: Real<Conductivity>,
    pub shear: Real<Conductivity>,
    pub tensile: Real<Conductivity>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub local_node_id: NodeIndex,
    pub other_node_id: NodeIndex,
    /// Surface normal as seen from `local_node_id`, pointing towards the
    /// other endpoint.
    pub surface_normal: NormalizedVector3,
    pub conductivities: LinkConductivities,
}

#[derive(Debug, Default, Clone)]
pub struct Structure {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> Result<NodeIndex, GustaveError> {
        let index = self.nodes.len();
        let as_index: NodeIndex = index
            .try_into()
            .map_err(|_| GustaveError::overflow("node index exceeds NodeIndex capacity"))?;
        self.nodes.push(node);
        Ok(as_index)
    }

    pub fn add_link(&mut self, link: Link) -> Result<usize, GustaveError> {
        if link.local_node_id == link.other_node_id {
            return Err(GustaveError::invalid_argument("a link cannot connect a node to itself"));
        }
        let node_count = self.nodes.len() as u64;
        if link.local_node_id as u64 >= node_count || link.other_node_id as u64 >= node_count {
            return Err(GustaveError::invalid_argument("link endpoint is not a node of this structure"));
        }
        let index = self.links.len();
        self.links.push(link);
        Ok(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index as usize]
    }

    pub fn link(&self, index: usize) -> &Link {
        &self.links[index]
    }
}
