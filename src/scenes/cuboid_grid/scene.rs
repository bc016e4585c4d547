//! The cuboid-grid scene: block storage, the block/structure membership
//! index, and the five-phase transaction algorithm.

use tracing::debug;

use crate::config::{NodeIndex, StructureIndex};
use crate::error::GustaveError;
use crate::material::PressureStress;
use crate::solvers::{Link, LinkConductivities, Node, Structure};
use crate::units::{Acceleration, Area, Length, Mass, NormalizedVector3, Real, Vector3};
use crate::util::{FastMap, FastSet};

use super::block_index::{BlockIndex, Direction};
use super::contact_index::ContactIndex;
use super::transaction::{NewStructureRange, Transaction, TransactionResult};

/// Everything the scene stores about one block. Mass, stress and the
/// foundation flag never change once inserted.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockData {
    pub(crate) mass: Real<Mass>,
    pub(crate) max_pressure_stress: PressureStress,
    pub(crate) is_foundation: bool,
}

/// One link of a structure's topology, before the solver's Force1 pass
/// splits its conductivities by gravity direction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TopologyLink {
    pub(crate) local: NodeIndex,
    pub(crate) other: NodeIndex,
    pub(crate) normal: NormalizedVector3,
    pub(crate) conductivities: LinkConductivities,
}

/// A structure's shape, independent of gravity: per-node mass and
/// foundation flag, links with their material conductivities, and the
/// `BlockIndex <-> NodeIndex` correspondence. [`Self::build_solver_structure`]
/// turns this into the [`Structure`] the Force1 solver actually consumes,
/// once a gravity vector is known (scenes have no notion of gravity; only
/// a world's solver config does).
#[derive(Debug, Clone)]
pub(crate) struct StructureTopology {
    node_of_block: FastMap<BlockIndex, NodeIndex>,
    block_of_node: Vec<BlockIndex>,
    mass_of_node: Vec<Real<Mass>>,
    is_foundation_of_node: Vec<bool>,
    links: Vec<TopologyLink>,
    contact_link: FastMap<ContactIndex, usize>,
}

impl StructureTopology {
    pub(crate) fn node_of(&self, block: BlockIndex) -> Option<NodeIndex> {
        self.node_of_block.get(&block).copied()
    }

    pub(crate) fn block_of(&self, node: NodeIndex) -> BlockIndex {
        self.block_of_node[node as usize]
    }

    pub(crate) fn node_count(&self) -> usize {
        self.block_of_node.len()
    }

    pub(crate) fn link_for_contact(&self, contact: ContactIndex) -> Option<usize> {
        let canonical = contact.canonical()?;
        self.contact_link.get(&canonical).copied()
    }

    pub(crate) fn link(&self, index: usize) -> &TopologyLink {
        &self.links[index]
    }

    pub(crate) fn links(&self) -> &[TopologyLink] {
        &self.links
    }

    /// Builds the immutable solver [`Structure`] this topology describes
    /// under gravity `g`: node weight is `mass * |g|`.
    pub(crate) fn build_solver_structure(&self, g: Vector3<Acceleration>) -> Structure {
        let magnitude = g.magnitude();
        let mut structure = Structure::new();
        for (mass, is_foundation) in self.mass_of_node.iter().zip(&self.is_foundation_of_node) {
            let weight = *mass * magnitude;
            structure
                .add_node(Node::new(weight, *is_foundation))
                .expect("node count was already validated against NodeIndex capacity");
        }
        for link in &self.links {
            structure
                .add_link(Link {
                    local_node_id: link.local,
                    other_node_id: link.other,
                    surface_normal: link.normal,
                    conductivities: link.conductivities,
                })
                .expect("topology links were built from valid node ids");
        }
        structure
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StructureData {
    pub(crate) topology: StructureTopology,
    pub(crate) members: FastSet<BlockIndex>,
}

/// `CuboidGridScene`: blocks indexed by coordinate, plus the
/// partition of those blocks into structures, maintained incrementally.
#[derive(Debug, Clone)]
pub struct CuboidGridScene {
    block_size: Vector3<Length>,
    blocks: FastMap<BlockIndex, BlockData>,
    block_structures: FastMap<BlockIndex, smallvec::SmallVec<[StructureIndex; 2]>>,
    structures: FastMap<StructureIndex, StructureData>,
    next_structure_id: u64,
}

impl CuboidGridScene {
    pub fn new(block_size: Vector3<Length>) -> Self {
        CuboidGridScene {
            block_size,
            blocks: FastMap::default(),
            block_structures: FastMap::default(),
            structures: FastMap::default(),
            next_structure_id: 0,
        }
    }

    pub fn block_size(&self) -> Vector3<Length> {
        self.block_size
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    pub(crate) fn block_data(&self, index: BlockIndex) -> Option<&BlockData> {
        self.blocks.get(&index)
    }

    pub(crate) fn structure_data(&self, id: StructureIndex) -> Option<&StructureData> {
        self.structures.get(&id)
    }

    pub(crate) fn block_indices(&self) -> impl Iterator<Item = BlockIndex> + '_ {
        self.blocks.keys().copied()
    }

    pub(crate) fn structure_ids(&self) -> impl Iterator<Item = StructureIndex> + '_ {
        self.structures.keys().copied()
    }

    pub(crate) fn structures_of(&self, index: BlockIndex) -> &[StructureIndex] {
        self.block_structures.get(&index).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    pub(crate) fn contact_exists(&self, index: ContactIndex) -> bool {
        self.blocks.contains_key(&index.local_block)
            && index
                .local_block
                .neighbour_along(index.direction)
                .is_some_and(|other| self.blocks.contains_key(&other))
    }

    pub(crate) fn contact_surface_area(&self, direction: Direction) -> Real<Area> {
        let dims = [self.block_size.x, self.block_size.y, self.block_size.z];
        match direction.axis() {
            0 => dims[1] * dims[2],
            1 => dims[0] * dims[2],
            _ => dims[0] * dims[1],
        }
    }

    pub(crate) fn contact_thickness(&self, direction: Direction) -> Real<Length> {
        self.block_size.along_direction(direction.axis())
    }

    /// Applies a transaction in five phases, atomically: any
    /// validation failure leaves the scene untouched.
    pub fn apply_transaction(&mut self, transaction: Transaction) -> Result<TransactionResult, GustaveError> {
        let span = tracing::info_span!(
            "apply_transaction",
            added = transaction.new_blocks().len(),
            removed = transaction.deleted_blocks().len(),
        );
        let _enter = span.enter();

        // Phase 1: validate.
        for (index, _) in transaction.new_blocks() {
            if self.blocks.contains_key(index) {
                return Err(GustaveError::invalid_transaction(format!(
                    "block already exists at {index:?}"
                )));
            }
        }
        for index in transaction.deleted_blocks() {
            if !self.blocks.contains_key(index) {
                return Err(GustaveError::invalid_transaction(format!("no block to remove at {index:?}")));
            }
        }

        // Phase 2: compute affected structures, read-only — nothing is
        // retired yet, so a later failure still leaves the scene untouched.
        let mut affected: FastSet<StructureIndex> = FastSet::default();
        for index in transaction.deleted_blocks() {
            if let Some(ids) = self.block_structures.get(index) {
                affected.extend(ids.iter().copied());
            }
        }
        for (index, _) in transaction.new_blocks() {
            for direction in Direction::ALL {
                if let Some(neighbour) = index.neighbour_along(direction) {
                    if let Some(ids) = self.block_structures.get(&neighbour) {
                        affected.extend(ids.iter().copied());
                    }
                }
            }
        }
        let deleted_structures: Vec<StructureIndex> = affected.into_iter().collect();

        let mut candidate_blocks: FastSet<BlockIndex> = FastSet::default();
        for id in &deleted_structures {
            let Some(data) = self.structures.get(id) else { continue };
            for &block in &data.members {
                if !transaction.deleted_blocks().contains(&block) {
                    candidate_blocks.insert(block);
                }
            }
        }
        for (index, _) in transaction.new_blocks() {
            candidate_blocks.insert(*index);
            for direction in Direction::ALL {
                if let Some(neighbour) = index.neighbour_along(direction) {
                    if self.blocks.contains_key(&neighbour) && !transaction.deleted_blocks().contains(&neighbour) {
                        candidate_blocks.insert(neighbour);
                    }
                }
            }
        }

        // Phases 3-5, staged: flood-fill the post-transaction block set
        // through a read-only view (`post_transaction_block`) instead of
        // mutating the block map first. This lets every allocation that can
        // fail — a component outgrowing `NodeIndex`, or the structure-id
        // counter overflowing — be checked before any state is written, so a
        // failure here still leaves the scene bit-equal to its pre-call
        // state.
        let new_block_data: FastMap<BlockIndex, BlockData> = transaction
            .new_blocks()
            .iter()
            .map(|(index, spec)| {
                (
                    *index,
                    BlockData {
                        mass: spec.mass,
                        max_pressure_stress: spec.max_pressure_stress,
                        is_foundation: spec.is_foundation,
                    },
                )
            })
            .collect();
        let post_transaction_block = |index: BlockIndex| -> Option<BlockData> {
            if transaction.deleted_blocks().contains(&index) {
                return None;
            }
            new_block_data.get(&index).copied().or_else(|| self.blocks.get(&index).copied())
        };

        let mut visited: FastSet<BlockIndex> = FastSet::default();
        let mut seeds: Vec<BlockIndex> = candidate_blocks.into_iter().collect();
        seeds.sort_by_key(|b| (b.x, b.y, b.z));

        let mut components: Vec<Vec<BlockIndex>> = Vec::new();
        for seed in seeds {
            if visited.contains(&seed) || post_transaction_block(seed).is_none() {
                continue;
            }
            let mut stack = vec![seed];
            visited.insert(seed);
            let mut component = Vec::new();
            while let Some(current) = stack.pop() {
                let current_data =
                    post_transaction_block(current).expect("every visited block exists post-transaction");
                component.push(current);
                for direction in Direction::ALL {
                    let Some(neighbour) = current.neighbour_along(direction) else { continue };
                    if visited.contains(&neighbour) {
                        continue;
                    }
                    let Some(neighbour_data) = post_transaction_block(neighbour) else { continue };
                    if current_data.is_foundation && neighbour_data.is_foundation {
                        continue;
                    }
                    visited.insert(neighbour);
                    stack.push(neighbour);
                }
            }

            if !component
                .iter()
                .any(|&b| !post_transaction_block(b).expect("component block exists post-transaction").is_foundation)
            {
                continue;
            }
            component.sort_by_key(|b| (b.x, b.y, b.z));
            components.push(component);
        }

        // Validate every allocation the commit below will need, before
        // touching any scene state.
        for component in &components {
            let _: NodeIndex = component
                .len()
                .try_into()
                .map_err(|_| GustaveError::overflow("structure exceeds NodeIndex capacity"))?;
        }
        self.next_structure_id
            .checked_add(components.len() as u64)
            .ok_or_else(|| GustaveError::overflow("structure id generator exhausted"))?;

        // Commit: every fallible check above has already passed, so nothing
        // from here on can fail partway through.
        for id in &deleted_structures {
            let Some(data) = self.structures.remove(id) else { continue };
            for block in data.members {
                if let Some(ids) = self.block_structures.get_mut(&block) {
                    ids.retain(|existing| existing != id);
                    if ids.is_empty() {
                        self.block_structures.remove(&block);
                    }
                }
            }
        }
        for index in transaction.deleted_blocks() {
            self.blocks.remove(index);
            self.block_structures.remove(index);
        }
        for (index, data) in &new_block_data {
            self.blocks.insert(*index, *data);
        }

        let first_new_id = self.next_structure_id;
        for component in components {
            let id = StructureIndex(self.next_structure_id);
            self.next_structure_id += 1;

            let topology = self
                .build_topology(&component)
                .expect("component size against NodeIndex capacity was already validated above");
            for &block in &component {
                self.block_structures.entry(block).or_default().push(id);
            }
            debug!(structure = %id, members = component.len(), "structure created");
            self.structures.insert(id, StructureData { topology, members: component.into_iter().collect() });
        }

        let new_structures = NewStructureRange::new(first_new_id, self.next_structure_id);
        debug!(new = new_structures.len(), deleted = deleted_structures.len(), "transaction applied");
        Ok(TransactionResult { new_structures, deleted_structures })
    }

    /// Builds one structure's topology: contiguous node
    /// indices over `component`, and one link per internal contact with at
    /// least one non-foundation endpoint.
    fn build_topology(&self, component: &[BlockIndex]) -> Result<StructureTopology, GustaveError> {
        let mut node_of_block = FastMap::default();
        let mut block_of_node = Vec::with_capacity(component.len());
        let mut mass_of_node = Vec::with_capacity(component.len());
        let mut is_foundation_of_node = Vec::with_capacity(component.len());
        for &block in component {
            let node_id: NodeIndex = block_of_node
                .len()
                .try_into()
                .map_err(|_| GustaveError::overflow("structure exceeds NodeIndex capacity"))?;
            node_of_block.insert(block, node_id);
            let data = self.blocks[&block];
            block_of_node.push(block);
            mass_of_node.push(data.mass);
            is_foundation_of_node.push(data.is_foundation);
        }

        let mut links = Vec::new();
        let mut contact_link = FastMap::default();
        for &block in component {
            let block_data = self.blocks[&block];
            for direction in Direction::POSITIVE {
                let Some(neighbour) = block.neighbour_along(direction) else { continue };
                let Some(&other_node) = node_of_block.get(&neighbour) else { continue };
                let neighbour_data = self.blocks[&neighbour];
                if block_data.is_foundation && neighbour_data.is_foundation {
                    continue;
                }
                let normal = match direction {
                    Direction::PlusX => NormalizedVector3::PLUS_X,
                    Direction::PlusY => NormalizedVector3::PLUS_Y,
                    Direction::PlusZ => NormalizedVector3::PLUS_Z,
                    _ => unreachable!("Direction::POSITIVE only yields positive directions"),
                };
                let area = self.contact_surface_area(direction);
                let thickness = self.contact_thickness(direction);
                let stress =
                    PressureStress::min_resistance(block_data.max_pressure_stress, neighbour_data.max_pressure_stress);
                let ratio = area / thickness;
                let conductivities = LinkConductivities {
                    compression: ratio * stress.compression,
                    shear: ratio * stress.shear,
                    tensile: ratio * stress.tensile,
                };
                let link_index = links.len();
                links.push(TopologyLink {
                    local: node_of_block[&block],
                    other: other_node,
                    normal,
                    conductivities,
                });
                contact_link.insert(ContactIndex::new(block, direction), link_index);
            }
        }

        Ok(StructureTopology { node_of_block, block_of_node, mass_of_node, is_foundation_of_node, links, contact_link })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::cuboid_grid::transaction::NewBlockSpec;
    use crate::units::Real;

    fn stress(v: f64) -> PressureStress {
        PressureStress::new(Real::new(v), Real::new(v), Real::new(v)).unwrap()
    }

    fn spec(mass: f64, is_foundation: bool) -> NewBlockSpec {
        NewBlockSpec::new(Real::new(mass), stress(1e6), is_foundation).unwrap()
    }

    fn unit_scene() -> CuboidGridScene {
        CuboidGridScene::new(Vector3::from_f64(1.0, 1.0, 1.0))
    }

    #[test]
    fn single_foundation_block_yields_no_structure() {
        let mut scene = unit_scene();
        let mut tx = Transaction::new();
        tx.add_block(BlockIndex::new(0, 0, 0), spec(1.0, true)).unwrap();
        let result = scene.apply_transaction(tx).unwrap();
        assert!(result.new_structures.is_empty());
        assert_eq!(scene.structure_count(), 0);
    }

    #[test]
    fn non_foundation_block_on_foundation_forms_one_structure() {
        let mut scene = unit_scene();
        let mut tx = Transaction::new();
        tx.add_block(BlockIndex::new(0, 0, 0), spec(1.0, true)).unwrap();
        tx.add_block(BlockIndex::new(0, 1, 0), spec(1000.0, false)).unwrap();
        let result = scene.apply_transaction(tx).unwrap();
        assert_eq!(result.new_structures.len(), 1);
        assert_eq!(scene.structure_count(), 1);
        let id = result.new_structures.iter().next().unwrap();
        let data = scene.structure_data(id).unwrap();
        assert_eq!(data.members.len(), 2);
        assert_eq!(data.topology.node_count(), 2);
        assert_eq!(data.topology.links().len(), 1);
    }

    #[test]
    fn two_touching_foundations_do_not_bond() {
        let mut scene = unit_scene();
        let mut tx = Transaction::new();
        tx.add_block(BlockIndex::new(0, 0, 0), spec(1.0, true)).unwrap();
        tx.add_block(BlockIndex::new(1, 0, 0), spec(1.0, true)).unwrap();
        let result = scene.apply_transaction(tx).unwrap();
        assert!(result.new_structures.is_empty());
        assert_eq!(scene.structure_count(), 0);
    }

    #[test]
    fn invalid_transaction_leaves_scene_untouched() {
        let mut scene = unit_scene();
        let mut tx = Transaction::new();
        tx.add_block(BlockIndex::new(0, 0, 0), spec(1.0, true)).unwrap();
        scene.apply_transaction(tx).unwrap();

        let mut bad_tx = Transaction::new();
        bad_tx.add_block(BlockIndex::new(0, 0, 0), spec(1.0, false)).unwrap();
        bad_tx.add_block(BlockIndex::new(5, 5, 5), spec(1.0, false)).unwrap();
        let err = scene.apply_transaction(bad_tx).unwrap_err();
        assert!(matches!(err, GustaveError::InvalidTransaction(_)));
        assert_eq!(scene.block_count(), 1);
    }

    #[test]
    fn removing_middle_block_splits_a_structure() {
        let mut scene = unit_scene();
        let mut tx = Transaction::new();
        // H-shape crossbar: two vertical legs from two foundations, joined
        // by a horizontal run of three non-foundation blocks.
        tx.add_block(BlockIndex::new(0, 0, 0), spec(1.0, true)).unwrap();
        tx.add_block(BlockIndex::new(4, 0, 0), spec(1.0, true)).unwrap();
        tx.add_block(BlockIndex::new(0, 1, 0), spec(1000.0, false)).unwrap();
        tx.add_block(BlockIndex::new(4, 1, 0), spec(1000.0, false)).unwrap();
        tx.add_block(BlockIndex::new(1, 1, 0), spec(1000.0, false)).unwrap();
        tx.add_block(BlockIndex::new(2, 1, 0), spec(1000.0, false)).unwrap();
        tx.add_block(BlockIndex::new(3, 1, 0), spec(1000.0, false)).unwrap();
        let result = scene.apply_transaction(tx).unwrap();
        assert_eq!(result.new_structures.len(), 1);
        assert_eq!(scene.structure_count(), 1);

        let mut split_tx = Transaction::new();
        split_tx.remove_block(BlockIndex::new(2, 1, 0));
        let split = scene.apply_transaction(split_tx).unwrap();
        assert_eq!(split.deleted_structures.len(), 1);
        assert_eq!(split.new_structures.len(), 2);
        assert_eq!(scene.structure_count(), 2);
    }
}
