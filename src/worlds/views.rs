//! Reference types: thin, borrow-checked handles into a [`World`].
//! Each holds `&'a World`, so the compiler — not a runtime generation check —
//! rejects any attempt to read through one while the world is being mutated.

use crate::config::StructureIndex;
use crate::error::GustaveError;
use crate::material::PressureStress;
use crate::scenes::cuboid_grid::{BlockIndex, ContactIndex, Direction};
use crate::solvers::force1::{Solution, SolverOutcome};
use crate::units::{Area, Force, Length, Mass, One, Real, Vector3};

use super::sync_world::World;

/// A single block.
#[derive(Debug, Clone, Copy)]
pub struct BlockRef<'a> {
    world: &'a World,
    index: BlockIndex,
}

impl<'a> BlockRef<'a> {
    fn new(world: &'a World, index: BlockIndex) -> Option<Self> {
        world.scene().block_data(index).map(|_| BlockRef { world, index })
    }

    pub fn index(&self) -> BlockIndex {
        self.index
    }

    pub fn mass(&self) -> Real<Mass> {
        self.world.scene().block_data(self.index).expect("block exists for the lifetime of this ref").mass
    }

    pub fn max_pressure_stress(&self) -> PressureStress {
        self.world.scene().block_data(self.index).expect("block exists for the lifetime of this ref").max_pressure_stress
    }

    pub fn is_foundation(&self) -> bool {
        self.world.scene().block_data(self.index).expect("block exists for the lifetime of this ref").is_foundation
    }

    pub fn contact(&self, direction: Direction) -> Option<ContactRef<'a>> {
        let index = ContactIndex::new(self.index, direction);
        self.world.scene().contact_exists(index).then(|| ContactRef { world: self.world, index })
    }

    pub fn contacts(&self) -> impl Iterator<Item = ContactRef<'a>> + 'a {
        let world = self.world;
        let block = self.index;
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| {
                let index = ContactIndex::new(block, direction);
                world.scene().contact_exists(index).then_some(ContactRef { world, index })
            })
    }

    pub fn structures(&self) -> impl Iterator<Item = StructureRef<'a>> + 'a {
        let world = self.world;
        world.scene().structures_of(self.index).iter().map(move |&id| StructureRef { world, id })
    }
}

/// The oriented face between a block and one of its six neighbours.
#[derive(Debug, Clone, Copy)]
pub struct ContactRef<'a> {
    world: &'a World,
    index: ContactIndex,
}

impl<'a> ContactRef<'a> {
    fn new(world: &'a World, index: ContactIndex) -> Option<Self> {
        world.scene().contact_exists(index).then_some(ContactRef { world, index })
    }

    pub fn local_block(&self) -> BlockRef<'a> {
        BlockRef::new(self.world, self.index.local_block).expect("a live contact's local block exists")
    }

    pub fn other_block(&self) -> BlockRef<'a> {
        let other = self
            .index
            .local_block
            .neighbour_along(self.index.direction)
            .expect("a live contact's neighbour exists");
        BlockRef::new(self.world, other).expect("a live contact's neighbour block exists")
    }

    pub fn direction(&self) -> Direction {
        self.index.direction
    }

    pub fn opposite(&self) -> ContactRef<'a> {
        let index = self.index.opposite().expect("a live contact has a neighbour, so it has an opposite");
        ContactRef { world: self.world, index }
    }

    pub fn surface_area(&self) -> Real<Area> {
        self.world.scene().contact_surface_area(self.index.direction)
    }

    pub fn thickness(&self) -> Real<Length> {
        self.world.scene().contact_thickness(self.index.direction)
    }

    /// The structure whose topology carries a link for this contact, if
    /// any — a contact between two foundation blocks belongs to no
    /// structure, since foundations never bond to each other.
    pub fn structure(&self) -> Option<StructureRef<'a>> {
        let canonical = self.index.canonical()?;
        self.world
            .scene()
            .structures_of(canonical.local_block)
            .iter()
            .find(|&&id| {
                self.world
                    .scene()
                    .structure_data(id)
                    .is_some_and(|data| data.topology.link_for_contact(canonical).is_some())
            })
            .map(|&id| StructureRef { world: self.world, id })
    }

    /// The force this contact's far side exerts on its near side: requires
    /// the owning structure to exist and have solved.
    pub fn force_vector(&self) -> Result<Vector3<Force>, GustaveError> {
        let structure = self
            .structure()
            .ok_or_else(|| GustaveError::out_of_range(format!("no structure link at {:?}", self.index)))?;
        structure.force_vector_across(self.index)
    }
}

/// A structure: a maximal set of blocks bonded transitively to a
/// foundation, together with its most recent Force1 solve outcome.
#[derive(Debug, Clone, Copy)]
pub struct StructureRef<'a> {
    world: &'a World,
    id: StructureIndex,
}

impl<'a> StructureRef<'a> {
    fn new(world: &'a World, id: StructureIndex) -> Option<Self> {
        world.scene().structure_data(id).map(|_| StructureRef { world, id })
    }

    pub fn id(&self) -> StructureIndex {
        self.id
    }

    pub fn block_count(&self) -> usize {
        self.data().members.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = BlockRef<'a>> + 'a {
        let world = self.world;
        self.data().members.iter().map(move |&index| BlockRef::new(world, index).expect("member block exists"))
    }

    pub fn links(&self) -> impl Iterator<Item = LinkRef<'a>> + 'a {
        let world = self.world;
        let id = self.id;
        let count = self.data().topology.links().len();
        (0..count).map(move |link_index| LinkRef { world, structure_id: id, link_index })
    }

    pub fn is_solved(&self) -> bool {
        self.outcome().is_solved()
    }

    /// The achieved `maxRelError` of the last solve, or an error describing
    /// why the structure did not converge.
    pub fn max_relative_error(&self) -> Result<Real<One>, GustaveError> {
        match self.outcome() {
            SolverOutcome::Solved(solution) => Ok(solution.max_relative_error()),
            SolverOutcome::Unsolvable(_) => Err(GustaveError::StructureUnsolvable(self.id)),
        }
    }

    fn data(&self) -> &'a crate::scenes::cuboid_grid::StructureData {
        self.world.scene().structure_data(self.id).expect("structure exists for the lifetime of this ref")
    }

    fn outcome(&self) -> &'a SolverOutcome {
        self.world.outcome(self.id).expect("a live structure always has a cached solve outcome")
    }

    fn solution(&self) -> Result<&'a Solution, GustaveError> {
        match self.outcome() {
            SolverOutcome::Solved(solution) => Ok(solution),
            SolverOutcome::Unsolvable(_) => Err(GustaveError::StructureUnsolvable(self.id)),
        }
    }

    fn force_vector_across(&self, contact: ContactIndex) -> Result<Vector3<Force>, GustaveError> {
        let canonical = contact.canonical().expect("caller passed a contact with a valid neighbour");
        let link_index = self
            .data()
            .topology
            .link_for_contact(canonical)
            .ok_or_else(|| GustaveError::out_of_range(format!("no structure link at {contact:?}")))?;
        let link = self.data().topology.link(link_index);
        let solution = self.solution()?;
        let (from, to) = if contact.direction.is_positive() {
            (link.local, link.other)
        } else {
            (link.other, link.local)
        };
        solution.force_vector_from(from, to)
    }
}

/// One bonded pair of blocks within a structure.
#[derive(Debug, Clone, Copy)]
pub struct LinkRef<'a> {
    world: &'a World,
    structure_id: StructureIndex,
    link_index: usize,
}

impl<'a> LinkRef<'a> {
    fn structure(&self) -> StructureRef<'a> {
        StructureRef { world: self.world, id: self.structure_id }
    }

    fn topology_link(&self) -> crate::scenes::cuboid_grid::TopologyLink {
        *self.structure().data().topology.link(self.link_index)
    }

    pub fn local_block(&self) -> BlockRef<'a> {
        let block = self.structure().data().topology.block_of(self.topology_link().local);
        BlockRef::new(self.world, block).expect("link endpoint block exists")
    }

    pub fn other_block(&self) -> BlockRef<'a> {
        let block = self.structure().data().topology.block_of(self.topology_link().other);
        BlockRef::new(self.world, block).expect("link endpoint block exists")
    }

    /// The force this link's `other_block` exerts on its `local_block`.
    pub fn force_vector(&self) -> Result<Vector3<Force>, GustaveError> {
        let link = self.topology_link();
        let solution = self.structure().solution()?;
        solution.force_vector_from(link.local, link.other)
    }
}

/// `World::blocks()`.
pub struct Blocks<'a> {
    world: &'a World,
}

impl<'a> Blocks<'a> {
    pub(crate) fn new(world: &'a World) -> Self {
        Blocks { world }
    }

    pub fn size(&self) -> usize {
        self.world.scene().block_count()
    }

    pub fn find(&self, index: BlockIndex) -> Option<BlockRef<'a>> {
        BlockRef::new(self.world, index)
    }

    pub fn at(&self, index: BlockIndex) -> Result<BlockRef<'a>, GustaveError> {
        self.find(index).ok_or_else(|| GustaveError::out_of_range(format!("no block at {index:?}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = BlockRef<'a>> + 'a {
        let world = self.world;
        world.scene().block_indices().map(move |index| BlockRef::new(world, index).expect("iterated block exists"))
    }
}

/// `World::contacts()`.
pub struct Contacts<'a> {
    world: &'a World,
}

impl<'a> Contacts<'a> {
    pub(crate) fn new(world: &'a World) -> Self {
        Contacts { world }
    }

    pub fn find(&self, index: ContactIndex) -> Option<ContactRef<'a>> {
        ContactRef::new(self.world, index)
    }

    pub fn at(&self, index: ContactIndex) -> Result<ContactRef<'a>, GustaveError> {
        self.find(index).ok_or_else(|| GustaveError::out_of_range(format!("no contact at {index:?}")))
    }
}

/// `World::structures()`.
pub struct Structures<'a> {
    world: &'a World,
}

impl<'a> Structures<'a> {
    pub(crate) fn new(world: &'a World) -> Self {
        Structures { world }
    }

    pub fn size(&self) -> usize {
        self.world.scene().structure_count()
    }

    pub fn find(&self, id: StructureIndex) -> Option<StructureRef<'a>> {
        StructureRef::new(self.world, id)
    }

    pub fn at(&self, id: StructureIndex) -> Result<StructureRef<'a>, GustaveError> {
        self.find(id).ok_or_else(|| GustaveError::out_of_range(format!("no structure {id:?}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = StructureRef<'a>> + 'a {
        let world = self.world;
        world.scene().structure_ids().map(move |id| StructureRef { world, id })
    }
}

/// `World::links()`: every canonical contact of every structure the solver
/// has actually solved — a structure the solver reported `Unsolvable` has no
/// potentials to derive a force from, so its links are excluded here.
pub struct Links<'a> {
    world: &'a World,
}

impl<'a> Links<'a> {
    pub(crate) fn new(world: &'a World) -> Self {
        Links { world }
    }

    pub fn iter(&self) -> impl Iterator<Item = LinkRef<'a>> + 'a {
        let world = self.world;
        world
            .scene()
            .structure_ids()
            .filter(move |&id| world.outcome(id).is_some_and(SolverOutcome::is_solved))
            .flat_map(move |id| {
                let count = world.scene().structure_data(id).expect("iterated structure exists").topology.links().len();
                (0..count).map(move |link_index| LinkRef { world, structure_id: id, link_index })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::cuboid_grid::{NewBlockSpec, Transaction};
    use crate::solvers::force1::Config;
    use crate::units::Acceleration;

    fn config() -> Config {
        Config::new(Vector3::<Acceleration>::from_f64(0.0, -10.0, 0.0), Real::<One>::new(0.001)).unwrap()
    }

    fn spec(mass: f64, is_foundation: bool) -> NewBlockSpec {
        let stress = PressureStress::new(Real::new(20e6), Real::new(14e6), Real::new(2e6)).unwrap();
        NewBlockSpec::new(Real::new(mass), stress, is_foundation).unwrap()
    }

    #[test]
    fn block_and_contact_views_agree_with_the_scene() {
        let mut world = World::new(Vector3::from_f64(1.0, 1.0, 1.0), config());
        let mut tx = Transaction::new();
        tx.add_block(BlockIndex::new(0, 0, 0), spec(1.0, true)).unwrap();
        tx.add_block(BlockIndex::new(0, 1, 0), spec(4000.0, false)).unwrap();
        world.modify(tx).unwrap();

        let top = world.blocks().at(BlockIndex::new(0, 1, 0)).unwrap();
        assert!(!top.is_foundation());
        let contact = top.contact(Direction::MinusY).expect("a contact with the foundation below");
        assert_eq!(contact.other_block().index(), BlockIndex::new(0, 0, 0));

        let structure = top.structures().next().expect("block belongs to one structure");
        assert!(structure.is_solved());
        assert_eq!(structure.block_count(), 2);

        let force = contact.force_vector().unwrap();
        assert!(force.y.value() > 0.0, "the foundation should hold the block above it up");
    }

    #[test]
    fn missing_block_and_structure_report_out_of_range() {
        let world = World::new(Vector3::from_f64(1.0, 1.0, 1.0), config());
        assert!(world.blocks().at(BlockIndex::new(0, 0, 0)).is_err());
        assert!(world.structures().at(StructureIndex(0)).is_err());
    }
}
