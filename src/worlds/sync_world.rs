//! `World`: owns a scene and a Force1 solver configuration, and caches one
//! solution (or unsolvable reason) per currently-live structure.

use tracing::debug;

use crate::config::StructureIndex;
use crate::error::GustaveError;
use crate::scenes::cuboid_grid::{CuboidGridScene, Transaction, TransactionResult};
use crate::solvers::force1::{self, Config, SolverOutcome};
use crate::units::{Length, Vector3};
use crate::util::FastMap;

use super::views::{Blocks, Contacts, Links, Structures};

/// Composes a [`CuboidGridScene`] with a [`Config`] and re-solves every
/// newly created structure synchronously on each [`World::modify`] call.
pub struct World {
    scene: CuboidGridScene,
    solver_config: Config,
    solutions: FastMap<StructureIndex, SolverOutcome>,
}

impl World {
    pub fn new(block_size: Vector3<Length>, solver_config: Config) -> Self {
        World { scene: CuboidGridScene::new(block_size), solver_config, solutions: FastMap::default() }
    }

    /// Applies `transaction` to the scene and brings the solution cache back
    /// in sync with the resulting structure set: drop solutions for
    /// every retired structure, solve every freshly allocated one.
    pub fn modify(&mut self, transaction: Transaction) -> Result<TransactionResult, GustaveError> {
        let result = self.scene.apply_transaction(transaction)?;

        for id in &result.deleted_structures {
            self.solutions.remove(id);
        }

        for id in result.new_structures.iter() {
            let data = self
                .scene
                .structure_data(id)
                .expect("a just-allocated structure id must exist in the scene");
            let structure = data.topology.build_solver_structure(self.solver_config.g());
            let outcome = force1::solve(&structure, &self.solver_config);
            debug!(structure = %id, solved = outcome.is_solved(), "structure solved");
            self.solutions.insert(id, outcome);
        }

        Ok(result)
    }

    pub fn solver_config(&self) -> &Config {
        &self.solver_config
    }

    pub fn blocks(&self) -> Blocks<'_> {
        Blocks::new(self)
    }

    pub fn contacts(&self) -> Contacts<'_> {
        Contacts::new(self)
    }

    pub fn structures(&self) -> Structures<'_> {
        Structures::new(self)
    }

    pub fn links(&self) -> Links<'_> {
        Links::new(self)
    }

    pub(crate) fn scene(&self) -> &CuboidGridScene {
        &self.scene
    }

    pub(crate) fn outcome(&self, id: StructureIndex) -> Option<&SolverOutcome> {
        self.solutions.get(&id)
    }
}
