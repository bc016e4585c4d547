//! Fixture builders for the end-to-end scenarios.
#![allow(dead_code)]

use gustave::material::PressureStress;
use gustave::scenes::cuboid_grid::NewBlockSpec;
use gustave::solvers::force1::Config;
use gustave::units::{Acceleration, Length, Mass, One, Real, Vector3};
use gustave::worlds::World;

/// The concrete/masonry-ish stress used throughout these scenarios.
pub fn standard_stress() -> PressureStress {
    PressureStress::new(Real::new(20e6), Real::new(14e6), Real::new(2e6)).unwrap()
}

pub fn block_spec(mass: f64, is_foundation: bool) -> NewBlockSpec {
    NewBlockSpec::new(Real::<Mass>::new(mass), standard_stress(), is_foundation).unwrap()
}

/// Earth-like downward gravity, `(0, -10, 0)`.
pub fn down_gravity() -> Vector3<Acceleration> {
    Vector3::from_f64(0.0, -10.0, 0.0)
}

pub fn default_config() -> Config {
    Config::new(down_gravity(), Real::<One>::new(0.001)).unwrap()
}

pub fn config_with_gravity(g: Vector3<Acceleration>) -> Config {
    Config::new(g, Real::<One>::new(0.001)).unwrap()
}

pub fn unit_block_world() -> World {
    World::new(Vector3::<Length>::from_f64(1.0, 1.0, 1.0), default_config())
}
