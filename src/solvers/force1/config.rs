//! Runtime configuration for the Force1 solver.

use crate::error::GustaveError;
use crate::units::{Acceleration, One, Real, Vector3};

/// Default iteration budget, matching the original implementation.
pub const DEFAULT_MAX_ITERATIONS: u64 = 10000;

/// `Force1Solver::Config`: gravity, convergence target, and iteration budget.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    g: Vector3<Acceleration>,
    target_max_error: Real<One>,
    max_iterations: u64,
}

impl Config {
    pub fn new(g: Vector3<Acceleration>, target_max_error: Real<One>) -> Result<Self, GustaveError> {
        let mut config = Config { g, target_max_error: Real::new(1.0), max_iterations: DEFAULT_MAX_ITERATIONS };
        config.set_target_max_error(target_max_error)?;
        Ok(config)
    }

    pub fn g(&self) -> Vector3<Acceleration> {
        self.g
    }

    pub fn set_g(&mut self, g: Vector3<Acceleration>) {
        self.g = g;
    }

    pub fn target_max_error(&self) -> Real<One> {
        self.target_max_error
    }

    /// Enforces `targetMaxError > 0`.
    pub fn set_target_max_error(&mut self, value: Real<One>) -> Result<(), GustaveError> {
        if !(value.value() > 0.0) || !value.is_finite() {
            return Err(GustaveError::invalid_argument("targetMaxError must be strictly positive and finite"));
        }
        self.target_max_error = value;
        Ok(())
    }

    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, value: u64) {
        self.max_iterations = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_target_error() {
        let g = Vector3::from_f64(0.0, -10.0, 0.0);
        assert!(Config::new(g, Real::new(0.0)).is_err());
        assert!(Config::new(g, Real::new(-0.1)).is_err());
    }

    #[test]
    fn accepts_positive_target_error() {
        let g = Vector3::from_f64(0.0, -10.0, 0.0);
        let config = Config::new(g, Real::new(0.001)).unwrap();
        assert_eq!(config.max_iterations(), DEFAULT_MAX_ITERATIONS);
    }
}
