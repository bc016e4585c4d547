//! Material stress limits, shared between scene blocks and solver links.

use crate::error::GustaveError;
use crate::units::{Pressure, Real};

/// Maximum pressure a material can sustain along the three load modes a
/// cuboid contact can see: being compressed, sheared, or pulled apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureStress {
    pub compression: Real<Pressure>,
    pub shear: Real<Pressure>,
    pub tensile: Real<Pressure>,
}

impl PressureStress {
    pub fn new(
        compression: Real<Pressure>,
        shear: Real<Pressure>,
        tensile: Real<Pressure>,
    ) -> Result<Self, GustaveError> {
        if compression.value() <= 0.0 || shear.value() <= 0.0 || tensile.value() <= 0.0 {
            return Err(GustaveError::invalid_argument(
                "maxPressureStress components must all be strictly positive",
            ));
        }
        if !compression.is_finite() || !shear.is_finite() || !tensile.is_finite() {
            return Err(GustaveError::invalid_argument("maxPressureStress must be finite"));
        }
        Ok(PressureStress { compression, shear, tensile })
    }

    /// Component-wise minimum of two endpoint blocks' stress, used when a
    /// link is built between two blocks with differing materials.
    pub fn min_resistance(a: Self, b: Self) -> Self {
        PressureStress {
            compression: a.compression.min(b.compression),
            shear: a.shear.min(b.shear),
            tensile: a.tensile.min(b.tensile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_components() {
        let ok = Real::<Pressure>::new(1.0);
        let zero = Real::<Pressure>::new(0.0);
        assert!(PressureStress::new(zero, ok, ok).is_err());
    }

    #[test]
    fn min_resistance_is_component_wise() {
        let a = PressureStress::new(
            Real::new(20e6),
            Real::new(14e6),
            Real::new(2e6),
        )
        .unwrap();
        let b = PressureStress::new(
            Real::new(10e6),
            Real::new(20e6),
            Real::new(5e6),
        )
        .unwrap();
        let min = PressureStress::min_resistance(a, b);
        assert_eq!(min.compression.value(), 10e6);
        assert_eq!(min.shear.value(), 14e6);
        assert_eq!(min.tensile.value(), 2e6);
    }
}
